use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tasa::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Field {
    Usd,
    Ves,
}

impl From<Field> for tasa::engine::Currency {
    fn from(field: Field) -> tasa::engine::Currency {
        match field {
            Field::Usd => tasa::engine::Currency::Usd,
            Field::Ves => tasa::engine::Currency::Ves,
        }
    }
}

impl From<Commands> for tasa::AppCommand {
    fn from(cmd: Commands) -> tasa::AppCommand {
        match cmd {
            Commands::Convert { amount, from } => tasa::AppCommand::Convert {
                amount,
                from: from.into(),
            },
            Commands::Rate => tasa::AppCommand::Rate,
            Commands::Interactive => tasa::AppCommand::Interactive,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Convert a single amount at the current BCV rate
    Convert {
        /// Amount to convert, e.g. 10.00
        amount: String,

        /// Currency the amount is denominated in
        #[arg(long, value_enum, default_value = "usd")]
        from: Field,
    },
    /// Fetch and display the current BCV rate
    Rate,
    /// Start the interactive converter
    Interactive,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => tasa::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = tasa::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
providers:
  gemini:
    base_url: "https://generativelanguage.googleapis.com"
    model: "gemini-3-flash-preview"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
