pub mod clipboard;
pub mod config;
pub mod engine;
pub mod export;
pub mod log;
pub mod providers;
pub mod rate;
pub mod session;
pub mod store;
pub mod ui;

use anyhow::Result;
use tracing::{debug, info};

use crate::clipboard::SystemClipboard;
use crate::config::AppConfig;
use crate::engine::{ConversionState, Currency, format2};
use crate::export::FileExporter;
use crate::providers::gemini::GeminiRateProvider;
use crate::rate::fetch_or_fallback;
use crate::session::Session;
use crate::store::PreferenceStore;
use crate::store::disk::DiskStore;
use crate::store::memory::MemoryStore;
use crate::ui::Theme;

pub enum AppCommand {
    Convert { amount: String, from: Currency },
    Rate,
    Interactive,
}

fn build_provider(config: &AppConfig) -> GeminiRateProvider {
    let api_key = std::env::var("GEMINI_API_KEY").ok();
    if api_key.is_none() {
        debug!("GEMINI_API_KEY not set, requests go out unauthenticated");
    }

    let gemini = &config.providers.gemini;
    GeminiRateProvider::new(&gemini.base_url, &gemini.model, api_key)
}

/// Theme and friends live on disk; when the data directory is unavailable
/// the session still runs with in-memory preferences.
fn open_preferences(config: &AppConfig) -> Box<dyn PreferenceStore> {
    let disk = config
        .data_path()
        .and_then(|path| DiskStore::open(&path.join("preferences")));
    match disk {
        Ok(store) => Box::new(store),
        Err(e) => {
            debug!("Falling back to in-memory preferences: {e}");
            Box::new(MemoryStore::new())
        }
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("Dollar calculator starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = build_provider(&config);
    let prefs = open_preferences(&config);

    match command {
        AppCommand::Rate => {
            let spinner = ui::fetch_spinner();
            let rate = fetch_or_fallback(&provider).await;
            spinner.finish_and_clear();
            println!(
                "Tasa BCV: {} ({}, {})",
                format2(rate.rate),
                rate.source,
                rate.last_update
            );
            Ok(())
        }
        AppCommand::Convert { amount, from } => {
            let theme = Theme::from_store(prefs.as_ref());
            let spinner = ui::fetch_spinner();
            let rate = fetch_or_fallback(&provider).await;
            spinner.finish_and_clear();

            let mut state = ConversionState::new();
            state.apply_official(rate);
            state.edit(from, &amount);
            println!("{}", ui::render_card(&state, theme));
            Ok(())
        }
        AppCommand::Interactive => {
            let exports = config.data_path()?.join("exports");
            let mut session = Session::new(
                Box::new(provider),
                Box::new(SystemClipboard),
                Box::new(FileExporter::new(&exports)),
                prefs,
            );
            session.run().await
        }
    }
}
