//! Interactive conversion session: the CLI counterpart of the widget.
//!
//! All state transitions happen in response to one parsed command at a time
//! and run to completion before the next line is read, so the engine needs
//! no locking. The rate refresh is the only suspending operation.

use anyhow::{Result, bail};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::clipboard::ClipboardWriter;
use crate::engine::{ConversionState, Currency, format2};
use crate::export::CardExporter;
use crate::rate::{RateProvider, fetch_or_fallback};
use crate::store::{PreferenceStore, THEME_KEY};
use crate::ui::{self, Theme};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Edit(Currency, String),
    SetManualRate(String),
    UseManualRate(bool),
    Swap,
    Refresh,
    Copy(Currency),
    Share,
    ToggleTheme,
    Show,
    Help,
    Quit,
}

fn parse_currency(token: &str) -> Result<Currency> {
    match token {
        "usd" => Ok(Currency::Usd),
        "ves" => Ok(Currency::Ves),
        other => bail!("Moneda desconocida: {other} (use usd o ves)"),
    }
}

fn bare(arg: Option<&str>, command: Command, usage: &str) -> Result<Command> {
    match arg {
        None => Ok(command),
        Some(_) => bail!("Uso: {usage}"),
    }
}

/// Parses one input line into a command. An empty line redisplays the card;
/// leftover tokens after a complete command are rejected, not ignored.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut tokens = line.split_whitespace();
    let Some(head) = tokens.next() else {
        return Ok(Command::Show);
    };
    let arg = tokens.next();
    if tokens.next().is_some() {
        bail!("Demasiados argumentos (pruebe help)");
    }

    match head {
        "usd" | "ves" => {
            let field = parse_currency(head)?;
            match arg {
                Some(amount) => Ok(Command::Edit(field, amount.to_string())),
                None => bail!("Uso: {head} <monto>"),
            }
        }
        "rate" | "tasa" => match arg {
            Some(value) => Ok(Command::SetManualRate(value.to_string())),
            None => bail!("Uso: tasa <valor>"),
        },
        "manual" => match arg {
            Some("on") => Ok(Command::UseManualRate(true)),
            Some("off") => Ok(Command::UseManualRate(false)),
            _ => bail!("Uso: manual on|off"),
        },
        "swap" => bare(arg, Command::Swap, "swap"),
        "refresh" | "actualizar" => bare(arg, Command::Refresh, "refresh"),
        "copy" | "copiar" => match arg {
            Some(token) => Ok(Command::Copy(parse_currency(token)?)),
            None => bail!("Uso: copy usd|ves"),
        },
        "share" | "exportar" => bare(arg, Command::Share, "share"),
        "theme" | "tema" => bare(arg, Command::ToggleTheme, "tema"),
        "show" => bare(arg, Command::Show, "show"),
        "help" | "ayuda" | "?" => bare(arg, Command::Help, "help"),
        "quit" | "exit" | "salir" | "q" => bare(arg, Command::Quit, "quit"),
        other => bail!("Comando desconocido: {other} (pruebe help)"),
    }
}

const HELP_TEXT: &str = "\
Comandos:
  usd <monto>      convertir desde dólares
  ves <monto>      convertir desde bolívares
  tasa <valor>     fijar tasa manual
  manual on|off    usar tasa manual u oficial
  swap             intercambiar los montos
  refresh          actualizar la tasa BCV
  copy usd|ves     copiar un monto al portapapeles
  share            exportar la tarjeta de conversión
  tema             alternar tema claro/oscuro
  show             mostrar la tarjeta
  quit             salir";

pub struct Session {
    pub state: ConversionState,
    pub theme: Theme,
    /// True while a rate fetch is in flight; further refreshes coalesce.
    pub loading: bool,
    provider: Box<dyn RateProvider>,
    clipboard: Box<dyn ClipboardWriter>,
    exporter: Box<dyn CardExporter>,
    prefs: Box<dyn PreferenceStore>,
}

impl Session {
    pub fn new(
        provider: Box<dyn RateProvider>,
        clipboard: Box<dyn ClipboardWriter>,
        exporter: Box<dyn CardExporter>,
        prefs: Box<dyn PreferenceStore>,
    ) -> Self {
        let theme = Theme::from_store(prefs.as_ref());
        Session {
            state: ConversionState::new(),
            theme,
            loading: false,
            provider,
            clipboard,
            exporter,
            prefs,
        }
    }

    /// Fetches and installs a fresh official rate. A refresh issued while
    /// one is outstanding is a no-op; the last completed fetch wins.
    pub async fn refresh(&mut self) -> Option<String> {
        if self.loading {
            debug!("Refresh already in flight, coalescing");
            return None;
        }
        self.loading = true;
        let rate = fetch_or_fallback(self.provider.as_ref()).await;
        let message = format!(
            "Tasa actualizada: {} ({}, {})",
            format2(rate.rate),
            rate.source,
            rate.last_update
        );
        self.state.apply_official(rate);
        self.loading = false;
        Some(message)
    }

    fn card(&self) -> String {
        ui::render_card(&self.state, self.theme)
    }

    /// Applies one command and returns the text to print. An empty result
    /// means nothing to show (a silently logged capability failure).
    pub async fn handle(&mut self, command: Command) -> Result<String> {
        match command {
            Command::Edit(field, text) => {
                self.state.edit(field, &text);
                Ok(self.card())
            }
            Command::SetManualRate(value) => {
                self.state.set_manual_rate_text(&value);
                self.state.set_use_manual_rate(true);
                Ok(self.card())
            }
            Command::UseManualRate(enabled) => {
                self.state.set_use_manual_rate(enabled);
                Ok(self.card())
            }
            Command::Swap => {
                self.state.swap();
                Ok(self.card())
            }
            Command::Refresh => {
                let message = self.refresh().await.unwrap_or_default();
                Ok(format!("{message}\n{}", self.card()))
            }
            Command::Copy(field) => {
                let value = match field {
                    Currency::Usd => self.state.usd_amount.clone(),
                    Currency::Ves => self.state.ves_amount.clone(),
                };
                match self.clipboard.write_text(&value) {
                    Ok(()) => Ok(format!("Copiado: {value}")),
                    Err(e) => {
                        warn!(error = %e, "Failed to copy to clipboard");
                        Ok(String::new())
                    }
                }
            }
            Command::Share => {
                let card = format!("{}\n\n{}", self.card(), ui::share_text(&self.state));
                match self.exporter.export(&card) {
                    Ok(path) => Ok(format!("Exportado a {}", path.display())),
                    Err(e) => {
                        warn!(error = %e, "Failed to export conversion card");
                        Ok(String::new())
                    }
                }
            }
            Command::ToggleTheme => {
                self.theme = self.theme.toggled();
                if let Err(e) = self.prefs.set(THEME_KEY, self.theme.as_preference()) {
                    warn!(error = %e, "Failed to persist theme preference");
                }
                Ok(format!("Tema: {}\n{}", self.theme.as_preference(), self.card()))
            }
            Command::Show => Ok(self.card()),
            Command::Help => Ok(HELP_TEXT.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    /// Runs the read-eval loop until quit or end of input.
    pub async fn run(&mut self) -> Result<()> {
        let spinner = ui::fetch_spinner();
        let message = self.refresh().await.unwrap_or_default();
        spinner.finish_and_clear();
        println!("{message}\n{}", self.card());

        let mut editor = DefaultEditor::new()?;
        loop {
            let line = match editor.readline("tasa> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            let _ = editor.add_history_entry(&line);

            let command = match parse_command(&line) {
                Ok(command) => command,
                Err(e) => {
                    println!("{e}");
                    continue;
                }
            };

            if command == Command::Quit {
                break;
            }

            let output = if command == Command::Refresh {
                let spinner = ui::fetch_spinner();
                let output = self.handle(command).await?;
                spinner.finish_and_clear();
                output
            } else {
                self.handle(command).await?
            };

            if !output.is_empty() {
                println!("{output}");
            }
        }
        Ok(())
    }
}
