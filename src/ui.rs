//! Terminal rendering of the conversion card.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::engine::{ConversionState, Currency, format2};
use crate::store::{PreferenceStore, THEME_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    /// Dark unless the stored preference says "light", matching the
    /// original widget default.
    pub fn from_store(store: &dyn PreferenceStore) -> Theme {
        match store.get(THEME_KEY).as_deref() {
            Some("light") => Theme::Light,
            _ => Theme::Dark,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_preference(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

fn amount_cell(text: &str, driving: bool) -> Cell {
    let cell = Cell::new(text).set_alignment(CellAlignment::Right);
    if driving {
        cell.add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn currency_cell(currency: Currency, theme: Theme) -> Cell {
    let cell = Cell::new(currency.to_string()).add_attribute(Attribute::Bold);
    match theme {
        Theme::Dark => cell.fg(Color::Cyan),
        Theme::Light => cell.fg(Color::Blue),
    }
}

/// One-line description of the rate currently in effect.
pub fn rate_line(state: &ConversionState) -> String {
    let rate = format2(state.active_rate());
    if state.use_manual_rate && state.manual_rate().is_some() {
        return format!("Tasa: {rate} (manual)");
    }
    match &state.official_rate {
        Some(official) => format!(
            "Tasa: {rate} ({}, {})",
            official.source, official.last_update
        ),
        None => format!("Tasa: {rate} (sin datos)"),
    }
}

/// Renders the conversion card: both amounts, the driving field in bold,
/// and the rate provenance underneath.
pub fn render_card(state: &ConversionState, theme: Theme) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        currency_cell(Currency::Usd, theme),
        amount_cell(&state.usd_amount, state.last_edited == Currency::Usd),
    ]);
    table.add_row(vec![
        currency_cell(Currency::Ves, theme),
        amount_cell(&state.ves_amount, state.last_edited == Currency::Ves),
    ]);

    let title = match theme {
        Theme::Dark => style("Calculadora Dólar BCV").bold().cyan().to_string(),
        Theme::Light => style("Calculadora Dólar BCV").bold().to_string(),
    };

    format!("{title}\n{table}\n{}", rate_line(state))
}

/// Text handed to the clipboard/share targets.
pub fn share_text(state: &ConversionState) -> String {
    format!(
        "Conversión realizada: {} USD = {} VES (Tasa: {})",
        state.usd_amount,
        state.ves_amount,
        format2(state.active_rate())
    )
}

/// Spinner shown while a rate fetch is in flight.
pub fn fetch_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message("Consultando tasa BCV...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ExchangeRate;
    use crate::store::memory::MemoryStore;

    fn state_with_rate() -> ConversionState {
        let mut state = ConversionState::new();
        state.apply_official(ExchangeRate {
            rate: 36.50,
            last_update: "14:05".to_string(),
            source: "BCV Oficial".to_string(),
        });
        state.edit(Currency::Usd, "10.00");
        state
    }

    #[test]
    fn test_card_contains_amounts_and_rate() {
        let card = render_card(&state_with_rate(), Theme::Light);
        assert!(card.contains("10.00"));
        assert!(card.contains("365.00"));
        assert!(card.contains("Tasa: 36.50"));
        assert!(card.contains("BCV Oficial"));
    }

    #[test]
    fn test_rate_line_marks_manual_override() {
        let mut state = state_with_rate();
        state.set_use_manual_rate(true);
        state.set_manual_rate_text("40.00");
        assert_eq!(rate_line(&state), "Tasa: 40.00 (manual)");
    }

    #[test]
    fn test_rate_line_before_first_fetch() {
        let state = ConversionState::new();
        assert_eq!(rate_line(&state), "Tasa: 1.00 (sin datos)");
    }

    #[test]
    fn test_share_text_shape() {
        let text = share_text(&state_with_rate());
        assert_eq!(
            text,
            "Conversión realizada: 10.00 USD = 365.00 VES (Tasa: 36.50)"
        );
    }

    #[test]
    fn test_theme_from_store_defaults_to_dark() {
        let store = MemoryStore::new();
        assert_eq!(Theme::from_store(&store), Theme::Dark);

        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(Theme::from_store(&store), Theme::Light);
    }
}
