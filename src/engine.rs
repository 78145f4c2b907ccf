//! Bidirectional USD↔VES conversion state.
//!
//! The two amount fields hold raw user text; whichever field was edited last
//! drives the recomputation of the other. All parse failures degrade to a
//! usable value so the displayed numbers are always well-formed.

use std::fmt;

/// A snapshot of the exchange rate. Replaced wholesale on every refresh,
/// never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRate {
    pub rate: f64,
    /// Display timestamp, short form (e.g. "14:05" or "Justo ahora").
    pub last_update: String,
    /// Provenance label, e.g. "BCV Oficial" or "Estimado (Error al conectar)".
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Ves,
}

impl Currency {
    pub fn other(self) -> Currency {
        match self {
            Currency::Usd => Currency::Ves,
            Currency::Ves => Currency::Usd,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Currency::Usd => write!(f, "USD"),
            Currency::Ves => write!(f, "VES"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConversionState {
    pub usd_amount: String,
    pub ves_amount: String,
    pub official_rate: Option<ExchangeRate>,
    pub manual_rate_text: String,
    pub use_manual_rate: bool,
    pub last_edited: Currency,
}

/// Renders an amount with exactly two fraction digits and a fixed `.`
/// decimal point. Locale grouping is a display concern, not stored here.
pub fn format2(value: f64) -> String {
    format!("{value:.2}")
}

/// Parses raw field text as an amount. Empty or invalid text counts as zero
/// so a half-typed field never blocks recomputation.
fn parse_amount(text: &str) -> f64 {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parses override text as a rate. Only finite positive values are usable.
fn parse_rate(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && *r > 0.0)
}

impl ConversionState {
    pub fn new() -> Self {
        let mut state = ConversionState {
            usd_amount: "1.00".to_string(),
            ves_amount: String::new(),
            official_rate: None,
            manual_rate_text: String::new(),
            use_manual_rate: false,
            last_edited: Currency::Usd,
        };
        state.recompute();
        state
    }

    /// The manual override as a usable rate, if it currently is one.
    pub fn manual_rate(&self) -> Option<f64> {
        parse_rate(&self.manual_rate_text)
    }

    /// The rate currently governing conversion: the manual override when it
    /// is enabled and holds a valid positive number, else the official rate,
    /// else 1. Guaranteed finite and positive.
    pub fn active_rate(&self) -> f64 {
        if self.use_manual_rate {
            if let Some(rate) = self.manual_rate() {
                return rate;
            }
        }
        self.official_rate
            .as_ref()
            .map(|r| r.rate)
            .filter(|r| r.is_finite() && *r > 0.0)
            .unwrap_or(1.0)
    }

    /// Re-derives the dependent field from the last-edited one at the
    /// active rate. Deterministic in the current state; safe to call after
    /// any change.
    pub fn recompute(&mut self) {
        let rate = self.active_rate();
        match self.last_edited {
            Currency::Usd => {
                let usd = parse_amount(&self.usd_amount);
                self.ves_amount = format2(usd * rate);
            }
            Currency::Ves => {
                let ves = parse_amount(&self.ves_amount);
                self.usd_amount = format2(ves / rate);
            }
        }
    }

    /// User typed into one of the amount fields.
    pub fn edit(&mut self, field: Currency, text: &str) {
        match field {
            Currency::Usd => self.usd_amount = text.to_string(),
            Currency::Ves => self.ves_amount = text.to_string(),
        }
        self.last_edited = field;
        self.recompute();
    }

    /// Exchanges the two field texts and flips which field drives the
    /// conversion. The subsequent recompute re-derives the now-dependent
    /// field, so the previously edited value reappears in the opposite
    /// field with its counterpart freshly converted.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.usd_amount, &mut self.ves_amount);
        self.last_edited = self.last_edited.other();
        self.recompute();
    }

    pub fn set_manual_rate_text(&mut self, text: &str) {
        self.manual_rate_text = text.to_string();
        self.recompute();
    }

    pub fn set_use_manual_rate(&mut self, enabled: bool) {
        self.use_manual_rate = enabled;
        self.recompute();
    }

    /// Installs a freshly fetched official rate. Seeds the manual override
    /// text from the first fetch so the user starts from a sensible value.
    pub fn apply_official(&mut self, rate: ExchangeRate) {
        if self.manual_rate_text.is_empty() {
            self.manual_rate_text = format2(rate.rate);
        }
        self.official_rate = Some(rate);
        self.recompute();
    }
}

impl Default for ConversionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn official(rate: f64) -> ExchangeRate {
        ExchangeRate {
            rate,
            last_update: "12:00".to_string(),
            source: "BCV Oficial".to_string(),
        }
    }

    #[test]
    fn test_initial_state_converts_at_unit_rate() {
        let state = ConversionState::new();
        assert_eq!(state.usd_amount, "1.00");
        assert_eq!(state.ves_amount, "1.00");
        assert_eq!(state.last_edited, Currency::Usd);
    }

    #[test]
    fn test_usd_edit_drives_ves() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.edit(Currency::Usd, "10.00");
        assert_eq!(state.ves_amount, "365.00");
    }

    #[test]
    fn test_ves_edit_drives_usd() {
        let mut state = ConversionState::new();
        state.apply_official(official(50.00));
        state.edit(Currency::Ves, "100.00");
        assert_eq!(state.usd_amount, "2.00");
    }

    #[test]
    fn test_round_trip_within_a_cent() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.73));
        state.edit(Currency::Usd, "123.45");

        let ves = state.ves_amount.clone();
        state.edit(Currency::Ves, &ves);

        let usd: f64 = state.usd_amount.parse().unwrap();
        assert!((usd - 123.45).abs() <= 0.01);
    }

    #[test]
    fn test_invalid_amount_counts_as_zero() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.edit(Currency::Usd, "abc");
        assert_eq!(state.ves_amount, "0.00");

        state.edit(Currency::Usd, "");
        assert_eq!(state.ves_amount, "0.00");
    }

    #[test]
    fn test_active_rate_never_non_positive() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.set_use_manual_rate(true);

        for bad in ["", "abc", "-5", "0", "NaN"] {
            state.set_manual_rate_text(bad);
            assert!(
                state.active_rate() > 0.0,
                "active rate must stay positive for override {bad:?}"
            );
        }
    }

    #[test]
    fn test_manual_toggle_with_empty_override_keeps_official_rate() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.manual_rate_text.clear();
        state.set_use_manual_rate(true);
        assert_eq!(state.active_rate(), 36.50);
    }

    #[test]
    fn test_valid_manual_override_wins() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.set_use_manual_rate(true);
        state.set_manual_rate_text("40.00");
        assert_eq!(state.active_rate(), 40.00);

        state.edit(Currency::Usd, "2.00");
        assert_eq!(state.ves_amount, "80.00");
    }

    #[test]
    fn test_rate_defaults_to_one_before_first_fetch() {
        let mut state = ConversionState::new();
        state.edit(Currency::Usd, "5.00");
        assert_eq!(state.active_rate(), 1.0);
        assert_eq!(state.ves_amount, "5.00");
    }

    #[test]
    fn test_swap_flips_driving_field_and_reconverts() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        state.edit(Currency::Usd, "10.00");
        assert_eq!(state.ves_amount, "365.00");

        state.swap();

        // The edited value moved into the VES field, which now drives; the
        // USD field is re-derived from it.
        assert_eq!(state.last_edited, Currency::Ves);
        assert_eq!(state.ves_amount, "10.00");
        let usd: f64 = state.usd_amount.parse().unwrap();
        assert!((usd - 10.00 / 36.50).abs() < 0.005);
    }

    #[test]
    fn test_apply_official_seeds_manual_text_once() {
        let mut state = ConversionState::new();
        state.apply_official(official(36.50));
        assert_eq!(state.manual_rate_text, "36.50");

        // A later refresh must not clobber a user-visible override.
        state.apply_official(official(38.10));
        assert_eq!(state.manual_rate_text, "36.50");
        assert_eq!(state.official_rate.as_ref().unwrap().rate, 38.10);
    }

    #[test]
    fn test_new_official_rate_reconverts_dependent_field() {
        let mut state = ConversionState::new();
        state.edit(Currency::Usd, "10.00");
        state.apply_official(official(36.50));
        assert_eq!(state.ves_amount, "365.00");

        state.apply_official(official(40.00));
        assert_eq!(state.ves_amount, "400.00");
        // The driving field is untouched by a refresh.
        assert_eq!(state.usd_amount, "10.00");
    }
}
