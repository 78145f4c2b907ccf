//! Rate acquisition seam for the conversion engine.

use crate::engine::ExchangeRate;
use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

/// Rate used when the lookup fails or its answer carries no number. A
/// plausible real-world value, never zero, so conversion stays usable.
pub const FALLBACK_RATE: f64 = 40.00;

pub const OFFICIAL_SOURCE_LABEL: &str = "BCV Oficial";
pub const FALLBACK_SOURCE_LABEL: &str = "Estimado (Error al conectar)";
pub const FALLBACK_UPDATE_LABEL: &str = "Justo ahora";

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn fetch_rate(&self) -> Result<ExchangeRate>;
}

/// Fetches the current rate, degrading to a labeled estimate on any
/// transport or service error. Never fails; the caller always gets a
/// positive rate to install.
pub async fn fetch_or_fallback(provider: &dyn RateProvider) -> ExchangeRate {
    match provider.fetch_rate().await {
        Ok(rate) => rate,
        Err(e) => {
            warn!(error = %e, "Rate fetch failed, using estimated fallback");
            ExchangeRate {
                rate: FALLBACK_RATE,
                last_update: FALLBACK_UPDATE_LABEL.to_string(),
                source: FALLBACK_SOURCE_LABEL.to_string(),
            }
        }
    }
}
