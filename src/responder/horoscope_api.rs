//! HTTP client for the daily horoscope REST endpoint.

use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::responder::horoscope::{HoroscopeData, Sign};

#[derive(Debug)]
pub enum FetchError {
    Http(String),
    Api(String),
    Parse(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Http(e) => write!(f, "HTTP error: {e}"),
            FetchError::Api(e) => write!(f, "API error: {e}"),
            FetchError::Parse(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for FetchError {}

pub struct HoroscopeClient {
    /// Endpoint with a `{sign}` placeholder.
    url_template: String,
    http: reqwest::Client,
}

impl HoroscopeClient {
    pub fn new(url_template: &str) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| FetchError::Http(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            url_template: url_template.to_string(),
            http,
        })
    }

    pub fn url_for(&self, sign: Sign) -> String {
        self.url_template.replace("{sign}", sign.as_str())
    }

    /// Today's horoscope for `sign`.
    pub async fn fetch(&self, sign: Sign) -> Result<HoroscopeData, FetchError> {
        let url = self.url_for(sign);
        debug!("Fetching horoscope from {url}");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::Api(format!("{status}: {body}")));
        }

        let mut data = parse_response(&body)?;
        // The cache is keyed by the sign we asked for, whatever casing the API echoes.
        data.sunsign = sign.as_str().to_string();
        Ok(data)
    }
}

/// Decode the endpoint's JSON body.
pub fn parse_response(body: &str) -> Result<HoroscopeData, FetchError> {
    let data: HoroscopeData =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    if data.text.is_empty() {
        return Err(FetchError::Parse("response has no horoscope text".to_string()));
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for() {
        let client =
            HoroscopeClient::new("http://example.com/api/horoscope/{sign}/today").unwrap();
        assert_eq!(
            client.url_for(Sign::Sagittarius),
            "http://example.com/api/horoscope/sagittarius/today"
        );
    }

    #[test]
    fn test_parse_response() {
        let body = r#"{
            "date": "2017-06-23",
            "sunsign": "Aries",
            "horoscope": "You will meet a stranger.",
            "meta": {"intensity": "55%", "keywords": "stranger, luck", "mood": "Curious"},
            "credit": "someone"
        }"#;
        let data = parse_response(body).unwrap();
        assert_eq!(data.date, "2017-06-23");
        assert_eq!(data.sunsign, "Aries");
        assert_eq!(data.text, "You will meet a stranger.");
        assert_eq!(data.meta.intensity, "55%");
        assert_eq!(data.meta.keywords, "stranger, luck");
        assert_eq!(data.meta.mood, "Curious");
    }

    #[test]
    fn test_parse_response_without_meta() {
        let data = parse_response(r#"{"sunsign": "leo", "horoscope": "Roar."}"#).unwrap();
        assert_eq!(data.text, "Roar.");
        assert_eq!(data.meta.mood, "");
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(matches!(parse_response("not json"), Err(FetchError::Parse(_))));
        assert!(matches!(parse_response(r#"{"sunsign": "leo"}"#), Err(FetchError::Parse(_))));
    }
}
