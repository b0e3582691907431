//! HTTP client for the hosted multimodal model.

use reqwest::blocking::Client;
use serde_json::{Value, json};

use super::parse::parse_rows;
use super::prompt::build_prompt;
use super::{EncodedImage, ExtractionError, Extractor};
use crate::league::{ExtractedRow, RaceNumber};
use crate::pipeline::config::AppConfig;

/// Body fragments the service uses when it is overloaded or throttling.
const TRANSIENT_MARKERS: [&str; 5] = [
    "overloaded",
    "unavailable",
    "resource_exhausted",
    "rate limit",
    "try again later",
];

/// Header carrying the API key; the key never appears in the request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Extractor backed by the Gemini `generateContent` endpoint.
pub struct GeminiExtractor {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiExtractor {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        let api_key = config.api_key();
        if api_key.is_none() {
            crate::log(&format!(
                "Warning: {} is not set; extraction requests will fail",
                config.api_key_env
            ));
        }

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl Extractor for GeminiExtractor {
    fn extract(
        &self,
        image: &EncodedImage,
        race: RaceNumber,
        hints: &[String],
    ) -> Result<Vec<ExtractedRow>, ExtractionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ExtractionError::Fatal("no API key configured".to_string()))?;

        let body = request_body(image, &build_prompt(race, hints));

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .map_err(transport_failure)?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| {
                ExtractionError::Transient(format!("failed to read response: {}", e.without_url()))
            })?;

        if !(200..300).contains(&status) {
            return Err(classify_failure(status, &text));
        }

        let reply = response_text(&text)?;
        parse_rows(&reply)
    }
}

fn request_body(image: &EncodedImage, prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [
                { "text": prompt },
                { "inline_data": { "mime_type": image.mime_type, "data": image.data } }
            ]
        }],
        "generationConfig": {
            "temperature": 0.0,
            "response_mime_type": "application/json"
        }
    })
}

/// Maps a request that never got a response onto the retry taxonomy. The URL
/// is stripped so messages stay safe to log and persist.
fn transport_failure(e: reqwest::Error) -> ExtractionError {
    let retryable = e.is_timeout() || e.is_connect();
    let message = e.without_url().to_string();
    if retryable {
        ExtractionError::Transient(message)
    } else {
        ExtractionError::Fatal(message)
    }
}

/// Maps a non-success HTTP response onto the retry taxonomy.
pub fn classify_failure(status: u16, body: &str) -> ExtractionError {
    let lowered = body.to_lowercase();
    let message = format!("HTTP {}: {}", status, summarize(body));

    if matches!(status, 429 | 500 | 502 | 503 | 504)
        || TRANSIENT_MARKERS.iter().any(|marker| lowered.contains(marker))
    {
        ExtractionError::Transient(message)
    } else {
        ExtractionError::Fatal(message)
    }
}

/// Pulls the model's text reply out of a `generateContent` response.
pub fn response_text(body: &str) -> Result<String, ExtractionError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Fatal(format!("unreadable service response: {}", e)))?;

    if let Some(reason) = value.pointer("/promptFeedback/blockReason").and_then(Value::as_str) {
        return Err(ExtractionError::Fatal(format!("request blocked: {}", reason)));
    }

    let parts = value
        .pointer("/candidates/0/content/parts")
        .and_then(Value::as_array)
        .ok_or_else(|| ExtractionError::Fatal("response has no candidates".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();

    if text.trim().is_empty() {
        return Err(ExtractionError::Fatal("model returned an empty reply".to_string()));
    }
    Ok(text)
}

/// Error message from a JSON error body, or the first part of the raw body.
fn summarize(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
