use crate::app::ports::{ExtractionError, FieldExtractorPort};
use crate::config::ExtractionConfig;
use crate::domain::{MetricFamily, TrafficRecord};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Field extractor backed by a Gemini `generateContent` endpoint with a
/// structured response schema
pub struct GeminiFieldExtractor {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ExtractionPayload {
    #[serde(default)]
    data: Vec<TrafficRecord>,
}

impl GeminiFieldExtractor {
    pub fn new(config: &ExtractionConfig, api_key: String) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    pub fn build_prompt(text: &str, hint: Option<MetricFamily>) -> String {
        let focus = match hint {
            Some(family) => format!(
                "This document only reports {} statistics; leave the other metric families at zero.",
                family.as_str()
            ),
            None => "Focus on extracting:\n\
                - Passengers (DOM, INTL, Total, YoY Growth %)\n\
                - Cargo (DOM, INTL, Total, YoY Growth %)\n\
                - ATMs (Aircraft Movements): Total ATMs, INTL ATMs, DOM ATMs.\n\
                - Movement splits: DOM Pax ATM, DOM Cargo ATM, INTL Pax ATM, INTL Cargo ATM.\n\
                - Comparative stats from the same month last year."
                .to_string(),
        };
        format!(
            "Extract detailed airport traffic statistics, one entry per airport per month.\n{}\n\nText to parse:\n{}",
            focus, text
        )
    }

    pub fn request_body(prompt: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }
        })
    }

    /// Pull the candidate records out of a `generateContent` response.
    ///
    /// An empty response means nothing was found; malformed JSON is terminal.
    pub fn parse_response(body: &Value) -> Result<Vec<TrafficRecord>, ExtractionError> {
        let Some(text) = body["candidates"][0]["content"]["parts"][0]["text"].as_str() else {
            debug!("Extraction response carried no text");
            return Ok(Vec::new());
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let payload: ExtractionPayload = serde_json::from_str(text).map_err(|e| {
            ExtractionError::terminal(format!("Failed to parse extraction output: {}", e))
        })?;

        Ok(payload.data.into_iter().map(fill_period_from_label).collect())
    }
}

#[async_trait]
impl FieldExtractorPort for GeminiFieldExtractor {
    async fn extract_records(
        &self,
        text: &str,
        hint: Option<MetricFamily>,
    ) -> Result<Vec<TrafficRecord>, ExtractionError> {
        if text.trim().is_empty() {
            warn!("No text to extract from");
            return Ok(Vec::new());
        }

        let body = Self::request_body(&Self::build_prompt(text, hint));
        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::from_status(status.as_u16(), message));
        }

        let value: Value = resp.json().await?;
        let records = Self::parse_response(&value)?;
        debug!(records = records.len(), "Extraction returned candidates");
        Ok(records)
    }
}

/// Fill a missing month or year from the free-form `timePeriod` label, e.g. "Oct 2023"
fn fill_period_from_label(mut record: TrafficRecord) -> TrafficRecord {
    let Some(label) = record.time_period.as_deref() else {
        return record;
    };
    let tokens: Vec<&str> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    if record.month.trim().is_empty() {
        if let Some(month) = tokens.iter().find(|t| t.chars().all(char::is_alphabetic)) {
            record.month = month.to_string();
        }
    }
    if record.year == 0 {
        let year = tokens
            .iter()
            .filter(|t| t.chars().all(|c| c.is_ascii_digit()))
            .find_map(|t| match t.len() {
                4 => t.parse::<i32>().ok(),
                2 => t.parse::<i32>().ok().map(|y| 2000 + y),
                _ => None,
            });
        if let Some(year) = year {
            record.year = year;
        }
    }
    record
}

fn split_schema(a: &str, b: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            a: { "type": "NUMBER" },
            b: { "type": "NUMBER" },
            "total": { "type": "NUMBER" }
        },
        "required": [a, b, "total"]
    })
}

fn family_schema(domestic: Value, international: Value) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "domestic": domestic,
            "international": international,
            "total": { "type": "NUMBER" },
            "previousYear": { "type": "NUMBER" },
            "previousMonth": { "type": "NUMBER" },
            "growthPercentage": { "type": "NUMBER" }
        },
        "required": ["domestic", "international", "total"]
    })
}

fn response_schema() -> Value {
    let number = json!({ "type": "NUMBER" });
    json!({
        "type": "OBJECT",
        "properties": {
            "data": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "airportName": { "type": "STRING", "description": "Name of the airport" },
                        "category": { "type": "STRING", "description": "Airport category" },
                        "timePeriod": { "type": "STRING", "description": "Month and year of the report, e.g. 'Oct 2023'" },
                        "passengers": family_schema(number.clone(), number.clone()),
                        "cargo": family_schema(split_schema("inbound", "outbound"), split_schema("inbound", "outbound")),
                        "atms": family_schema(split_schema("pax", "cargo"), split_schema("pax", "cargo")),
                        "month": { "type": "STRING" },
                        "year": { "type": "NUMBER" },
                        "reportType": { "type": "STRING", "enum": ["Monthly", "Yearly"] }
                    },
                    "required": ["airportName", "passengers", "cargo", "atms", "timePeriod"]
                }
            }
        },
        "required": ["data"]
    })
}
