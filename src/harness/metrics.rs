//! Metrics queries
//!
//! Reads the latest sample for a series from the metrics service's
//! instant-query endpoint. An absent series is an empty read for polling
//! purposes, not an error; only transport failures and malformed bodies
//! surface as errors.

use super::config::MetricsConfig;
use super::error::{HarnessError, HarnessResult};
use serde_json::Value;

pub struct MetricsService {
    client: reqwest::Client,
    url: String,
}

impl MetricsService {
    pub fn new(config: &MetricsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: config.url.clone(),
        }
    }

    /// Latest sample value for `query`, or `None` when the series has no
    /// samples yet
    pub async fn sample(&self, query: &str) -> HarnessResult<Option<f64>> {
        let url = format!("{}/api/v1/query", self.url);
        let response = self
            .client
            .get(&url)
            .query(&[("query", query)])
            .send()
            .await
            .map_err(|e| HarnessError::MetricsError {
                message: format!("query request to {} failed", url),
                source: Some(e.to_string()),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarnessError::MetricsError {
                message: format!("metrics query returned {}", status),
                source: None,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| HarnessError::MetricsError {
                message: "failed to read metrics response body".to_string(),
                source: Some(e.to_string()),
            })?;

        parse_instant_query(&body)
    }
}

/// Parse an instant-query response body down to its first sample value
pub fn parse_instant_query(body: &str) -> HarnessResult<Option<f64>> {
    let value: Value = serde_json::from_str(body).map_err(|e| HarnessError::MetricsError {
        message: "metrics response is not valid JSON".to_string(),
        source: Some(e.to_string()),
    })?;

    if value["status"] != "success" {
        return Err(HarnessError::MetricsError {
            message: format!("metrics query status was {}", value["status"]),
            source: None,
        });
    }

    let results = value["data"]["result"]
        .as_array()
        .ok_or_else(|| HarnessError::MetricsError {
            message: "metrics response missing data.result array".to_string(),
            source: None,
        })?;

    let first = match results.first() {
        Some(series) => series,
        None => return Ok(None),
    };

    // Instant vectors carry [timestamp, "value"] pairs
    let sample = first["value"][1]
        .as_str()
        .ok_or_else(|| HarnessError::MetricsError {
            message: "sample value missing from series".to_string(),
            source: None,
        })?;

    sample
        .parse::<f64>()
        .map(Some)
        .map_err(|e| HarnessError::MetricsError {
            message: format!("sample value '{}' is not numeric", sample),
            source: Some(e.to_string()),
        })
}
