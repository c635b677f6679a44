//! Blocking HTTP plumbing shared by the exchange adapters.
//!
//! Maps transport failures and HTTP statuses onto `VenueError` and feeds the
//! shared circuit breaker. One call is one request; no retries here.

use super::circuit_breaker::CircuitBreaker;
use super::venue::VenueError;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("trendcycle/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    breaker: Arc<CircuitBreaker>,
}

impl HttpClient {
    /// `timeout` bounds each request attempt.
    pub fn new(breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, VenueError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VenueError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, breaker })
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, VenueError> {
        if !self.breaker.is_allowed() {
            tracing::warn!(
                %url,
                cooldown_secs = self.breaker.remaining_cooldown().as_secs(),
                "request refused: circuit breaker open"
            );
            return Err(VenueError::CircuitBreakerTripped);
        }

        tracing::debug!(%url, "GET");
        let resp = self.client.get(url).send().map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                self.breaker.record_failure();
                VenueError::NetworkUnreachable(e.to_string())
            } else {
                VenueError::Other(e.to_string())
            }
        })?;

        let status = resp.status();

        if status == StatusCode::FORBIDDEN || status.as_u16() == 418 {
            self.breaker.trip();
            return Err(VenueError::CircuitBreakerTripped);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            self.breaker.record_failure();
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(VenueError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            if status.is_server_error() {
                self.breaker.record_failure();
            }
            let body = resp.text().unwrap_or_default();
            return Err(VenueError::Http {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        let parsed = resp
            .json::<T>()
            .map_err(|e| VenueError::ResponseFormatChanged(format!("invalid JSON body: {e}")))?;
        self.breaker.record_success();
        Ok(parsed)
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &s[..idx]),
        None => s.to_string(),
    }
}

/// Venues encode numbers either as JSON numbers or as decimal strings.
pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub(crate) fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_parse_from_strings_and_numbers() {
        assert_eq!(value_as_f64(&json!("42.5")), Some(42.5));
        assert_eq!(value_as_f64(&json!(7)), Some(7.0));
        assert_eq!(value_as_f64(&json!(null)), None);
        assert_eq!(value_as_i64(&json!("1700000000000")), Some(1_700_000_000_000));
        assert_eq!(value_as_i64(&json!(12)), Some(12));
    }

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("abcdef", 3), "abc…");
    }
}
