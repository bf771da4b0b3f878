/// Search client: the single point of entry for all search backend calls.
///
/// The Explore controller only sees the `SearchBackend` trait; the HTTP
/// implementation below is what the service wires in at startup.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::search::{FacetSet, ResultPage, SearchRequest};

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 250;
/// Cooldown assumed when a 429 carries neither a typed body nor `Retry-After`.
const DEFAULT_RESET_SECS: u64 = 60;
const RATE_LIMIT_TYPE: &str = "RATE_LIMIT";

/// Structured throttling signal from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitNotice {
    pub message: String,
    pub reset_in_seconds: u64,
    #[serde(default)]
    pub is_authenticated: bool,
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Rate limited: {} (resets in {}s)", .0.message, .0.reset_in_seconds)]
    RateLimited(RateLimitNotice),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed search response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SearchError {
    pub fn rate_limit(&self) -> Option<&RateLimitNotice> {
        match self {
            SearchError::RateLimited(notice) => Some(notice),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            SearchError::Http(_) => true,
            SearchError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// The search backend contract. Implement this to swap the transport
/// without touching the controller.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn get_facets(&self) -> Result<FacetSet, SearchError>;

    async fn search_users(&self, request: &SearchRequest) -> Result<ResultPage, SearchError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    reset_in_seconds: Option<u64>,
    #[serde(default)]
    is_authenticated: bool,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    message: String,
}

/// HTTP implementation of `SearchBackend` with bounded retries on transient
/// failures. 429 is never retried; it is surfaced to the rate-limit guard.
#[derive(Clone)]
pub struct HttpSearchClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpSearchClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    async fn send_with_retry<F>(&self, label: &str, build: F) -> Result<String, SearchError>
    where
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = Duration::from_millis(BASE_BACKOFF_MS * (1 << (attempt - 1)));
                warn!(
                    "Search call '{label}' attempt {attempt} failed, retrying after {}ms...",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = build(&self.client);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let result = match request.send().await {
                Ok(response) => read_response(response).await,
                Err(e) => Err(SearchError::Http(e)),
            };

            match result {
                Ok(body) => {
                    debug!("Search call '{label}' succeeded ({} bytes)", body.len());
                    return Ok(body);
                }
                Err(e) if e.is_retryable() => last_error = Some(e),
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(SearchError::Api {
            status: 0,
            message: format!("'{label}' exhausted {MAX_ATTEMPTS} attempts"),
        }))
    }
}

#[async_trait]
impl SearchBackend for HttpSearchClient {
    async fn get_facets(&self) -> Result<FacetSet, SearchError> {
        let url = format!("{}/facets", self.base_url);
        let body = self
            .send_with_retry("facets", |client| client.get(&url))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn search_users(&self, request: &SearchRequest) -> Result<ResultPage, SearchError> {
        let url = format!("{}/users/search", self.base_url);
        let body = self
            .send_with_retry("search_users", |client| client.post(&url).json(request))
            .await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn read_response(response: Response) -> Result<String, SearchError> {
    let status = response.status();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok());
    let body = response.text().await?;

    if status.is_success() {
        return Ok(body);
    }
    Err(classify_error(status, retry_after, &body))
}

/// Maps a non-2xx response to a `SearchError`. A typed `RATE_LIMIT` body wins
/// over the status code; a bare 429 falls back to `Retry-After`.
fn classify_error(status: StatusCode, retry_after: Option<u64>, body: &str) -> SearchError {
    if let Ok(typed) = serde_json::from_str::<TypedErrorBody>(body) {
        if typed.error_type == RATE_LIMIT_TYPE {
            return SearchError::RateLimited(RateLimitNotice {
                message: typed.message,
                reset_in_seconds: typed
                    .reset_in_seconds
                    .or(retry_after)
                    .unwrap_or(DEFAULT_RESET_SECS),
                is_authenticated: typed.is_authenticated,
            });
        }
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return SearchError::RateLimited(RateLimitNotice {
            message: "Too many requests".to_string(),
            reset_in_seconds: retry_after.unwrap_or(DEFAULT_RESET_SECS),
            is_authenticated: false,
        });
    }

    let message = serde_json::from_str::<MessageBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.to_string());
    SearchError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_rate_limit_body() {
        let body = r#"{"type":"RATE_LIMIT","message":"Slow down","resetInSeconds":42,"isAuthenticated":true}"#;
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, None, body);
        let notice = err.rate_limit().expect("rate limit");
        assert_eq!(notice.message, "Slow down");
        assert_eq!(notice.reset_in_seconds, 42);
        assert!(notice.is_authenticated);
    }

    #[test]
    fn test_typed_rate_limit_recognized_on_other_status() {
        let body = r#"{"type":"RATE_LIMIT","message":"quota","resetInSeconds":5}"#;
        let err = classify_error(StatusCode::FORBIDDEN, None, body);
        assert_eq!(err.rate_limit().map(|n| n.reset_in_seconds), Some(5));
    }

    #[test]
    fn test_bare_429_uses_retry_after() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, Some(17), "busy");
        assert_eq!(err.rate_limit().map(|n| n.reset_in_seconds), Some(17));
    }

    #[test]
    fn test_bare_429_without_header_uses_default() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, None, "");
        assert_eq!(
            err.rate_limit().map(|n| n.reset_in_seconds),
            Some(DEFAULT_RESET_SECS)
        );
    }

    #[test]
    fn test_server_error_is_retryable_generic_failure() {
        let err = classify_error(
            StatusCode::BAD_GATEWAY,
            None,
            r#"{"message":"upstream down"}"#,
        );
        assert!(err.rate_limit().is_none());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("upstream down"));
    }

    #[test]
    fn test_client_error_not_retryable() {
        let err = classify_error(StatusCode::BAD_REQUEST, None, "bad filter");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_never_retried() {
        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, None, "");
        assert!(!err.is_retryable());
    }
}
