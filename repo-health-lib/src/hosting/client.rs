//! GitHub API client
//!
//! Minimal GitHub API client with bounded rate-limit retries and soft-failure results.

use super::pagination::last_page;
use crate::Result;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use serde::de::DeserializeOwned;

const LOG_TARGET: &str = "   hosting";
const USER_AGENT: &str = concat!("repo-health/", env!("CARGO_PKG_VERSION"));

/// Upper bound applied to a server-provided `Retry-After` value.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Timing and retry knobs for [`Client`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Timeout applied to every request
    pub request_timeout: Duration,

    /// Sleep between rate-limited attempts when the server sends no `Retry-After`
    pub rate_limit_backoff: Duration,

    /// Number of retries after a rate-limited response before giving up
    pub max_rate_limit_retries: u32,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            rate_limit_backoff: Duration::from_secs(5),
            max_rate_limit_retries: 5,
        }
    }
}

/// A decoded `200 OK` response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: serde_json::Value,

    /// Raw `Link` header, if the response was paginated
    pub link: Option<String>,
}

/// Why a request did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoftFailure {
    /// The server answered with a status other than `200 OK`
    Status(u16),

    /// Still rate limited after exhausting the retry budget
    RateLimited { attempts: u32 },

    /// Connection, TLS, or timeout failure
    Transport(String),

    /// The body could not be decoded into the expected shape
    Decode(String),
}

impl Display for SoftFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP status {status}"),
            Self::RateLimited { attempts } => write!(f, "rate limited after {attempts} attempt(s)"),
            Self::Transport(msg) => write!(f, "request failed: {msg}"),
            Self::Decode(msg) => write!(f, "could not decode response: {msg}"),
        }
    }
}

/// Result of a hosting API call
#[derive(Debug, Clone)]
pub enum ApiResult<T> {
    /// Request succeeded
    Success(T),

    /// Request failed in a recoverable way; the caller should skip and move on
    SoftFailure(SoftFailure),
}

impl<T> ApiResult<T> {
    /// Returns `true` if the result is `Success`.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Converts into an `Option`, discarding the failure reason.
    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::SoftFailure(_) => None,
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Success(value) => ApiResult::Success(f(value)),
            Self::SoftFailure(failure) => ApiResult::SoftFailure(failure),
        }
    }
}

/// GitHub API client
#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    settings: ClientSettings,
}

impl Client {
    /// Create a new API client with an optional bearer token and base URL
    pub fn new(token: Option<&str>, base_url: impl Into<String>, settings: ClientSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        if let Some(t) = token {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {t}"))?;
            auth_val.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, auth_val);
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            settings,
        })
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub const fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Issue a GET request and classify the result.
    ///
    /// Rate-limited responses are retried after a backoff, at most
    /// `max_rate_limit_retries` times. Every other non-200 outcome is a soft failure.
    pub async fn fetch(&self, endpoint: &str, query: &[(&str, String)]) -> ApiResult<ApiResponse> {
        let url = self.endpoint_url(endpoint);
        let mut retries = 0u32;

        loop {
            let resp = match self.client.get(&url).query(query).send().await {
                Ok(r) => r,
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Request to '{url}' failed: {e}");
                    return ApiResult::SoftFailure(SoftFailure::Transport(e.to_string()));
                }
            };

            let status = resp.status();
            if status == StatusCode::OK {
                let link = resp.headers().get(LINK).and_then(|h| h.to_str().ok()).map(str::to_owned);
                return match resp.json::<serde_json::Value>().await {
                    Ok(body) => ApiResult::Success(ApiResponse { body, link }),
                    Err(e) => {
                        log::warn!(target: LOG_TARGET, "Could not decode response from '{url}': {e}");
                        ApiResult::SoftFailure(SoftFailure::Decode(e.to_string()))
                    }
                };
            }

            let retry_after = parse_retry_after(resp.headers());
            let text = resp.text().await.unwrap_or_default();

            if is_rate_limited(status, &text) {
                if retries >= self.settings.max_rate_limit_retries {
                    log::error!(
                        target: LOG_TARGET,
                        "Still rate limited on '{url}' after {} attempt(s), giving up",
                        retries + 1
                    );
                    return ApiResult::SoftFailure(SoftFailure::RateLimited { attempts: retries + 1 });
                }

                retries += 1;
                let delay = retry_after.map_or(self.settings.rate_limit_backoff, |d| d.min(MAX_RETRY_AFTER));
                log::warn!(
                    target: LOG_TARGET,
                    "Rate limit hit on '{url}', sleeping {}ms (retry {retries}/{})",
                    delay.as_millis(),
                    self.settings.max_rate_limit_retries
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            log::warn!(target: LOG_TARGET, "GitHub error {status} for '{url}': {}", text.trim());
            return ApiResult::SoftFailure(SoftFailure::Status(status.as_u16()));
        }
    }

    /// Issue a GET request and decode the body into `T`.
    pub async fn fetch_as<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, String)]) -> ApiResult<T> {
        match self.fetch(endpoint, query).await {
            ApiResult::Success(resp) => match serde_json::from_value(resp.body) {
                Ok(value) => ApiResult::Success(value),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "Unexpected response shape from '{endpoint}': {e}");
                    ApiResult::SoftFailure(SoftFailure::Decode(e.to_string()))
                }
            },
            ApiResult::SoftFailure(failure) => ApiResult::SoftFailure(failure),
        }
    }

    /// Count the items of a paginated collection without downloading it.
    ///
    /// Requests one item per page and returns the page number of the `rel="last"`
    /// link. Without such a link the collection fits on one page, so the count is
    /// the length of the returned array.
    pub async fn count_items(&self, endpoint: &str, query: &[(&str, String)]) -> ApiResult<u64> {
        let mut query = query.to_vec();
        query.push(("per_page", "1".to_owned()));

        self.fetch(endpoint, &query).await.map(|resp| {
            resp.link
                .as_deref()
                .and_then(last_page)
                .unwrap_or_else(|| resp.body.as_array().map_or(0, |items| items.len() as u64))
        })
    }
}

/// Whether a failed response signals throttling rather than a real error.
fn is_rate_limited(status: StatusCode, body: &str) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && body.to_ascii_lowercase().contains("rate limit"))
}

/// Parse the `Retry-After` header value as seconds.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}
