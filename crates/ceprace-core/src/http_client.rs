use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::adapters::DEFAULT_REQUEST_TIMEOUT_MS;

/// HTTP GET request envelope used by adapter transport calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// HTTP response envelope returned by an adapter transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level HTTP error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

pub type HttpFuture<'a> = Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

/// Adapter transport contract.
///
/// Implementations must be cancel-safe: dropping the returned future aborts
/// the request.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("ceprace/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    /// Create a ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        Box::pin(async move {
            let mut builder = self.client.get(&request.url);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            builder = builder.timeout(Duration::from_millis(request.timeout_ms));

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse { status, body })
        })
    }
}

/// One canned reply served by [`ScriptedHttpClient`].
#[derive(Debug, Clone)]
pub struct ScriptedReply {
    pub delay: Duration,
    pub outcome: Result<HttpResponse, HttpError>,
}

impl ScriptedReply {
    pub fn json(delay: Duration, body: impl Into<String>) -> Self {
        Self {
            delay,
            outcome: Ok(HttpResponse::ok_json(body)),
        }
    }

    pub fn status(delay: Duration, status: u16, body: impl Into<String>) -> Self {
        Self {
            delay,
            outcome: Ok(HttpResponse::with_status(status, body)),
        }
    }

    pub fn transport_error(delay: Duration, message: impl Into<String>) -> Self {
        Self {
            delay,
            outcome: Err(HttpError::new(message)),
        }
    }
}

/// Deterministic transport for offline tests.
///
/// Replies are keyed by exact URL and released after their scripted delay on
/// the tokio clock, so a paused runtime controls arrival order precisely.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    replies: HashMap<String, ScriptedReply>,
    calls: AtomicUsize,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, url: impl Into<String>, reply: ScriptedReply) -> Self {
        self.replies.insert(url.into(), reply);
        self
    }

    /// Number of requests issued so far, including ones later cancelled.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let Some(reply) = self.replies.get(&request.url) else {
                return Err(HttpError::new(format!(
                    "connection failed: no scripted reply for {}",
                    request.url
                )));
            };

            tokio::time::sleep(reply.delay).await;
            reply.outcome.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_default_to_the_adapter_timeout() {
        let request = HttpRequest::get("http://viacep.test/ws/01001000/json/");
        assert_eq!(request.timeout_ms, DEFAULT_REQUEST_TIMEOUT_MS);

        let tightened = request.with_timeout_ms(250);
        assert_eq!(tightened.timeout_ms, 250);
    }

    #[test]
    fn header_names_are_lowercased() {
        let request =
            HttpRequest::get("https://example.test/cep").with_header("Accept", "application/json");

        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn only_2xx_counts_as_success() {
        assert!(HttpResponse::ok_json("{}").is_success());
        assert!(HttpResponse::with_status(204, "").is_success());
        assert!(!HttpResponse::with_status(404, "{}").is_success());
        assert!(!HttpResponse::with_status(500, "").is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_client_waits_for_delay() {
        let client = ScriptedHttpClient::new().with_reply(
            "https://example.test/a",
            ScriptedReply::json(Duration::from_millis(250), r#"{"ok":true}"#),
        );

        let started = tokio::time::Instant::now();
        let response = client
            .execute(HttpRequest::get("https://example.test/a"))
            .await
            .expect("scripted reply");

        assert_eq!(response.body, r#"{"ok":true}"#);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(250), "released early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(260), "released late: {elapsed:?}");
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn scripted_client_rejects_unknown_url() {
        let client = ScriptedHttpClient::new();
        let error = client
            .execute(HttpRequest::get("https://example.test/missing"))
            .await
            .expect_err("no reply scripted");

        assert!(error.message().contains("no scripted reply"));
    }
}
