//! Minimal HTTP client shared by the social and storage wrappers.
//!
//! - Request options: headers, [`Auth`], query params, timeout, retry budget
//! - Redacts sensitive query params and never logs secret values
//! - Retries 429/5xx with exponential backoff and `Retry-After` support;
//!   the budget defaults to zero so nothing is retried unless a caller
//!   opts in
//! - JSON, raw-bytes and plain-text helpers (media download/upload and the
//!   link shortener need more than JSON)
//!
//! Security: `Auth::Bearer` values are sanitized before use, and logs only
//! ever include the auth kind, not the secret.

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Method, Url};

// Re-exported so downstream wrappers can build headers and match statuses
// without depending on reqwest themselves.
pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// HTTP status of an upstream `Api` error, if that is what this is.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for upstream authentication/authorization rejections.
    pub fn is_auth(&self) -> bool {
        self.status()
            .is_some_and(|s| s == StatusCode::UNAUTHORIZED || s == StatusCode::FORBIDDEN)
    }
}

/// Authentication strategies supported by the client.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// Authorization: Bearer <token>
    Bearer(&'a str),
    None,
}

/// Per-request tuning knobs.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
    /// If true and `path` is an absolute URL, use it as-is (ignore base).
    pub allow_absolute: bool,
}

/// Request body handed to [`HttpClient::execute`].
enum Payload {
    Empty,
    Json(Vec<u8>),
    Octet(Vec<u8>),
}

impl Payload {
    fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Json(b) | Payload::Octet(b) => b.len(),
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 0,
        })
    }

    /// Override the default per-request timeout.
    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    /// Override the default retry budget (zero unless a caller opts in).
    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    /// GET and decode a JSON response.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (_, bytes, req_id) = self.execute(Method::GET, path, Payload::Empty, opts).await?;
        decode_json(&bytes, &req_id)
    }

    /// POST a JSON body and decode a JSON response.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body).map_err(|e| HttpError::Build(e.to_string()))?;
        let (_, bytes, req_id) = self
            .execute(Method::POST, path, Payload::Json(bytes), opts)
            .await?;
        decode_json(&bytes, &req_id)
    }

    /// POST with no body (endpoints driven purely by query params) and
    /// decode a JSON response.
    pub async fn post_json_empty<T>(
        &self,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (_, bytes, req_id) = self
            .execute(Method::POST, path, Payload::Empty, opts)
            .await?;
        decode_json(&bytes, &req_id)
    }

    /// POST an opaque octet-stream body (file uploads) and decode a JSON
    /// response.
    pub async fn post_octets<T>(
        &self,
        path: &str,
        body: Vec<u8>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let (_, bytes, req_id) = self
            .execute(Method::POST, path, Payload::Octet(body), opts)
            .await?;
        decode_json(&bytes, &req_id)
    }

    /// GET a raw body (media downloads). Non-2xx is an `Api` error.
    pub async fn get_bytes(&self, path: &str, opts: RequestOpts<'_>) -> Result<Vec<u8>, HttpError> {
        let (_, bytes, _) = self.execute(Method::GET, path, Payload::Empty, opts).await?;
        Ok(bytes)
    }

    /// GET a plain-text body (the link shortener replies with bare text).
    pub async fn get_text(&self, path: &str, opts: RequestOpts<'_>) -> Result<String, HttpError> {
        let (_, bytes, _) = self.execute(Method::GET, path, Payload::Empty, opts).await?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }

    /// Send one request, retrying within the configured budget, and return
    /// the successful status, body and request id. Non-2xx responses that
    /// survive the budget come back as [`HttpError::Api`].
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Payload,
        opts: RequestOpts<'_>,
    ) -> Result<(StatusCode, Vec<u8>, String), HttpError> {
        let url = self.resolve(path, opts.allow_absolute)?;
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let max_retries = opts.retries.unwrap_or(self.max_retries);

        let mut attempt = 0usize;
        loop {
            let req_id = format!("r{}", Uuid::new_v4().simple());
            let mut rb = self.inner.request(method.clone(), url.clone());
            rb = rb.timeout(timeout);

            if let Some(q) = &opts.query {
                let pairs: Vec<(&str, &str)> = q.iter().map(|(k, v)| (*k, v.as_ref())).collect();
                rb = rb.query(&pairs);
            }
            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }
            match &body {
                Payload::Empty => {}
                Payload::Json(bytes) => {
                    rb = rb
                        .header(CONTENT_TYPE, "application/json")
                        .body(bytes.clone());
                }
                Payload::Octet(bytes) => {
                    rb = rb
                        .header(CONTENT_TYPE, "application/octet-stream")
                        .body(bytes.clone());
                }
            }

            let auth_kind = match &opts.auth {
                Some(Auth::Bearer(tok)) => {
                    rb = rb.bearer_auth(sanitize_api_key(tok)?);
                    "bearer"
                }
                Some(Auth::None) | None => "none",
            };

            tracing::debug!(
                req_id = %req_id,
                attempt = attempt + 1,
                max_retries,
                method = %method,
                host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
                query = ?redact_query(opts.query.as_deref()),
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                body_len = body.len(),
                "http.request.start"
            );

            let t0 = std::time::Instant::now();
            let sent = rb.send().await;
            let (status, headers, bytes) = match read_response(sent).await {
                Ok(parts) => parts,
                Err(message) => {
                    if attempt < max_retries {
                        attempt += 1;
                        let delay = backoff_delay(attempt, false, None);
                        tracing::warn!(
                            req_id = %req_id,
                            attempt,
                            max_retries,
                            backoff_ms = delay.as_millis() as u64,
                            message = %message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id = %req_id, attempt, message = %message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };

            let upstream_id = headers
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();
            tracing::debug!(
                req_id = %req_id,
                %status,
                duration_ms = t0.elapsed().as_millis() as u64,
                body_len = bytes.len(),
                x_request_id = %upstream_id,
                "http.response"
            );

            if status.is_success() {
                return Ok((status, bytes, req_id));
            }

            let message = extract_error_message(&bytes);
            let retryable = status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
            if retryable && attempt < max_retries {
                attempt += 1;
                let delay = backoff_delay(
                    attempt,
                    status == StatusCode::TOO_MANY_REQUESTS,
                    retry_after_secs(&headers),
                );
                tracing::warn!(
                    req_id = %req_id,
                    %status,
                    attempt,
                    max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    message = %message,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            tracing::warn!(
                req_id = %req_id,
                %status,
                message = %message,
                x_request_id = %upstream_id,
                body_snippet = %snip_body(&bytes),
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id: upstream_id,
            });
        }
    }

    fn resolve(&self, path: &str, allow_absolute: bool) -> Result<Url, HttpError> {
        if allow_absolute {
            if let Ok(abs) = Url::parse(path) {
                return Ok(abs);
            }
        }
        self.base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))
    }
}

async fn read_response(
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), String> {
    let resp = sent.map_err(|e| e.to_string())?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
    Ok((status, headers, bytes.to_vec()))
}

fn decode_json<T: DeserializeOwned>(bytes: &[u8], req_id: &str) -> Result<T, HttpError> {
    serde_json::from_slice(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            req_id = %req_id,
            serde_err = %e,
            body_snippet = %snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn backoff_delay(attempt: usize, throttled: bool, retry_after: Option<u64>) -> Duration {
    if let Some(secs) = retry_after {
        return Duration::from_secs(secs);
    }
    let exp = Duration::from_millis(200u64.saturating_mul(1 << (attempt - 1)));
    if throttled {
        // floor for 429 when no Retry-After is present
        exp.max(Duration::from_millis(1100))
    } else {
        exp
    }
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

/// Pull a human-readable message from the error shapes our upstreams use:
/// Dropbox-style `error_summary`, platform-style `errors[]`, then the
/// generic single-field shapes, falling back to a body snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Summary {
        error_summary: String,
    }

    #[derive(Deserialize)]
    struct ErrorList {
        errors: Vec<ErrorEntry>,
    }
    #[derive(Deserialize)]
    struct ErrorEntry {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
    }

    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(s) = serde_json::from_slice::<Summary>(body) {
        return s.error_summary;
    }
    if let Ok(list) = serde_json::from_slice::<ErrorList>(body) {
        if let Some(first) = list.errors.into_iter().next() {
            if !first.message.is_empty() {
                return first.message;
            }
            if !first.detail.is_empty() {
                return first.detail;
            }
        }
    }
    if let Ok(m) = serde_json::from_slice::<Flat>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        snip.truncate(500);
        snip.push_str("...");
    }
    snip
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }

    // Validate the header value upfront for a clear error
    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}

fn redact_query(query: Option<&[(&str, Cow<'_, str>)]>) -> Vec<(String, String)> {
    query
        .map(|q| {
            q.iter()
                .map(|(k, v)| {
                    let secret = matches!(
                        k.to_ascii_lowercase().as_str(),
                        "access_token" | "authorization" | "auth" | "key" | "api_key" | "token"
                            | "secret" | "client_secret" | "bearer"
                    );
                    (
                        (*k).to_string(),
                        if secret {
                            "<redacted>".to_string()
                        } else {
                            v.as_ref().to_string()
                        },
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_summary() {
        let body = br#"{"error_summary": "path/not_found/..", "error": {".tag": "path"}}"#;
        assert_eq!(extract_error_message(body), "path/not_found/..");
    }

    #[test]
    fn error_message_reads_error_list() {
        let body = br#"{"errors": [{"code": 88, "message": "Rate limit exceeded"}]}"#;
        assert_eq!(extract_error_message(body), "Rate limit exceeded");
    }

    #[test]
    fn error_message_falls_back_to_snippet() {
        assert_eq!(extract_error_message(b"<html>nope</html>"), "<html>nope</html>");
    }

    #[test]
    fn sanitize_strips_wrapping_and_whitespace() {
        assert_eq!(sanitize_api_key("  \"abc def\"  ").unwrap(), "abcdef");
    }

    #[test]
    fn sanitize_rejects_control_bytes() {
        assert!(sanitize_api_key("abc\u{7}def").is_err());
    }

    #[test]
    fn auth_status_mapping() {
        let err = HttpError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: "bad token".into(),
            request_id: "-".into(),
        };
        assert!(err.is_auth());
        let err = HttpError::Api {
            status: StatusCode::NOT_FOUND,
            message: "missing".into(),
            request_id: "-".into(),
        };
        assert!(!err.is_auth());
    }

    #[test]
    fn secret_query_params_are_redacted() {
        let q = [
            ("count", Cow::Borrowed("10")),
            ("access_token", Cow::Borrowed("s3cr3t")),
        ];
        let redacted = redact_query(Some(&q));
        assert_eq!(redacted[0].1, "10");
        assert_eq!(redacted[1].1, "<redacted>");
    }
}
