use crate::core::error::{KeyCopError, Result};
use curl::easy::{Easy2, Handler, WriteError};
use std::time::Duration;

/// Collector for response data
struct Collector(Vec<u8>);

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        self.0.extend_from_slice(data);
        Ok(data.len())
    }
}

/// HTTP client using libcurl. Requests are synchronous; callers on the
/// async runtime wrap them in `tokio::task::spawn_blocking`.
pub struct HttpClient {
    timeout: Duration,
}

impl HttpClient {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse> {
        self.request(url, headers, None)
    }

    pub fn post(&self, url: &str, headers: &[(&str, &str)], body: &str) -> Result<HttpResponse> {
        self.request(url, headers, Some(body))
    }

    fn request(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: Option<&str>,
    ) -> Result<HttpResponse> {
        let mut easy = Easy2::new(Collector(Vec::new()));

        easy.url(url)?;
        easy.timeout(self.timeout)?;
        easy.follow_location(true)?;
        easy.max_redirections(5)?;
        easy.ssl_verify_peer(true)?;
        easy.ssl_verify_host(true)?;

        if let Some(payload) = body {
            easy.post(true)?;
            easy.post_fields_copy(payload.as_bytes())?;
        }

        let mut list = curl::easy::List::new();
        for (key, value) in headers {
            list.append(&format!("{}: {}", key, value))?;
        }
        easy.http_headers(list)?;

        easy.perform()?;

        let status_code = easy.response_code()? as u16;
        let body = easy.get_ref().0.clone();

        Ok(HttpResponse { status_code, body })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status_code: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.clone())
            .map_err(|e| KeyCopError::Unknown(format!("Invalid UTF-8: {}", e)))
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// GitHub reports an exhausted search budget as 403; 429 is the generic
    /// too-many-requests signal.
    pub fn is_rate_limited(&self) -> bool {
        self.status_code == 403 || self.status_code == 429
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }
}
