//! Remote repository client

use crate::error::UpstreamError;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Response of a single upstream request
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Reported length; `None` when absent or zero
    pub content_length: Option<u64>,
    /// Empty when the body was not requested
    pub body: Bytes,
}

impl UpstreamResponse {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// An HTTP GET against a remote repository
///
/// Non-2xx statuses are returned as responses, not errors.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn get(&self, url: &str, with_body: bool) -> Result<UpstreamResponse, UpstreamError>;
}

/// reqwest-backed upstream client
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .read_timeout(read_timeout)
            .build()
            .map_err(|e| UpstreamError::Protocol(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn get(&self, url: &str, with_body: bool) -> Result<UpstreamResponse, UpstreamError> {
        let response = self.client.get(url).send().await.map_err(classify)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let content_length = response.content_length().filter(|len| *len > 0);

        let body = if with_body && (200..300).contains(&status) {
            response.bytes().await.map_err(classify)?
        } else {
            Bytes::new()
        };

        Ok(UpstreamResponse {
            status,
            content_type,
            content_length,
            body,
        })
    }
}

fn classify(error: reqwest::Error) -> UpstreamError {
    if error.is_builder() {
        UpstreamError::Protocol(error.to_string())
    } else {
        UpstreamError::Unreachable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let response = |status| UpstreamResponse {
            status,
            content_type: None,
            content_length: None,
            body: Bytes::new(),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(301).is_success());
        assert!(!response(404).is_success());
    }

    #[tokio::test]
    async fn test_invalid_url_is_protocol_error() {
        let upstream =
            HttpUpstream::new(Duration::from_millis(100), Duration::from_millis(100)).unwrap();
        let result = upstream.get("not a url", true).await;
        assert!(matches!(result, Err(UpstreamError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_refused_connection_is_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let upstream =
            HttpUpstream::new(Duration::from_millis(500), Duration::from_millis(500)).unwrap();
        let result = upstream.get(&format!("http://{addr}/g/a/1.0/a.jar"), true).await;
        assert!(matches!(result, Err(UpstreamError::Unreachable(_))));
    }
}
