//! Client for the remote language detection service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while calling the detection service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Failed to reach the service
    #[error("Connection error: {0}")]
    Connection(String),
    /// Service answered with a non-success status
    #[error("API error: {0}")]
    Api(String),
    /// Response body was not the expected JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response held no candidate language
    #[error("Detection service returned no candidate language")]
    NoCandidate,
}

/// A detector that names the most likely language of a text.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Language code of the top-ranked candidate.
    async fn top_language(&self, text: &str) -> Result<String, ServiceError>;
}

/// Request body of `POST /language-detection`.
#[derive(Debug, Serialize)]
struct DetectionRequest<'a> {
    text: &'a str,
    count: u32,
}

/// Response body of `POST /language-detection`.
#[derive(Debug, Deserialize)]
struct DetectionResponse {
    language: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    codex: String,
}

impl DetectionResponse {
    fn top_codex(self) -> Result<String, ServiceError> {
        self.language
            .and_then(|candidates| candidates.into_iter().next())
            .map(|candidate| candidate.codex)
            .ok_or(ServiceError::NoCandidate)
    }
}

/// HTTP client for the detection service.
pub struct HttpLanguageService {
    endpoint: String,
    client: Client,
}

impl HttpLanguageService {
    /// Create a client for the service at `endpoint` (scheme, host and port).
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Connection(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LanguageService for HttpLanguageService {
    async fn top_language(&self, text: &str) -> Result<String, ServiceError> {
        let url = format!("{}/language-detection", self.endpoint);
        let request = DetectionRequest { text, count: 1 };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ServiceError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Api(format!("HTTP {}: {}", status, body)));
        }

        let detection: DetectionResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Parse(e.to_string()))?;

        let codex = detection.top_codex()?;
        debug!("Detection service guessed '{}' for {} chars", codex, text.len());
        Ok(codex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn parse(body: &str) -> Result<String, ServiceError> {
        serde_json::from_str::<DetectionResponse>(body)
            .map_err(|e| ServiceError::Parse(e.to_string()))?
            .top_codex()
    }

    #[test]
    fn test_top_codex() {
        assert_eq!(
            parse(r#"{"language":[{"codex":"pt","score":0.9},{"codex":"es"}]}"#).unwrap(),
            "pt"
        );
        assert!(matches!(
            parse(r#"{"language":[]}"#),
            Err(ServiceError::NoCandidate)
        ));
        assert!(matches!(parse(r#"{}"#), Err(ServiceError::NoCandidate)));
        assert!(matches!(
            parse(r#"{"language":[{"name":"x"}]}"#),
            Err(ServiceError::Parse(_))
        ));
    }

    #[test]
    fn test_request_body() {
        let json = serde_json::to_value(DetectionRequest {
            text: "olá",
            count: 1,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"text": "olá", "count": 1}));
    }

    /// Serve a single HTTP response and hand back the raw request.
    async fn serve_once(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (format!("http://{}", addr), handle)
    }

    #[tokio::test]
    async fn test_http_service_posts_text() {
        let (endpoint, handle) = serve_once("200 OK", r#"{"language":[{"codex":"es"}]}"#).await;
        let service =
            HttpLanguageService::new(format!("{}/", endpoint), Duration::from_secs(5)).unwrap();
        assert_eq!(service.endpoint(), endpoint);

        let codex = service.top_language("hola mundo").await.unwrap();
        assert_eq!(codex, "es");

        let request = handle.await.unwrap();
        assert!(request.starts_with("POST /language-detection "));
        assert!(request.contains(r#""text":"hola mundo""#));
        assert!(request.contains(r#""count":1"#));
    }

    #[tokio::test]
    async fn test_http_service_reports_status() {
        let (endpoint, handle) =
            serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let service = HttpLanguageService::new(endpoint, Duration::from_secs(5)).unwrap();
        let err = service.top_language("texto").await.unwrap_err();
        assert!(matches!(err, ServiceError::Api(ref msg) if msg.contains("500")));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_http_service_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let service =
            HttpLanguageService::new(format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        assert!(matches!(
            service.top_language("x").await,
            Err(ServiceError::Connection(_))
        ));
    }
}
