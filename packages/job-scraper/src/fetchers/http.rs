//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{FetchError, FetchResult};
use crate::traits::transport::Transport;
use crate::types::config::FetcherConfig;
use crate::types::page::{FetchRequest, FetchedPage};

/// Browser user agents some portals require to serve plain HTML.
pub const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
];

/// Pick one of [`BROWSER_USER_AGENTS`].
pub fn random_browser_agent() -> &'static str {
    BROWSER_USER_AGENTS[fastrand::usize(..BROWSER_USER_AGENTS.len())]
}

/// HTTP transport sharing one connection pool and header set for the process.
///
/// TLS certificates are verified and up to 10 redirects are followed. The
/// read timeout bounds each wait for response data, not the whole download.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build the session client from fetcher settings.
    pub fn new(config: &FetcherConfig) -> FetchResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .map_err(|e| FetchError::Client(Box::new(e)))?,
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Client(Box::new(e)))?;

        Ok(Self { client })
    }

    fn classify(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_builder() {
            FetchError::Client(Box::new(error))
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: Box::new(error),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &FetchRequest) -> FetchResult<FetchedPage> {
        debug!(url = %request.url, params = request.query.len(), "HTTP fetch starting");

        let mut builder = self.client.get(&request.url);
        if let Some(deadline) = request.timeout {
            builder = builder.timeout(deadline);
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::classify(&request.url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|v| (k.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: request.url.clone(),
                }
            } else {
                FetchError::Body {
                    url: request.url.clone(),
                    source: Box::new(e),
                }
            }
        })?;

        debug!(url = %request.url, status, bytes = body.len(), "HTTP fetch completed");

        let mut page = FetchedPage::new(&request.url, status, body).with_final_url(final_url);
        page.headers = headers;
        Ok(page)
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builds_with_defaults() {
        let transport = HttpTransport::new(&FetcherConfig::default());
        assert!(transport.is_ok());
        assert_eq!(transport.map(|t| t.name().to_string()).ok(), Some("http".to_string()));
    }

    #[test]
    fn test_rejects_invalid_header_value() {
        let mut config = FetcherConfig::default();
        config.accept_language = "es\nCL".to_string();
        assert!(matches!(HttpTransport::new(&config), Err(FetchError::Client(_))));
    }

    #[test]
    fn test_random_browser_agent_is_known() {
        for _ in 0..10 {
            assert!(BROWSER_USER_AGENTS.contains(&random_browser_agent()));
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::new(
            &FetcherConfig::default()
                .with_timeouts(std::time::Duration::from_millis(500), std::time::Duration::from_secs(1)),
        )
        .unwrap();
        let result = transport
            .send(&FetchRequest::new("http://127.0.0.1:9/unreachable"))
            .await;
        assert!(matches!(
            result,
            Err(FetchError::Transport { .. }) | Err(FetchError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_silent_server_hits_read_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let transport = HttpTransport::new(
            &FetcherConfig::default()
                .with_timeouts(std::time::Duration::from_secs(1), std::time::Duration::from_millis(300)),
        )
        .unwrap();

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            transport.send(&FetchRequest::new(format!("http://{}/silent", addr))),
        )
        .await
        .expect("read timeout should end the request");

        assert!(matches!(
            result,
            Err(FetchError::Timeout { .. }) | Err(FetchError::Transport { .. })
        ));
    }
}
