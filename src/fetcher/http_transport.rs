use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use url::Url;

use crate::fetcher::{Transport, TransportError, TransportReply};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = "gameshelf/0.1.0";

/// reqwest-backed transport. Redirects are left to the [`Downloader`](super::Downloader).
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_options(Duration::from_secs(DEFAULT_TIMEOUT_SECS), DEFAULT_USER_AGENT)
    }

    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &Url) -> Result<TransportReply, TransportError> {
        // Anything but HTTP(S) is answered without touching the resource
        if !matches!(url.scheme(), "http" | "https") {
            tracing::debug!("Not fetching non-HTTP URL {}", url);
            return Ok(TransportReply::Other {
                url: url.clone(),
                body: Vec::new(),
            });
        }

        tracing::debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = response.url().clone();
        let body = response.bytes().await?.to_vec();

        Ok(TransportReply::Http {
            url: final_url,
            status,
            headers,
            body,
        })
    }
}
