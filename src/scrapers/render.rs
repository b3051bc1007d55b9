//! Managed rendering fetch.
//!
//! Proxies a page through a hosted headless-browser API (ScrapingBee-style
//! `GET {endpoint}?api_key=..&url=..&render_js=true&wait=..`), which executes
//! page scripts before returning the markup.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::fetch::{FetchError, PageFetcher};
use super::http_client::HttpClient;

/// Default managed rendering endpoint.
pub const DEFAULT_RENDER_ENDPOINT: &str = "https://app.scrapingbee.com/api/v1/";

/// Rendering parameters sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// How long the service waits for scripts before capturing markup.
    pub wait_ms: u64,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Upper bound on the whole proxied request.
    pub timeout: Duration,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            wait_ms: 3000,
            viewport_width: 1920,
            viewport_height: 1080,
            timeout: Duration::from_secs(45),
        }
    }
}

/// Fetches pages through the managed rendering service.
pub struct RenderingFetcher {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    options: RenderOptions,
}

impl RenderingFetcher {
    pub fn new(client: HttpClient, endpoint: &str, api_key: &str, options: RenderOptions) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            options,
        }
    }

    /// Build the proxied request URL for `target`.
    pub fn request_url(&self, target: &str) -> Result<Url, FetchError> {
        let wait = self.options.wait_ms.to_string();
        let width = self.options.viewport_width.to_string();
        let height = self.options.viewport_height.to_string();

        Url::parse_with_params(
            &self.endpoint,
            &[
                ("api_key", self.api_key.as_str()),
                ("url", target),
                ("render_js", "true"),
                ("wait", wait.as_str()),
                ("window_width", width.as_str()),
                ("window_height", height.as_str()),
            ],
        )
        .map_err(|e| FetchError::Rendering(format!("invalid endpoint {}: {}", self.endpoint, e)))
    }
}

#[async_trait]
impl PageFetcher for RenderingFetcher {
    fn name(&self) -> &str {
        "managed rendering"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let request_url = self.request_url(url)?;

        // Strip URLs from errors: the request URL carries the API key.
        let response = self
            .client
            .get_with_timeout(request_url.as_str(), self.options.timeout)
            .await
            .map_err(|e| FetchError::Rendering(e.without_url().to_string()))?;

        let status = response.status.as_u16();
        match status {
            200..=299 => response
                .text()
                .await
                .map_err(|e| FetchError::Rendering(e.without_url().to_string())),
            401 | 403 => Err(FetchError::Rendering(format!(
                "credential rejected (HTTP {})",
                status
            ))),
            429 => Err(FetchError::Rendering("quota exhausted (HTTP 429)".to_string())),
            _ => Err(FetchError::Rendering(format!(
                "HTTP {} rendering {}",
                status, url
            ))),
        }
    }
}
