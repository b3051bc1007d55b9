//! Fetch strategy resolution.
//!
//! A page is fetched through the managed rendering service first when the
//! source needs script execution and a rendering credential is configured.
//! Any failure there falls back to one direct fetch of the same URL. There
//! is no retry loop beyond that single fallback.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::http_client::HttpClient;

/// Errors from fetching a page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Rendering service error: {0}")]
    Rendering(String),

    #[error("Rendering service not configured")]
    NotConfigured,

    #[error("All fetch strategies failed for {url} (rendered: {rendered}; direct: {direct})")]
    Exhausted {
        url: String,
        rendered: String,
        direct: String,
    },
}

/// How a page was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Managed rendering service with script execution.
    Rendered,
    /// Plain GET without rendering.
    Direct,
}

impl FetchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rendered => "rendered",
            Self::Direct => "direct",
        }
    }
}

/// Raw markup for a URL along with the strategy that produced it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub html: String,
    pub strategy: FetchStrategy,
}

/// Something that can turn a URL into raw markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &str;

    /// Fetch the markup of `url`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain unrendered GET with a browser-like user agent.
pub struct DirectFetcher {
    client: HttpClient,
}

impl DirectFetcher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for DirectFetcher {
    fn name(&self) -> &str {
        "direct"
    }

    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).await?;
        if !response.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Two-tier fetch: rendered first when asked for and available, direct otherwise.
#[derive(Clone)]
pub struct FetchStrategyResolver {
    rendered: Option<Arc<dyn PageFetcher>>,
    direct: Arc<dyn PageFetcher>,
}

impl FetchStrategyResolver {
    /// Resolver without a rendering credential; every fetch is direct.
    pub fn direct_only(direct: Arc<dyn PageFetcher>) -> Self {
        Self {
            rendered: None,
            direct,
        }
    }

    /// Resolver with both strategies available.
    pub fn with_rendering(rendered: Arc<dyn PageFetcher>, direct: Arc<dyn PageFetcher>) -> Self {
        Self {
            rendered: Some(rendered),
            direct,
        }
    }

    /// Whether a rendering fetcher is configured.
    pub fn has_rendering(&self) -> bool {
        self.rendered.is_some()
    }

    /// Fetch `url`, falling back to a direct fetch if the rendered one fails.
    pub async fn fetch(
        &self,
        url: &str,
        requires_rendered_fetch: bool,
    ) -> Result<FetchedPage, FetchError> {
        let rendered = match (&self.rendered, requires_rendered_fetch) {
            (Some(rendered), true) => rendered,
            _ => {
                debug!("Direct fetch: {}", url);
                let html = self.direct.fetch(url).await?;
                return Ok(FetchedPage {
                    url: url.to_string(),
                    html,
                    strategy: FetchStrategy::Direct,
                });
            }
        };

        info!("Fetching {} via {}", url, rendered.name());
        let rendered_err = match rendered.fetch(url).await {
            Ok(html) => {
                return Ok(FetchedPage {
                    url: url.to_string(),
                    html,
                    strategy: FetchStrategy::Rendered,
                });
            }
            Err(e) => e,
        };

        warn!(
            "{} failed for {}: {}; falling back to direct fetch",
            rendered.name(),
            url,
            rendered_err
        );

        match self.direct.fetch(url).await {
            Ok(html) => Ok(FetchedPage {
                url: url.to_string(),
                html,
                strategy: FetchStrategy::Direct,
            }),
            Err(direct_err) => Err(FetchError::Exhausted {
                url: url.to_string(),
                rendered: rendered_err.to_string(),
                direct: direct_err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeFetcher {
        label: &'static str,
        result: Result<&'static str, u16>,
        calls: AtomicUsize,
    }

    impl FakeFetcher {
        fn ok(label: &'static str, html: &'static str) -> Arc<Self> {
            Arc::new(Self {
                label,
                result: Ok(html),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(label: &'static str, status: u16) -> Arc<Self> {
            Arc::new(Self {
                label,
                result: Err(status),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        fn name(&self) -> &str {
            self.label
        }

        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.result {
                Ok(html) => Ok(html.to_string()),
                Err(401) => Err(FetchError::Rendering("invalid api key".to_string())),
                Err(status) => Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
            }
        }
    }

    #[tokio::test]
    async fn uses_rendered_fetch_when_required() {
        let rendered = FakeFetcher::ok("rendered", "<p>rendered</p>");
        let direct = FakeFetcher::ok("direct", "<p>direct</p>");
        let resolver = FetchStrategyResolver::with_rendering(rendered.clone(), direct.clone());

        let page = resolver.fetch("https://example.com", true).await.unwrap();
        assert_eq!(page.strategy, FetchStrategy::Rendered);
        assert_eq!(page.html, "<p>rendered</p>");
        assert_eq!(direct.calls(), 0);
    }

    #[tokio::test]
    async fn skips_rendering_when_source_does_not_need_it() {
        let rendered = FakeFetcher::ok("rendered", "<p>rendered</p>");
        let direct = FakeFetcher::ok("direct", "<p>direct</p>");
        let resolver = FetchStrategyResolver::with_rendering(rendered.clone(), direct.clone());

        let page = resolver.fetch("https://example.com", false).await.unwrap();
        assert_eq!(page.strategy, FetchStrategy::Direct);
        assert_eq!(rendered.calls(), 0);
    }

    #[tokio::test]
    async fn auth_failure_falls_back_to_direct() {
        let rendered = FakeFetcher::failing("rendered", 401);
        let direct = FakeFetcher::ok("direct", "<p>direct</p>");
        let resolver = FetchStrategyResolver::with_rendering(rendered.clone(), direct.clone());

        let page = resolver.fetch("https://example.com", true).await.unwrap();
        assert_eq!(page.strategy, FetchStrategy::Direct);
        assert_eq!(page.html, "<p>direct</p>");
        assert_eq!(rendered.calls(), 1);
        assert_eq!(direct.calls(), 1);
    }

    #[tokio::test]
    async fn both_failures_surface_exhausted() {
        let rendered = FakeFetcher::failing("rendered", 500);
        let direct = FakeFetcher::failing("direct", 403);
        let resolver = FetchStrategyResolver::with_rendering(rendered, direct.clone());

        let err = resolver.fetch("https://example.com", true).await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { .. }));
        assert!(err.to_string().contains("403"));
        assert_eq!(direct.calls(), 1);
    }

    #[tokio::test]
    async fn direct_only_never_renders() {
        let direct = FakeFetcher::failing("direct", 404);
        let resolver = FetchStrategyResolver::direct_only(direct.clone());
        assert!(!resolver.has_rendering());

        let err = resolver.fetch("https://example.com", true).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
        assert_eq!(direct.calls(), 1);
    }
}
