//! HTTP client shared by the fetch strategies and the places integration.

mod response;

pub use response::HttpResponse;

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

/// Redirects followed before giving up.
const MAX_REDIRECTS: usize = 5;

/// Browser identification sent unless the configuration names another.
///
/// Several directories refuse requests that do not look like a desktop browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Builder for [`HttpClient`].
pub struct HttpClientBuilder {
    service_name: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Replace the default browser user agent.
    pub fn user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    pub fn build(self) -> Result<HttpClient, reqwest::Error> {
        let client = Client::builder()
            .user_agent(self.user_agent.as_deref().unwrap_or(USER_AGENT))
            .timeout(self.timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(HttpClient {
            client,
            service_name: self.service_name,
            timeout: self.timeout,
        })
    }
}

/// Thin reqwest wrapper with request timing logs.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    service_name: String,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a client. `service_name` only labels log lines.
    pub fn builder(service_name: &str, timeout: Duration) -> HttpClientBuilder {
        HttpClientBuilder {
            service_name: service_name.to_string(),
            timeout,
            user_agent: None,
        }
    }

    /// Create a client with the default browser user agent.
    pub fn new(service_name: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::builder(service_name, timeout).build()
    }

    /// Configured request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Make a GET request.
    pub async fn get(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?;
        debug!(
            "[{}] GET {} -> {} in {}ms",
            self.service_name,
            strip_query(url),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
        Ok(HttpResponse::new(response))
    }

    /// Make a GET request with a per-request timeout overriding the client default.
    pub async fn get_with_timeout(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<HttpResponse, reqwest::Error> {
        let start = Instant::now();
        let response = self.client.get(url).timeout(timeout).send().await?;
        debug!(
            "[{}] GET {} -> {} in {}ms",
            self.service_name,
            strip_query(url),
            response.status().as_u16(),
            start.elapsed().as_millis()
        );
        Ok(HttpResponse::new(response))
    }
}

/// Drop the query string so credentials passed as parameters stay out of logs.
fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
