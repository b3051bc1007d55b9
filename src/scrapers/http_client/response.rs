//! HTTP response wrapper.

use reqwest::{Response, StatusCode};

/// Status plus the unread body of a response.
pub struct HttpResponse {
    pub status: StatusCode,
    response: Response,
}

impl HttpResponse {
    pub(crate) fn new(response: Response) -> Self {
        Self {
            status: response.status(),
            response,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Read the body as text.
    pub async fn text(self) -> Result<String, reqwest::Error> {
        self.response.text().await
    }
}
