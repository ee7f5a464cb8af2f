//! Client for the text-rendering proxy that turns tracker detail pages into
//! markdown.
//!
//! Detail pages are heavily scripted; the proxy renders them server-side and
//! returns a plain markdown body that the labeled-field extractors can work
//! on. An empty body or a non-2xx status both mean "no data for this vessel".

use std::time::Duration;

use crate::user_agent::get_user_agent;
use crate::Error;

const RENDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Text-rendering proxy client.
pub struct RenderClient {
    proxy_base: String,
    detail_base: String,
    http: reqwest::Client,
}

impl RenderClient {
    pub fn new() -> Result<Self, Error> {
        Self::with_urls(
            "https://r.jina.ai",
            "https://www.marinetraffic.com/en/ais/details/ships/shipid:",
        )
    }

    /// Creates a client with custom proxy and detail-page URLs. Used for
    /// testing with wiremock.
    pub fn with_urls(proxy_base: &str, detail_base: &str) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(RENDER_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            proxy_base: proxy_base.trim_end_matches('/').to_string(),
            detail_base: detail_base.to_string(),
            http,
        })
    }

    /// The tracker detail-page URL for a site-specific vessel id.
    pub fn detail_url(&self, vessel_id: &str) -> String {
        format!("{}{}", self.detail_base, vessel_id)
    }

    /// Fetches the rendered markdown for a vessel's detail page.
    ///
    /// Returns `None` for an empty rendering; transport failures and non-2xx
    /// statuses are errors the caller is expected to degrade on.
    pub async fn fetch_detail_markdown(&self, vessel_id: &str) -> Result<Option<String>, Error> {
        let url = format!("{}/{}", self.proxy_base, self.detail_url(vessel_id));
        let resp = self
            .http
            .get(&url)
            .header("accept", "text/plain")
            .header("x-return-format", "markdown")
            .header("x-timeout", "15")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("render proxy request failed: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::debug!("failed to read render proxy body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        Ok(if body.trim().is_empty() { None } else { Some(body) })
    }
}
