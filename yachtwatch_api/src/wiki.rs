//! Client for the Wikipedia action API.
//!
//! Three operations are used by the enrichment pipeline: full-text search
//! (ranked title/snippet/id triples), the plain-text lead extract of a page,
//! and the raw wikitext of a page for infobox parsing.

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::user_agent::get_user_agent;
use crate::Error;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(5);
const WIKITEXT_TIMEOUT: Duration = Duration::from_secs(8);

/// One ranked search result.
#[derive(Debug, Clone, Deserialize)]
pub struct WikiSearchHit {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(rename = "pageid", default)]
    pub page_id: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<WikiSearchHit>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    #[serde(default)]
    pages: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    #[serde(default)]
    parse: Option<ParsePayload>,
}

#[derive(Debug, Deserialize)]
struct ParsePayload {
    #[serde(default)]
    wikitext: Option<WikitextBody>,
}

#[derive(Debug, Deserialize)]
struct WikitextBody {
    #[serde(rename = "*", default)]
    text: Option<String>,
}

/// Wikipedia action API client.
pub struct WikiClient {
    api_url: String,
    article_base: String,
    http: reqwest::Client,
}

impl WikiClient {
    pub fn new() -> Result<Self, Error> {
        Self::with_base_url("https://en.wikipedia.org")
    }

    /// Creates a client against a custom host. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        let base = base_url.trim_end_matches('/');
        let http = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            api_url: format!("{}/w/api.php", base),
            article_base: format!("{}/wiki/", base),
            http,
        })
    }

    /// Full-text search returning up to `limit` ranked hits.
    pub async fn search(&self, query: &str, limit: u8) -> Result<Vec<WikiSearchHit>, Error> {
        let resp: SearchResponse = self
            .get(
                &[
                    ("action", "query"),
                    ("list", "search"),
                    ("srsearch", query),
                    ("srlimit", &limit.to_string()),
                    ("format", "json"),
                ],
                SEARCH_TIMEOUT,
            )
            .await?;
        Ok(resp.query.map(|q| q.search).unwrap_or_default())
    }

    /// Plain-text lead extract of a page, or `None` if the page has none.
    pub async fn lead_extract(&self, title: &str) -> Result<Option<String>, Error> {
        let resp: ExtractResponse = self
            .get(
                &[
                    ("action", "query"),
                    ("titles", title),
                    ("prop", "extracts"),
                    ("exintro", "true"),
                    ("explaintext", "true"),
                    ("format", "json"),
                ],
                EXTRACT_TIMEOUT,
            )
            .await?;
        let pages = match resp.query {
            Some(q) => q.pages,
            None => return Ok(None),
        };
        let extract = pages
            .values()
            .next()
            .and_then(|page| page.get("extract"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Ok(extract.filter(|s| !s.is_empty()))
    }

    /// Raw wikitext of a page (for infobox parsing), or `None` if absent.
    pub async fn wikitext(&self, title: &str) -> Result<Option<String>, Error> {
        let resp: ParseResponse = self
            .get(
                &[
                    ("action", "parse"),
                    ("page", title),
                    ("prop", "wikitext"),
                    ("format", "json"),
                ],
                WIKITEXT_TIMEOUT,
            )
            .await?;
        Ok(resp
            .parse
            .and_then(|p| p.wikitext)
            .and_then(|w| w.text)
            .filter(|s| !s.is_empty()))
    }

    /// Canonical article URL for a page title.
    pub fn page_url(&self, title: &str) -> String {
        let slug = title.replace(' ', "_");
        match Url::parse(&self.article_base).and_then(|base| base.join(&slug)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.article_base, slug),
        }
    }

    async fn get<T>(&self, params: &[(&str, &str)], timeout: Duration) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = Url::parse_with_params(&self.api_url, params).map_err(|e| {
            tracing::error!("invalid URL constructed: {}", e);
            Error::RequestFailed
        })?;
        let resp = self
            .http
            .get(url)
            .timeout(timeout)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("wikipedia request failed: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::debug!("failed to read wikipedia response body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::BadResponse(e.to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_replaces_spaces() {
        let client = WikiClient::new().unwrap();
        assert_eq!(
            client.page_url("Koru (yacht)"),
            "https://en.wikipedia.org/wiki/Koru_(yacht)"
        );
    }

    #[test]
    fn search_response_parses() {
        let raw = r#"{"query":{"search":[{"title":"Koru (yacht)","snippet":"a <b>sailing yacht</b>","pageid":123}]}}"#;
        let resp: SearchResponse = serde_json::from_str(raw).unwrap();
        let hits = resp.query.unwrap().search;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Koru (yacht)");
        assert_eq!(hits[0].page_id, 123);
    }

    #[test]
    fn wikitext_response_parses_star_key() {
        let raw = r#"{"parse":{"title":"Koru (yacht)","wikitext":{"*":"{{Infobox ship}}"}}}"#;
        let resp: ParseResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            resp.parse.unwrap().wikitext.unwrap().text.as_deref(),
            Some("{{Infobox ship}}")
        );
    }
}
