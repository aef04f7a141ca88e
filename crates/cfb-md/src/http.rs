//! HTTP JSON provider.
//!
//! `GET <base_url>/<category>` must return the same JSON array shape the
//! snapshot files use. Intended for a scraper sidecar that serves its latest
//! results; no retries here, a failed request is a failed fetch.

use cfb_schemas::{Category, RawRecord};

use crate::provider::{decode_records, Provider, ProviderError};

#[derive(Debug, Clone)]
pub struct HttpJsonProvider {
    tag: String,
    http: reqwest::Client,
    base_url: String,
}

impl HttpJsonProvider {
    pub fn new(tag: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url_for(&self, category: Category) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), category.as_str())
    }
}

#[async_trait::async_trait]
impl Provider for HttpJsonProvider {
    fn tag(&self) -> &str {
        &self.tag
    }

    async fn fetch(&self, category: Category) -> Result<Vec<RawRecord>, ProviderError> {
        let resp = self
            .http
            .get(self.url_for(category))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).trim().to_string();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        decode_records(category, &body)
    }
}

// -----------------
// Tests (local mock server)
// -----------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn url_joins_without_double_slash() {
        let p = HttpJsonProvider::new("on3", "http://scraper.local/on3/");
        assert_eq!(p.url_for(Category::Portal), "http://scraper.local/on3/portal");
    }

    #[tokio::test]
    async fn fetches_and_decodes_recruits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/recruits");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(r#"[{"name": "John Smith", "position": "QB", "stars": 3}]"#);
            })
            .await;

        let p = HttpJsonProvider::new("on3", server.base_url());
        let recs = p.fetch(Category::Recruits).await.unwrap();

        mock.assert_async().await;
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category(), Category::Recruits);
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/portal");
                then.status(503).body("scrape in progress");
            })
            .await;

        let p = HttpJsonProvider::new("on3", server.base_url());
        let err = p.fetch(Category::Portal).await.unwrap_err();
        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "scrape in progress");
            }
            other => panic!("expected Api error, got {other}"),
        }
    }
}
