use super::{LookupError, LookupService};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Short article summaries from a MediaWiki action API
#[derive(Clone)]
pub struct WikipediaClient {
    client: Client,
    api_url: String,
}

impl WikipediaClient {
    pub fn new(client: Client, api_url: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
        }
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value, LookupError> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| LookupError::Provider(format!("Lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LookupError::Provider(format!(
                "Lookup request failed: HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::Provider(format!("Malformed lookup response: {}", e)))
    }

    /// Title of the best search hit for `query`
    async fn best_title(&self, query: &str) -> Result<String, LookupError> {
        let data = self
            .query(&[("list", "search"), ("srsearch", query), ("srlimit", "1"), ("srprop", "")])
            .await?;

        data.pointer("/query/search/0/title")
            .and_then(|t| t.as_str())
            .map(|t| t.to_string())
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl LookupService for WikipediaClient {
    async fn summarize(&self, query: &str, max_sentences: u32) -> Result<String, LookupError> {
        let title = self.best_title(query).await?;
        debug!("Looking up article '{}'", title);

        let sentences = max_sentences.to_string();
        let data = self
            .query(&[
                ("prop", "extracts|pageprops"),
                ("explaintext", "1"),
                ("exintro", "1"),
                ("exsentences", &sentences),
                ("redirects", "1"),
                ("titles", &title),
            ])
            .await?;

        let page = data
            .pointer("/query/pages/0")
            .ok_or(LookupError::NotFound)?;

        if page.get("missing").is_some() {
            return Err(LookupError::NotFound);
        }

        if page.pointer("/pageprops/disambiguation").is_some() {
            return Err(LookupError::Ambiguous(title));
        }

        page.get("extract")
            .and_then(|e| e.as_str())
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or(LookupError::NotFound)
    }
}
