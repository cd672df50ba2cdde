//! Client for the external suggestion service.
//!
//! The contract is intentionally thin: POST an objective snapshot, get back a
//! JSON list of free-text suggestions. Any non-success status or transport
//! error is a single uniform failure; the caller decides how to surface it.

use crate::atingi;
use anyhow::{anyhow, Result};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::model::Objective;

#[derive(Debug, Clone)]
pub struct SuggestClient {
    endpoint: Url,
    client: Client,
}

impl SuggestClient {
    /// Build a client for the suggestion service at `base_url`; suggestions
    /// are requested from its `/improve` endpoint.
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)?.join("improve")?;

        let client = Client::builder()
            .user_agent(atingi::APP_USER_AGENT)
            .build()?;

        Ok(Self { endpoint, client })
    }

    /// Request improvement suggestions for an objective snapshot.
    #[instrument(skip(self, snapshot), fields(objective_id = %snapshot.id))]
    pub async fn improvements(&self, snapshot: &Objective) -> Result<Vec<String>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(snapshot)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "suggestion service returned {}",
                response.status()
            ));
        }

        let suggestions: Vec<String> = response.json().await?;

        debug!("received {} suggestions", suggestions.len());

        Ok(suggestions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_joined_onto_base_url() {
        let client = SuggestClient::new("http://suggest.internal:9100/").unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "http://suggest.internal:9100/improve"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(SuggestClient::new("not a url").is_err());
    }
}
