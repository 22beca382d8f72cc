use super::check_status;
use crate::error::ClientError;
use crate::models::meteorological::FeedPayload;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Client for the INMET active-warnings feed.
#[derive(Clone)]
pub struct InmetClient {
    client: Client,
    feed_url: String,
}

impl InmetClient {
    pub fn new(client: Client, feed_url: &str) -> Self {
        Self {
            client,
            feed_url: feed_url.to_string(),
        }
    }

    pub async fn fetch_feed(&self) -> Result<FeedPayload, ClientError> {
        let response = self.client.get(&self.feed_url).send().await?;
        let body: Value = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        let payload = FeedPayload::from_value(body);
        debug!("INMET feed returned {} records", payload.len());
        Ok(payload)
    }
}
