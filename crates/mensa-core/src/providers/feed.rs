// Feed provider - fetches the upstream document and builds meal records
use async_trait::async_trait;
use mensa_api::{FeedClient, FeedClientConfig};
use tracing::info;

use crate::{
    config::Config, models::MealRecord, record::RecordBuilder, source::MealSource, Result,
};

/// Wrapper around FeedClient that implements MealSource
pub struct FeedProvider {
    client: FeedClient,
    builder: RecordBuilder,
}

impl FeedProvider {
    pub fn new(client: FeedClient, builder: RecordBuilder) -> Self {
        Self { client, builder }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = FeedClient::new(FeedClientConfig {
            url: config.feed.url.clone(),
            timeout: config.feed.timeout(),
            user_agent: config.feed.user_agent.clone(),
        })?;
        let builder = RecordBuilder::new(config.locations.allowed.iter().cloned());

        Ok(Self::new(client, builder))
    }
}

#[async_trait]
impl MealSource for FeedProvider {
    async fn fetch_meals(&self) -> Result<Vec<MealRecord>> {
        let document = self.client.fetch_document().await?;
        let meals = self.builder.build_all(&document.rows);

        info!(
            "Loaded {} meals for {} locations from {}",
            meals.len(),
            self.builder.allowed_locations().len(),
            self.client.url()
        );
        Ok(meals)
    }
}
