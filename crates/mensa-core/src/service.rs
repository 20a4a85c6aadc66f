// Meal plan service - the cache gate in front of the feed
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use mensa_cache::CacheGate;
use tracing::debug;

use crate::{
    config::Config, models::MealRecord, providers::FeedProvider, source::MealSource, Error,
    Result,
};

/// Serves the meal plan, refetching at most once per TTL window.
///
/// Cheap to share behind an `Arc`. Concurrent callers that all see an
/// expired cache wait for a single refresh instead of each hitting the feed,
/// and all of them get its error if that refresh fails.
pub struct MealService {
    source: Box<dyn MealSource>,
    cache: CacheGate<Vec<MealRecord>, Error>,
}

impl MealService {
    pub fn new(source: Box<dyn MealSource>, ttl: Duration) -> Self {
        Self {
            source,
            cache: CacheGate::new(ttl),
        }
    }

    /// Live service reading the configured feed
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let provider = FeedProvider::from_config(config)?;
        Ok(Self::new(Box::new(provider), config.cache.ttl()))
    }

    /// Cached meals if still fresh at `now`, otherwise fetch and cache.
    /// A failed fetch leaves the cache as it was and returns the error.
    pub async fn get_or_refresh(&self, now: DateTime<Utc>) -> Result<Arc<Vec<MealRecord>>> {
        let meals = self
            .cache
            .get_or_refresh(now, || self.source.fetch_meals())
            .await?;
        debug!("Serving {} meals", meals.len());
        Ok(meals)
    }

    pub async fn meals(&self) -> Result<Arc<Vec<MealRecord>>> {
        self.get_or_refresh(Utc::now()).await
    }

    /// When the cached meal plan was fetched, if there is one
    pub async fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.cache.snapshot().await.map(|s| s.fetched_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Nutrition, Price};
    use crate::source::MockMealSource;
    use mockall::Sequence;

    fn meal(name: &str) -> MealRecord {
        MealRecord {
            date: "20.10.2026".to_string(),
            location: "Hauptmensa".to_string(),
            name: name.to_string(),
            price: Price {
                student: "2.50".to_string(),
                employee: "3.80".to_string(),
                guest: "5.00".to_string(),
            },
            nutrition: Nutrition::default(),
            allergens: Vec::new(),
            co2_rating: String::new(),
            co2_value: 0.0,
            is_climate_friendly: false,
        }
    }

    #[tokio::test]
    async fn test_second_call_within_ttl_is_served_from_cache() {
        let mut source = MockMealSource::new();
        source
            .expect_fetch_meals()
            .times(1)
            .returning(|| Ok(vec![meal("Chili sin Carne")]));

        let service = MealService::new(Box::new(source), Duration::hours(1));
        let t0 = Utc::now();

        let first = service.get_or_refresh(t0).await.unwrap();
        let second = service
            .get_or_refresh(t0 + Duration::minutes(30))
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.last_fetched().await, Some(t0));
    }

    #[tokio::test]
    async fn test_expired_cache_fetches_again() {
        let mut source = MockMealSource::new();
        let mut seq = Sequence::new();
        source
            .expect_fetch_meals()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![meal("Montag")]));
        source
            .expect_fetch_meals()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![meal("Dienstag")]));

        let service = MealService::new(Box::new(source), Duration::hours(1));
        let t0 = Utc::now();

        service.get_or_refresh(t0).await.unwrap();
        let meals = service
            .get_or_refresh(t0 + Duration::minutes(61))
            .await
            .unwrap();

        assert_eq!(meals[0].name, "Dienstag");
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_meals() {
        let mut source = MockMealSource::new();
        let mut seq = Sequence::new();
        source
            .expect_fetch_meals()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(vec![meal("Bewährt")]));
        source
            .expect_fetch_meals()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(Error::FetchError("Request timed out after 10s".into())));

        let service = MealService::new(Box::new(source), Duration::hours(1));
        let t0 = Utc::now();

        service.get_or_refresh(t0).await.unwrap();
        let err = service
            .get_or_refresh(t0 + Duration::hours(2))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FetchError(_)));
        assert_eq!(service.last_fetched().await, Some(t0));
    }

    #[tokio::test]
    async fn test_cold_failure_propagates() {
        let mut source = MockMealSource::new();
        source
            .expect_fetch_meals()
            .times(1)
            .returning(|| Err(Error::ParseError("document has no root element".into())));

        let service = MealService::new(Box::new(source), Duration::hours(1));

        let err = service.meals().await.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
        assert_eq!(service.last_fetched().await, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_fetch() {
        let mut source = MockMealSource::new();
        source.expect_fetch_meals().times(1).returning(|| {
            // Long enough for every caller to queue up behind the refresh
            std::thread::sleep(std::time::Duration::from_millis(50));
            Ok(vec![meal("Eintopf")])
        });

        let service = Arc::new(MealService::new(Box::new(source), Duration::hours(1)));
        let now = Utc::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.get_or_refresh(now).await.unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().len(), 1);
        }
    }
}
