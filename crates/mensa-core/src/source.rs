use crate::{models::MealRecord, Result};

/// Anything that can produce the current meal plan.
///
/// The live implementation is `FeedProvider`; tests swap in mocks so the
/// cache and service logic can be exercised without a network.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MealSource: Send + Sync {
    async fn fetch_meals(&self) -> Result<Vec<MealRecord>>;
}
