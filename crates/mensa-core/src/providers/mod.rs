// Provider implementations - bridge the feed client with the MealSource trait
pub mod feed;

pub use feed::FeedProvider;
