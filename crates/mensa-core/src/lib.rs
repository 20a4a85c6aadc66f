// Meal plan core - feed rows in, meal records out, cached in between
pub mod config;
pub mod error;
pub mod models;
pub mod nutrition;
pub mod providers;
pub mod record;
pub mod service;
pub mod source;

pub use config::Config;
pub use error::Error;
pub use models::{MealRecord, Nutrition, Price};
pub use nutrition::extract_nutrition;
pub use providers::FeedProvider;
pub use record::{RecordBuilder, RowSkipped};
pub use service::MealService;
pub use source::MealSource;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
