// In-memory caching layer
// Keeps upstream calls down to one per TTL window

pub mod cache;

pub use cache::{CacheGate, CacheSnapshot};
