// Upstream feed access: the HTTP client and the XML document parser
pub mod document;
pub mod feed;

// Re-export common types
pub use document::{parse_document, FeedDocument, RawRow};
pub use feed::{FeedClient, FeedClientConfig, FeedError};

pub type Result<T> = std::result::Result<T, FeedError>;
