//! Database module
//!
//! Contains the document store abstraction, its DynamoDB and in-memory
//! backends, and the repositories built on top of it.

pub mod dynamodb;
pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use dynamodb::DynamoDbStore;
pub use memory::MemoryStore;
pub use models::{ApiKey, ApiUsage, NewQuote, Quote, QuoteFilter, QuoteStats};
pub use repositories::{
    ApiKeyError, ApiKeyRepository, QuoteError, QuoteRepository, UsageError, UsageRepository,
};
pub use store::{DocumentStore, StoreError, StoreResult};
