//! Repository pattern implementations
//!
//! Domain operations over the document store collections.

pub mod api_key;
pub mod quote;
pub mod usage;

pub use api_key::{ApiKeyError, ApiKeyRepository};
pub use quote::{QuoteError, QuoteRepository};
pub use usage::{UsageError, UsageRepository};
