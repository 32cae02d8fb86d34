//! Services module
//!
//! Key generation and best-effort usage tracking.

pub mod key_generator;
pub mod usage_tracker;

pub use key_generator::ApiKeyGenerator;
pub use usage_tracker::UsageTracker;
