//! API endpoint handlers module

pub mod extract;
pub mod health;
pub mod keys;
pub mod metrics;
pub mod quotes;
pub mod stats;
pub mod usage;

use serde::{Deserialize, Serialize};

/// `{"message": ...}` body for successful deletes
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
