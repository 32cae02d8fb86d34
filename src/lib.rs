//! Quotes API library
//!
//! Quote storage and retrieval over HTTP, with API-key gated access and
//! per-key usage accounting.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod services;
pub mod utils;

pub use config::Settings;
pub use error::ApiError;
pub use server::{App, AppState};
