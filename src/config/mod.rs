//! Configuration management module
//!
//! Loads and validates application configuration from environment variables
//! and `.env` files, and builds the AWS clients derived from it.

pub mod aws;
pub mod settings;

pub use aws::{build_aws_config, create_dynamodb_client};
pub use settings::{Environment, LogFormat, Settings, StoreBackend};
