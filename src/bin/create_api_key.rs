//! CLI tool to issue an API key
//!
//! Usage:
//!   cargo run --bin create_api_key
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8001 cargo run --bin create_api_key

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

use quotes_api::config::{create_dynamodb_client, Settings};
use quotes_api::db::{ApiKeyRepository, DynamoDbStore};
use quotes_api::services::ApiKeyGenerator;

/// Issue a new API key in the DynamoDB key registry
#[derive(Parser, Debug)]
#[command(name = "create_api_key")]
#[command(about = "Issue a new API key in the DynamoDB key registry")]
struct Args {
    /// DynamoDB table holding API keys (overrides DYNAMODB_API_KEYS_TABLE)
    #[arg(long)]
    table_name: Option<String>,

    /// DynamoDB endpoint URL (for local development)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Random bytes per key (overrides API_KEY_BYTES)
    #[arg(long)]
    key_bytes: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load()?;
    if let Some(table_name) = args.table_name {
        settings.dynamodb_api_keys_table = table_name;
    }
    if let Some(url) = args.endpoint_url {
        settings.dynamodb_endpoint_url = Some(url);
    }
    if let Some(key_bytes) = args.key_bytes {
        settings.api_key_bytes = key_bytes;
    }
    settings.validate()?;

    let settings = Arc::new(settings);
    let client = create_dynamodb_client(&settings).await;
    let store = Arc::new(DynamoDbStore::new(settings.clone(), client));
    let registry = ApiKeyRepository::new(store, ApiKeyGenerator::new(settings.api_key_bytes));

    let issued = registry.issue().await?;

    println!("\nAPI key created successfully!\n");
    println!("API Key:    {}", issued.key);
    println!("Key ID:     {}", issued.id);
    println!("Created at: {}", issued.created_at.to_rfc3339());
    println!("\nUse this key with:");
    println!("  curl -H \"x-api-key: {}\" http://{}/api/quotes/random", issued.key, settings.server_addr());

    Ok(())
}
