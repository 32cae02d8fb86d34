//! CLI tool to create the DynamoDB tables used by quotes-api
//!
//! Usage:
//!   cargo run --bin setup_tables
//!
//! For local development with DynamoDB Local:
//!   DYNAMODB_ENDPOINT_URL=http://localhost:8001 cargo run --bin setup_tables

use anyhow::Result;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use clap::Parser;
use std::sync::Arc;

use quotes_api::config::{create_dynamodb_client, Settings};
use quotes_api::db::DynamoDbStore;

/// Create the DynamoDB tables for quotes-api
#[derive(Parser, Debug)]
#[command(name = "setup_tables")]
#[command(about = "Create the DynamoDB tables for quotes-api (skips existing tables)")]
struct Args {
    /// DynamoDB endpoint URL (overrides DYNAMODB_ENDPOINT_URL)
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Table name prefix (overrides DYNAMODB_TABLE_PREFIX and per-table names)
    #[arg(long)]
    prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load()?;
    if let Some(ref prefix) = args.prefix {
        settings.apply_table_prefix(prefix);
    }
    if let Some(url) = args.endpoint_url {
        settings.dynamodb_endpoint_url = Some(url);
    }

    if let Some(ref url) = settings.dynamodb_endpoint_url {
        println!("Using DynamoDB endpoint: {}", url);
    }

    let settings = Arc::new(settings);
    let client = create_dynamodb_client(&settings).await;
    let store = DynamoDbStore::new(settings, client);

    println!("\nSetting up DynamoDB tables...\n");

    let mut failures = 0;
    for (table_name, partition_key) in store.table_keys() {
        match create_table(store.client(), table_name, partition_key).await {
            Ok(true) => println!("Created table: {}", table_name),
            Ok(false) => println!("Table already exists: {}", table_name),
            Err(e) => {
                failures += 1;
                println!("Failed to create table {}: {:#}", table_name, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} table(s) could not be created", failures);
    }

    println!("\nTable setup complete!\n");
    Ok(())
}

/// Create a pay-per-request table keyed by one string attribute.
///
/// Returns `false` if the table already exists.
async fn create_table(
    client: &aws_sdk_dynamodb::Client,
    table_name: &str,
    partition_key: &str,
) -> Result<bool> {
    match client.describe_table().table_name(table_name).send().await {
        Ok(_) => return Ok(false),
        Err(e)
            if e
                .as_service_error()
                .map(|se| se.is_resource_not_found_exception())
                .unwrap_or(false) => {}
        Err(e) => {
            anyhow::bail!(
                "Failed to describe {}: {}",
                table_name,
                DisplayErrorContext(e)
            )
        }
    }

    client
        .create_table()
        .table_name(table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(partition_key)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(partition_key)
                .key_type(KeyType::Hash)
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("{}", DisplayErrorContext(e)))?;

    Ok(true)
}
