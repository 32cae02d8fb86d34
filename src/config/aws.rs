//! AWS SDK configuration
//!
//! Builds the DynamoDB client, honouring a custom endpoint for DynamoDB Local.

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion, Region, SdkConfig};
use aws_sdk_dynamodb::Client as DynamoDbSdkClient;

use crate::config::Settings;

/// Build the shared AWS SDK configuration (region + default credential chain)
pub async fn build_aws_config(settings: &Settings) -> SdkConfig {
    let region_provider = RegionProviderChain::first_try(Region::new(settings.aws_region.clone()))
        .or_default_provider();

    aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await
}

/// Create a DynamoDB client from settings.
///
/// When `DYNAMODB_ENDPOINT_URL` is set the client talks to that endpoint
/// instead of the regional service.
pub async fn create_dynamodb_client(settings: &Settings) -> DynamoDbSdkClient {
    let sdk_config = build_aws_config(settings).await;

    match &settings.dynamodb_endpoint_url {
        Some(endpoint_url) => {
            tracing::info!(endpoint = %endpoint_url, "Using custom DynamoDB endpoint");

            let dynamodb_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config)
                .endpoint_url(endpoint_url)
                .build();
            DynamoDbSdkClient::from_conf(dynamodb_config)
        }
        None => DynamoDbSdkClient::new(&sdk_config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_region_from_settings() {
        let settings = Settings {
            aws_region: "eu-west-1".to_string(),
            ..Settings::default()
        };
        let config = build_aws_config(&settings).await;

        assert_eq!(config.region().map(|r| r.as_ref()), Some("eu-west-1"));
    }

    #[tokio::test]
    async fn test_custom_endpoint_client() {
        let settings = Settings {
            dynamodb_endpoint_url: Some("http://localhost:8001".to_string()),
            ..Settings::default()
        };
        let client = create_dynamodb_client(&settings).await;

        assert_eq!(client.config().region().map(|r| r.as_ref()), Some("us-east-1"));
    }
}
