//! Stored data models
//!
//! This module defines the documents kept in the three collections
//! (quotes, API keys, usage) and their DynamoDB item mappings.

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A stored quote.
///
/// Stored in the quotes table with `id` as partition key. The text is
/// unique across the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Quote identifier (UUID v4)
    pub id: String,

    /// The quote itself
    pub text: String,

    /// Who said it
    pub author: String,

    /// Optional link to the author's source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_link: Option<String>,
}

impl Quote {
    /// Build a new quote with a fresh identifier
    pub fn new(new_quote: NewQuote) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            text: new_quote.text,
            author: new_quote.author,
            author_link: new_quote.author_link,
        }
    }

    /// Convert to DynamoDB item
    pub fn to_dynamodb(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S(self.id.clone()));
        item.insert("text".to_string(), AttributeValue::S(self.text.clone()));
        item.insert("author".to_string(), AttributeValue::S(self.author.clone()));

        if let Some(ref link) = self.author_link {
            item.insert("author_link".to_string(), AttributeValue::S(link.clone()));
        }

        item
    }

    /// Parse from DynamoDB item
    pub fn from_dynamodb(item: &HashMap<String, AttributeValue>) -> Option<Self> {
        Some(Self {
            id: get_string(item, "id")?,
            text: get_string(item, "text")?,
            author: get_string(item, "author")?,
            author_link: get_string(item, "author_link"),
        })
    }
}

/// Validated input for a quote insert.
///
/// Text and author are trimmed; an empty author link is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub text: String,
    pub author: String,
    pub author_link: Option<String>,
}

impl NewQuote {
    pub fn new(text: &str, author: &str, author_link: Option<&str>) -> Self {
        Self {
            text: text.trim().to_string(),
            author: author.trim().to_string(),
            author_link: author_link
                .map(str::trim)
                .filter(|link| !link.is_empty())
                .map(str::to_string),
        }
    }
}

/// Filter for listing quotes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    /// Only return quotes by this exact author
    pub author: Option<String>,
}

impl QuoteFilter {
    pub fn by_author(author: impl Into<String>) -> Self {
        Self {
            author: Some(author.into()),
        }
    }

    /// Check whether a quote passes this filter
    pub fn matches(&self, quote: &Quote) -> bool {
        match self.author {
            Some(ref author) => quote.author == *author,
            None => true,
        }
    }
}

/// Aggregate counts over the quote collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub total_quotes: u64,
    pub unique_authors: u64,
}

/// An issued API key.
///
/// Stored in the api_keys table with `api_key` as partition key.
/// Keys are stored and compared in plaintext and never expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    /// Record identifier (UUID v4), used for revocation
    pub id: String,

    /// The opaque key presented by clients
    pub key: String,

    /// When the key was issued
    pub created_at: DateTime<Utc>,
}

impl ApiKey {
    /// Convert to DynamoDB item
    pub fn to_dynamodb(&self) -> HashMap<String, AttributeValue> {
        let mut item = HashMap::new();
        item.insert("api_key".to_string(), AttributeValue::S(self.key.clone()));
        item.insert("id".to_string(), AttributeValue::S(self.id.clone()));
        item.insert(
            "created_at".to_string(),
            AttributeValue::S(self.created_at.to_rfc3339()),
        );
        item
    }

    /// Parse from DynamoDB item
    pub fn from_dynamodb(item: &HashMap<String, AttributeValue>) -> Option<Self> {
        let created_at = get_string(item, "created_at")
            .and_then(|ts| DateTime::parse_from_rfc3339(&ts).ok())
            .map(|ts| ts.with_timezone(&Utc))?;

        Some(Self {
            id: get_string(item, "id")?,
            key: get_string(item, "api_key")?,
            created_at,
        })
    }
}

/// Usage counter for one (key, endpoint, method) triple.
///
/// Stored in the usage table with `usage_id` as partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUsage {
    /// Record identifier (UUID v4), assigned on first use of the triple
    pub id: String,

    /// The API key, by value
    pub key: String,

    /// Request path
    pub endpoint: String,

    /// HTTP verb
    pub method: String,

    /// Number of requests seen for this triple
    pub count: u64,
}

impl ApiUsage {
    /// Composite partition key for the usage table
    pub fn usage_id(key: &str, endpoint: &str, method: &str) -> String {
        format!("{}|{}|{}", key, method, endpoint)
    }

    /// Parse from DynamoDB item
    pub fn from_dynamodb(item: &HashMap<String, AttributeValue>) -> Option<Self> {
        Some(Self {
            id: get_string(item, "id")?,
            key: get_string(item, "api_key")?,
            endpoint: get_string(item, "endpoint")?,
            method: get_string(item, "method")?,
            count: get_number(item, "count").unwrap_or(0),
        })
    }
}

// Helper functions for parsing DynamoDB AttributeValues

pub(crate) fn get_string(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

fn get_number(item: &HashMap<String, AttributeValue>, key: &str) -> Option<u64> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_quote_trims_input() {
        let new_quote = NewQuote::new("  Stay hungry.  ", " Steve Jobs ", Some("  "));
        assert_eq!(new_quote.text, "Stay hungry.");
        assert_eq!(new_quote.author, "Steve Jobs");
        assert_eq!(new_quote.author_link, None);
    }

    #[test]
    fn test_quote_serializes_camel_case() {
        let quote = Quote {
            id: "q1".to_string(),
            text: "A".to_string(),
            author: "B".to_string(),
            author_link: Some("https://example.com".to_string()),
        };

        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["authorLink"], "https://example.com");
        assert!(json.get("author_link").is_none());
    }

    #[test]
    fn test_quote_dynamodb_item_without_link() {
        let quote = Quote::new(NewQuote::new("A", "B", None));
        let item = quote.to_dynamodb();

        assert!(!item.contains_key("author_link"));
        assert_eq!(Quote::from_dynamodb(&item), Some(quote));
    }

    #[test]
    fn test_api_key_from_dynamodb_requires_timestamp() {
        let mut item = HashMap::new();
        item.insert("api_key".to_string(), AttributeValue::S("abc".to_string()));
        item.insert("id".to_string(), AttributeValue::S("id-1".to_string()));
        assert!(ApiKey::from_dynamodb(&item).is_none());

        item.insert(
            "created_at".to_string(),
            AttributeValue::S("2024-01-01T00:00:00+00:00".to_string()),
        );
        let key = ApiKey::from_dynamodb(&item).unwrap();
        assert_eq!(key.key, "abc");
        assert_eq!(key.created_at.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_api_usage_from_dynamodb() {
        let mut item = HashMap::new();
        item.insert("id".to_string(), AttributeValue::S("u1".to_string()));
        item.insert("api_key".to_string(), AttributeValue::S("k".to_string()));
        item.insert("endpoint".to_string(), AttributeValue::S("/api/quotes".to_string()));
        item.insert("method".to_string(), AttributeValue::S("GET".to_string()));
        item.insert("count".to_string(), AttributeValue::N("7".to_string()));

        let usage = ApiUsage::from_dynamodb(&item).unwrap();
        assert_eq!(usage.count, 7);
        assert_eq!(usage.method, "GET");
    }

    #[test]
    fn test_quote_filter_matches_author() {
        let quote = Quote::new(NewQuote::new("A", "B", None));
        assert!(QuoteFilter::default().matches(&quote));
        assert!(QuoteFilter::by_author("B").matches(&quote));
        assert!(!QuoteFilter::by_author("C").matches(&quote));
    }
}
