//! Quote repository
//!
//! Listing, random selection, duplicate-checked insert and delete for quotes.

use std::sync::Arc;

use crate::db::models::{NewQuote, Quote, QuoteFilter, QuoteStats};
use crate::db::store::{DocumentStore, StoreError};

/// Repository for quote operations
#[derive(Clone)]
pub struct QuoteRepository {
    store: Arc<dyn DocumentStore>,
}

impl QuoteRepository {
    /// Create a new quote repository
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// List stored quotes, optionally filtered. No ordering guarantee.
    pub async fn list(&self, filter: &QuoteFilter) -> Result<Vec<Quote>, QuoteError> {
        Ok(self.store.find_quotes(filter).await?)
    }

    /// Pick one quote uniformly at random
    pub async fn pick_random(&self) -> Result<Quote, QuoteError> {
        self.store.sample_quote().await?.ok_or(QuoteError::NotFound)
    }

    /// Insert a new quote, rejecting text that is already stored.
    ///
    /// The lookup up front only short-circuits the common case; the store's
    /// uniqueness constraint decides races between concurrent inserts.
    pub async fn insert(&self, new_quote: NewQuote) -> Result<Quote, QuoteError> {
        if self.store.find_quote_by_text(&new_quote.text).await?.is_some() {
            return Err(QuoteError::Duplicate);
        }

        let quote = Quote::new(new_quote);

        match self.store.insert_quote(&quote).await {
            Ok(()) => {
                tracing::info!(quote_id = %quote.id, author = %quote.author, "Quote added");
                Ok(quote)
            }
            Err(StoreError::Conflict(_)) => Err(QuoteError::Duplicate),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a quote by id
    pub async fn delete(&self, id: &str) -> Result<(), QuoteError> {
        if !self.store.delete_quote(id).await? {
            return Err(QuoteError::NotFound);
        }

        tracing::info!(quote_id = %id, "Quote deleted");
        Ok(())
    }

    /// Total quote count and number of distinct authors
    pub async fn stats(&self) -> Result<QuoteStats, QuoteError> {
        let total_quotes = self.store.count_quotes().await?;
        let unique_authors = self.store.count_distinct_authors().await?;

        Ok(QuoteStats {
            total_quotes,
            unique_authors,
        })
    }
}

/// Errors that can occur during quote operations
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("Quote not found")]
    NotFound,

    #[error("A quote with this text already exists")]
    Duplicate,

    #[error(transparent)]
    Store(#[from] StoreError),
}
