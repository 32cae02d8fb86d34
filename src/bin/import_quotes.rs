//! CLI tool to bulk-load quotes from a JSON file
//!
//! The file holds an array of `{"text", "author", "authorLink"?}` objects.
//! Quotes whose text is already stored are skipped.
//!
//! Usage:
//!   cargo run --bin import_quotes -- quotes.json

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use validator::Validate;

use quotes_api::api::quotes::CreateQuoteRequest;
use quotes_api::config::{create_dynamodb_client, Settings};
use quotes_api::db::{DynamoDbStore, NewQuote, QuoteError, QuoteRepository};

/// Import quotes into the DynamoDB quote table
#[derive(Parser, Debug)]
#[command(name = "import_quotes")]
#[command(about = "Import quotes from a JSON array file, skipping duplicates")]
struct Args {
    /// JSON file containing an array of quotes
    file: PathBuf,

    /// DynamoDB endpoint URL (for local development)
    #[arg(long)]
    endpoint_url: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ImportSummary {
    inserted: usize,
    duplicates: usize,
    invalid: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load()?;
    if let Some(url) = args.endpoint_url {
        settings.dynamodb_endpoint_url = Some(url);
    }

    let quotes = read_quotes(&args.file)?;
    println!("Read {} quotes from {}", quotes.len(), args.file.display());

    let settings = Arc::new(settings);
    let client = create_dynamodb_client(&settings).await;
    let repository = QuoteRepository::new(Arc::new(DynamoDbStore::new(settings, client)));

    let summary = import(&repository, quotes).await?;

    println!(
        "\nImport complete: {} inserted, {} duplicates skipped, {} invalid skipped\n",
        summary.inserted, summary.duplicates, summary.invalid
    );

    Ok(())
}

fn read_quotes(path: &Path) -> Result<Vec<CreateQuoteRequest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Insert each quote in order. Store failures abort the import.
async fn import(
    repository: &QuoteRepository,
    quotes: Vec<CreateQuoteRequest>,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();

    for (index, quote) in quotes.into_iter().enumerate() {
        if let Err(e) = quote.validate() {
            println!("Skipping entry {}: {}", index, e);
            summary.invalid += 1;
            continue;
        }

        let new_quote = NewQuote::new(&quote.text, &quote.author, quote.author_link.as_deref());
        match repository.insert(new_quote).await {
            Ok(_) => summary.inserted += 1,
            Err(QuoteError::Duplicate) => summary.duplicates += 1,
            Err(e) => return Err(e).with_context(|| format!("Failed to insert entry {}", index)),
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotes_api::db::{MemoryStore, QuoteFilter};
    use std::io::Write;

    #[tokio::test]
    async fn test_import_skips_duplicates_and_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"text": "Simplicity is prerequisite for reliability.", "author": "Edsger Dijkstra"}},
                {{"text": "  Simplicity is prerequisite for reliability.  ", "author": "E. W. Dijkstra"}},
                {{"text": "Talk is cheap. Show me the code.", "author": "Linus Torvalds", "authorLink": "https://example.com/linus"}},
                {{"text": "   ", "author": "Nobody"}}
            ]"#
        )
        .unwrap();

        let quotes = read_quotes(file.path()).unwrap();
        assert_eq!(quotes.len(), 4);

        let repository = QuoteRepository::new(Arc::new(MemoryStore::new()));
        let summary = import(&repository, quotes).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                inserted: 2,
                duplicates: 1,
                invalid: 1,
            }
        );
        assert_eq!(repository.list(&QuoteFilter::default()).await.unwrap().len(), 2);
    }

    #[test]
    fn test_read_rejects_non_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"text": "x"}}"#).unwrap();

        assert!(read_quotes(file.path()).is_err());
    }
}
