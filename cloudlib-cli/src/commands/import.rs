//! Bulk import command
//!
//! Reads a JSON array of books and stores them through the batch pipeline,
//! the same path `POST /books` takes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use cloudlib_core::{Book, BookStore, LibraryService};
use cloudlib_server::db::PgBookStore;
use cloudlib_server::models::validate_batch;

use super::{connect, ConfigArgs, PipelineArgs};

/// Arguments for the import command
#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of books
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

/// Parse and validate the import file before touching the database
pub fn read_books(path: &Path) -> Result<Vec<Book>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut books: Vec<Book> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse books from {}", path.display()))?;

    validate_batch(&mut books).context("Invalid book in import file")?;
    Ok(books)
}

/// Store every book in the file, failing if any book failed
pub async fn run_import(args: ImportArgs) -> Result<()> {
    let books = read_books(&args.file)?;
    let total = books.len();

    let mut config = args.config.load()?;
    args.pipeline.apply(&mut config);

    let pool = connect(&config.library).await?;
    let store: Arc<dyn BookStore> = Arc::new(PgBookStore::new(pool.clone()));
    let service = LibraryService::new(Some(store), config.library.pipeline())?;

    let result = service.store_batch(books).await;
    pool.close().await;

    println!("stored {} of {} books", result.successes.len(), total);

    if let Some(err) = result.error {
        for failure in err.failures() {
            println!("  {}", failure);
        }
        bail!("{} of {} books failed to import", err.len(), total);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"isbn":"9789100187934","title":"Pesten","lang":"swedish","pages":254,"publisher":"Albert Bonniers"}}]"#
        )
        .unwrap();

        let books = read_books(file.path()).unwrap();
        assert_eq!(books.len(), 1);
        assert!(books[0].is_new());
    }

    #[test]
    fn normalises_isbns_before_import() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"isbn":"0-306-40615-2","title":"Pesten","lang":"swedish","pages":254,"publisher":"Albert Bonniers"}}]"#
        )
        .unwrap();

        let books = read_books(file.path()).unwrap();
        assert_eq!(books[0].isbn, "0306406152");
    }

    #[test]
    fn rejects_invalid_book() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"isbn":"123","title":"Pesten","lang":"swedish","pages":254,"publisher":"Albert Bonniers"}}]"#
        )
        .unwrap();

        let err = read_books(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("book #0: isbn"));
    }
}
