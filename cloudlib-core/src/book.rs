//! Book records and list filters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A book as stored in the library.
///
/// An `id` of 0 means the book has not been persisted yet: storing it
/// inserts a new row. Any other id updates the existing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Book {
    #[serde(default)]
    pub id: i64,
    pub isbn: String,
    pub title: String,
    pub lang: String,
    #[serde(default)]
    pub translator: String,
    #[serde(default)]
    pub authors: Vec<String>,
    pub pages: i32,
    pub publisher: String,
    #[serde(default)]
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub added_date: Option<DateTime<Utc>>,
}

impl Book {
    /// True if storing this book inserts rather than updates
    pub fn is_new(&self) -> bool {
        self.id == 0
    }
}

/// Filters for listing books.
///
/// Text filters are case-insensitive substring matches. `author` matches a
/// book if any of its authors contains the value. Unset filters match all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookFilters {
    pub id: Option<i64>,
    pub isbn: Option<String>,
    pub title: Option<String>,
    pub lang: Option<String>,
    pub translator: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
}

impl BookFilters {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check a book against every set filter
    pub fn matches(&self, book: &Book) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) => haystack.to_lowercase().contains(&n.to_lowercase()),
                None => true,
            }
        }

        if let Some(id) = self.id {
            if book.id != id {
                return false;
            }
        }

        let author_ok = match &self.author {
            Some(_) => book.authors.iter().any(|a| contains(a, &self.author)),
            None => true,
        };

        author_ok
            && contains(&book.isbn, &self.isbn)
            && contains(&book.title, &self.title)
            && contains(&book.lang, &self.lang)
            && contains(&book.translator, &self.translator)
            && contains(&book.publisher, &self.publisher)
    }
}
