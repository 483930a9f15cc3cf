//! In-memory book store
//!
//! Mirrors the PostgreSQL store's semantics (ISBN upsert on insert,
//! `NotFound` on update/delete of a missing id) without a database. Used by
//! tests and by `cloudlib serve --in-memory`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::BookStore;
use crate::book::{Book, BookFilters};
use crate::error::{LibraryError, Result};

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Book>,
    last_id: i64,
}

/// Book store backed by a `BTreeMap`
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    table: RwLock<Table>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored books
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn store(&self, mut book: Book) -> Result<Book> {
        let mut table = self.table.write().await;

        if book.is_new() {
            let existing = table
                .rows
                .values()
                .find(|b| b.isbn == book.isbn)
                .map(|b| (b.id, b.added_date));

            match existing {
                Some((id, added_date)) => {
                    book.id = id;
                    book.added_date = book.added_date.or(added_date);
                }
                None => {
                    table.last_id += 1;
                    book.id = table.last_id;
                    book.added_date = book.added_date.or_else(|| Some(Utc::now()));
                }
            }
        } else {
            let current = table
                .rows
                .get(&book.id)
                .ok_or_else(|| LibraryError::not_found(book.id))?;
            book.added_date = book.added_date.or(current.added_date);

            if table
                .rows
                .values()
                .any(|b| b.id != book.id && b.isbn == book.isbn)
            {
                return Err(LibraryError::storage(format!(
                    "isbn {} already belongs to another book",
                    book.isbn
                )));
            }
        }

        table.rows.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get(&self, id: i64) -> Result<Book> {
        self.table
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| LibraryError::not_found(id))
    }

    async fn delete(&self, book: &Book) -> Result<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&book.id)
            .map(|_| ())
            .ok_or_else(|| LibraryError::not_found(book.id))
    }

    async fn list(&self, filters: &BookFilters) -> Result<Vec<Book>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .filter(|b| filters.matches(b))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(isbn: &str, title: &str) -> Book {
        Book {
            id: 0,
            isbn: isbn.into(),
            title: title.into(),
            lang: "english".into(),
            translator: String::new(),
            authors: vec!["Ursula K. Le Guin".into()],
            pages: 300,
            publisher: "Ace".into(),
            published_date: None,
            added_date: None,
        }
    }

    #[tokio::test]
    async fn insert_assigns_ids_and_added_date() {
        let store = MemoryBookStore::new();
        let a = store.store(book("111", "A Wizard of Earthsea")).await.unwrap();
        let b = store.store(book("222", "The Dispossessed")).await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(a.added_date.is_some());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn insert_with_known_isbn_upserts() {
        let store = MemoryBookStore::new();
        let first = store.store(book("111", "Draft title")).await.unwrap();
        let second = store.store(book("111", "Final title")).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get(first.id).await.unwrap().title, "Final title");
    }

    #[tokio::test]
    async fn update_of_missing_id_is_not_found() {
        let store = MemoryBookStore::new();
        let mut ghost = book("333", "Ghost");
        ghost.id = 42;

        let err = store.store(ghost).await.unwrap_err();
        assert_eq!(err, LibraryError::not_found(42));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_keeps_added_date_when_omitted() {
        let store = MemoryBookStore::new();
        let stored = store.store(book("111", "Draft title")).await.unwrap();
        assert!(stored.added_date.is_some());

        let mut edit = stored.clone();
        edit.title = "Final title".into();
        edit.added_date = None;
        let updated = store.store(edit).await.unwrap();

        assert_eq!(updated.added_date, stored.added_date);
        let fetched = store.get(stored.id).await.unwrap();
        assert_eq!(fetched.added_date, stored.added_date);
        assert_eq!(fetched.title, "Final title");
    }

    #[tokio::test]
    async fn update_to_taken_isbn_is_rejected() {
        let store = MemoryBookStore::new();
        store.store(book("111", "Earthsea")).await.unwrap();
        let other = store.store(book("222", "Dispossessed")).await.unwrap();

        let mut clash = other.clone();
        clash.isbn = "111".into();
        let err = store.store(clash).await.unwrap_err();

        assert!(matches!(err, LibraryError::StorageFailure { .. }));
        assert_eq!(store.get(other.id).await.unwrap().isbn, "222");
    }

    #[tokio::test]
    async fn delete_and_get() {
        let store = MemoryBookStore::new();
        let stored = store.store(book("111", "Lathe of Heaven")).await.unwrap();

        store.delete(&stored).await.unwrap();
        assert!(store.get(stored.id).await.unwrap_err().is_not_found());
        assert!(store.delete(&stored).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn list_applies_filters_in_id_order() {
        let store = MemoryBookStore::new();
        store.store(book("111", "The Left Hand of Darkness")).await.unwrap();
        store.store(book("222", "The Dispossessed")).await.unwrap();
        store.store(book("333", "Left Behind")).await.unwrap();

        let filters = BookFilters {
            title: Some("left".into()),
            ..Default::default()
        };
        let titles: Vec<_> = store
            .list(&filters)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();

        assert_eq!(titles, vec!["The Left Hand of Darkness", "Left Behind"]);
    }
}
