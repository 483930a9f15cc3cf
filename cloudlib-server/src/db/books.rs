//! PostgreSQL book store
//!
//! - insert: INSERT .. ON CONFLICT (isbn) DO UPDATE (re-importing a book
//!   refreshes it instead of failing)
//! - update: UPDATE .. RETURNING, `NotFound` when no row matched
//! - list: filters assembled with `QueryBuilder`, all values bound

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cloudlib_core::{Book, BookFilters, BookStore, LibraryError, Result};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

const COLUMNS: &str =
    "id, isbn, title, lang, translator, authors, pages, publisher, published_date, added_date";

/// Book row from database
#[derive(Debug, Clone, FromRow)]
struct BookRow {
    id: i64,
    isbn: String,
    title: String,
    lang: String,
    translator: String,
    authors: Vec<String>,
    pages: i32,
    publisher: String,
    published_date: Option<DateTime<Utc>>,
    added_date: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: row.id,
            isbn: row.isbn,
            title: row.title,
            lang: row.lang,
            translator: row.translator,
            authors: row.authors,
            pages: row.pages,
            publisher: row.publisher,
            published_date: row.published_date,
            added_date: Some(row.added_date),
        }
    }
}

/// Book store over a shared connection pool
#[derive(Debug, Clone)]
pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert(&self, book: Book) -> Result<Book> {
        let sql = format!(
            r#"
            INSERT INTO books
                (isbn, title, lang, translator, authors, pages, publisher, published_date, added_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, NOW()))
            ON CONFLICT (isbn) DO UPDATE SET
                title = EXCLUDED.title,
                lang = EXCLUDED.lang,
                translator = EXCLUDED.translator,
                authors = EXCLUDED.authors,
                pages = EXCLUDED.pages,
                publisher = EXCLUDED.publisher,
                published_date = EXCLUDED.published_date,
                added_date = COALESCE($9, books.added_date)
            RETURNING {COLUMNS}
            "#
        );

        let row: BookRow = sqlx::query_as(&sql)
            .bind(&book.isbn)
            .bind(&book.title)
            .bind(&book.lang)
            .bind(&book.translator)
            .bind(&book.authors)
            .bind(book.pages)
            .bind(&book.publisher)
            .bind(book.published_date)
            .bind(book.added_date)
            .fetch_one(&self.pool)
            .await
            .map_err(LibraryError::storage)?;

        Ok(row.into())
    }

    async fn update(&self, book: Book) -> Result<Book> {
        let sql = format!(
            r#"
            UPDATE books SET
                isbn = $2,
                title = $3,
                lang = $4,
                translator = $5,
                authors = $6,
                pages = $7,
                publisher = $8,
                published_date = $9,
                added_date = COALESCE($10, added_date)
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        );

        let row: Option<BookRow> = sqlx::query_as(&sql)
            .bind(book.id)
            .bind(&book.isbn)
            .bind(&book.title)
            .bind(&book.lang)
            .bind(&book.translator)
            .bind(&book.authors)
            .bind(book.pages)
            .bind(&book.publisher)
            .bind(book.published_date)
            .bind(book.added_date)
            .fetch_optional(&self.pool)
            .await
            .map_err(LibraryError::storage)?;

        row.map(Book::from)
            .ok_or_else(|| LibraryError::not_found(book.id))
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn store(&self, book: Book) -> Result<Book> {
        if book.is_new() {
            self.insert(book).await
        } else {
            self.update(book).await
        }
    }

    async fn get(&self, id: i64) -> Result<Book> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM books WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(LibraryError::storage)?;

        row.map(Book::from)
            .ok_or_else(|| LibraryError::not_found(id))
    }

    async fn delete(&self, book: &Book) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book.id)
            .execute(&self.pool)
            .await
            .map_err(LibraryError::storage)?;

        if result.rows_affected() == 0 {
            return Err(LibraryError::not_found(book.id));
        }
        Ok(())
    }

    async fn list(&self, filters: &BookFilters) -> Result<Vec<Book>> {
        let mut query = list_query(filters);

        let rows = query
            .build_query_as::<BookRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(LibraryError::storage)?;

        Ok(rows.into_iter().map(Book::from).collect())
    }
}

fn list_query(filters: &BookFilters) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {COLUMNS} FROM books WHERE TRUE"));

    if let Some(id) = filters.id {
        query.push(" AND id = ").push_bind(id);
    }

    let text_filters = [
        ("isbn", &filters.isbn),
        ("title", &filters.title),
        ("lang", &filters.lang),
        ("translator", &filters.translator),
        ("publisher", &filters.publisher),
    ];
    for (column, value) in text_filters {
        if let Some(value) = value {
            query
                .push(format!(" AND {column} ILIKE "))
                .push_bind(like_pattern(value));
        }
    }

    if let Some(author) = &filters.author {
        query
            .push(" AND EXISTS (SELECT 1 FROM unnest(authors) AS a WHERE a ILIKE ")
            .push_bind(like_pattern(author))
            .push(")");
    }

    query.push(" ORDER BY id");
    query
}

/// `%value%` with LIKE wildcards in `value` escaped
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
