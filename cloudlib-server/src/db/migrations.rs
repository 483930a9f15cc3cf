//! Schema for the books table

use sqlx::PgPool;

/// Create the books table and its indexes if they do not exist
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running library migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id BIGSERIAL PRIMARY KEY,
            isbn TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            lang TEXT NOT NULL,
            translator TEXT NOT NULL DEFAULT '',
            authors TEXT[] NOT NULL DEFAULT '{}',
            pages INTEGER NOT NULL,
            publisher TEXT NOT NULL,
            published_date TIMESTAMPTZ,
            added_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_title ON books (lower(title))")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_books_authors ON books USING GIN (authors)")
        .execute(pool)
        .await?;

    tracing::info!("Library migrations complete");
    Ok(())
}
