//! PostgreSQL book repository

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    migrate::Migrator,
    postgres::{PgConnectOptions, PgPoolOptions},
    Pool, Postgres, QueryBuilder,
};

use super::BookStore;
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Book, BookDraft, BookSearch, BookStatus, Pagination},
};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const BOOK_COLUMNS: &str = "id, title, author, publisher, publish_date, rating, status, \
                            deleted_at, created_at, updated_at";

#[derive(Clone)]
pub struct PgBookRepository {
    pool: Pool<Postgres>,
}

impl PgBookRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connect, retrying with a doubling delay up to `max_retries` attempts
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = connect_options(config)?;
        let attempts = config.max_retries.max(1);
        let mut delay = Duration::from_millis(500);
        let mut attempt = 1;

        loop {
            let result = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .min_connections(config.min_connections)
                .acquire_timeout(Duration::from_secs(config.write_timeout_secs))
                .connect_with(options.clone())
                .await;

            match result {
                Ok(pool) => {
                    tracing::info!("Connected to database");
                    return Ok(Self::new(pool));
                }
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        "Database connection attempt {}/{} failed: {}",
                        attempt,
                        attempts,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> AppResult<()> {
        MIGRATOR.run(&self.pool).await.map_err(sqlx::Error::from)?;
        Ok(())
    }

    /// Revert every applied migration
    pub async fn migrate_down(&self) -> AppResult<()> {
        MIGRATOR.undo(&self.pool, 0).await.map_err(sqlx::Error::from)?;
        Ok(())
    }

    /// Fails with not-found when no live book was touched
    fn expect_affected(id: i32, rows_affected: u64) -> AppResult<()> {
        if rows_affected == 0 {
            return Err(AppError::book_not_found(id));
        }
        Ok(())
    }
}

fn connect_options(config: &DatabaseConfig) -> AppResult<PgConnectOptions> {
    let options = match &config.url {
        Some(url) => url
            .parse::<PgConnectOptions>()
            .map_err(|e| AppError::Internal(format!("invalid database url: {}", e)))?,
        None => PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name),
    };

    let statement_timeout_ms = config.read_timeout_secs.max(config.write_timeout_secs) * 1000;
    Ok(options.options([("statement_timeout", statement_timeout_ms.to_string())]))
}

/// Append the WHERE conditions of a search; every present filter narrows the result
fn push_search_filters<'a>(qb: &mut QueryBuilder<'a, Postgres>, search: &'a BookSearch) {
    qb.push(" WHERE deleted_at IS NULL");

    for (column, value) in [
        ("title", &search.title),
        ("author", &search.author),
        ("publisher", &search.publisher),
    ] {
        if let Some(value) = value {
            // POSITION keeps `%` and `_` literal, unlike LIKE
            qb.push(" AND POSITION(")
                .push_bind(value.as_str())
                .push(format!(" IN {}) > 0", column));
        }
    }

    if let Some(status) = search.status {
        qb.push(" AND status = ").push_bind(status);
    }

    if let Some(filter) = search.publish_date {
        qb.push(" AND (publish_date AT TIME ZONE 'UTC')::date ")
            .push(filter.op.as_sql())
            .push(" ")
            .push_bind(filter.date);
    }
}

#[async_trait]
impl BookStore for PgBookRepository {
    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, author, publisher, publish_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.publisher)
        .bind(draft.publish_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(book)
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE id = $1 AND deleted_at IS NULL",
            BOOK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::book_not_found(id))
    }

    async fn list(&self, search: &BookSearch, page: Pagination) -> AppResult<Vec<Book>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", BOOK_COLUMNS));
        push_search_filters(&mut qb, search);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let books = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }

    async fn update(&self, id: i32, draft: &BookDraft) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE books SET
                title = $1,
                author = $2,
                publisher = $3,
                publish_date = $4,
                updated_at = NOW()
            WHERE id = $5 AND deleted_at IS NULL
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.author)
        .bind(&draft.publisher)
        .bind(draft.publish_date)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::expect_affected(id, result.rows_affected())
    }

    async fn update_status(&self, id: i32, status: BookStatus) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET status = $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::expect_affected(id, result.rows_affected())
    }

    async fn rate(&self, id: i32, rating: i32) -> AppResult<()> {
        // Single statement: the row lock taken by UPDATE serialises concurrent raters.
        let result = sqlx::query(
            r#"
            UPDATE books SET
                rating = CASE
                    WHEN rating = 0 THEN 3.0
                    ELSE ROUND(CAST(($1::INT + rating) / 2 AS NUMERIC), 2)::DOUBLE PRECISION
                END,
                updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(rating)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::expect_affected(id, result.rows_affected())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Self::expect_affected(id, result.rows_affected())
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database connection is closed");
    }
}
