//! Repository layer for book storage

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    config::{DatabaseConfig, StorageBackend},
    error::AppResult,
    models::{Book, BookDraft, BookSearch, BookStatus, Pagination},
};

pub use memory::MemoryBookRepository;
pub use postgres::PgBookRepository;

/// Storage operations on books.
///
/// Soft-deleted books behave as if they did not exist: every operation
/// targeting one fails with `AppError::NotFound`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Insert a new book; the store assigns id, status, rating and timestamps
    async fn create(&self, draft: &BookDraft) -> AppResult<Book>;

    async fn get(&self, id: i32) -> AppResult<Book>;

    /// Books matching every present filter, ordered by id
    async fn list(&self, search: &BookSearch, page: Pagination) -> AppResult<Vec<Book>>;

    /// Replace title, author, publisher and publish date
    async fn update(&self, id: i32, draft: &BookDraft) -> AppResult<()>;

    async fn update_status(&self, id: i32, status: BookStatus) -> AppResult<()>;

    /// Fold a 1-3 score into the stored rating, atomically
    async fn rate(&self, id: i32, rating: i32) -> AppResult<()>;

    /// Soft delete
    async fn delete(&self, id: i32) -> AppResult<()>;

    /// Check the store is reachable
    async fn ping(&self) -> AppResult<()>;

    /// Release the underlying connections
    async fn close(&self);
}

/// Open the store selected by configuration
pub async fn open(config: &DatabaseConfig) -> AppResult<Arc<dyn BookStore>> {
    match config.backend {
        StorageBackend::Postgres => {
            let repository = PgBookRepository::connect(config).await?;
            if config.run_migrations {
                repository.migrate().await?;
                tracing::info!("Database migrations completed");
            }
            Ok(Arc::new(repository))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory book store, data will not survive a restart");
            Ok(Arc::new(MemoryBookRepository::new()))
        }
    }
}
