//! Book catalog service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{Book, BookDraft, BookSearch, BookStatus, Pagination},
    repository::BookStore,
};

/// Transport-facing entry point for book operations; forwards to the store
#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    pub async fn add_book(&self, draft: &BookDraft) -> AppResult<Book> {
        self.store.create(draft).await
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.store.get(id).await
    }

    pub async fn list_books(&self, search: &BookSearch, page: Pagination) -> AppResult<Vec<Book>> {
        self.store.list(search, page).await
    }

    pub async fn update_book(&self, id: i32, draft: &BookDraft) -> AppResult<()> {
        self.store.update(id, draft).await
    }

    pub async fn update_book_status(&self, id: i32, status: BookStatus) -> AppResult<()> {
        self.store.update_status(id, status).await
    }

    pub async fn rate_book(&self, id: i32, rating: i32) -> AppResult<()> {
        self.store.rate(id, rating).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.store.delete(id).await
    }

    /// Readiness of the underlying store
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }

    pub async fn shutdown(&self) {
        self.store.close().await
    }
}
