//! In-memory book repository

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::BookStore;
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{next_rating, UNRATED},
        Book, BookDraft, BookSearch, BookStatus, Pagination,
    },
};

#[derive(Default)]
struct Shelf {
    last_id: i32,
    books: BTreeMap<i32, Book>,
}

impl Shelf {
    fn live_mut(&mut self, id: i32) -> AppResult<&mut Book> {
        self.books
            .get_mut(&id)
            .filter(|b| b.deleted_at.is_none())
            .ok_or_else(|| AppError::book_not_found(id))
    }
}

/// Books kept in process memory; every write holds the lock for its
/// whole read-modify-write.
#[derive(Default)]
pub struct MemoryBookRepository {
    shelf: RwLock<Shelf>,
}

impl MemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_match(book: &Book, search: &BookSearch) -> bool {
    let contains = |field: &str, needle: &Option<String>| {
        needle.as_deref().map_or(true, |n| field.contains(n))
    };

    book.deleted_at.is_none()
        && contains(&book.title, &search.title)
        && contains(&book.author, &search.author)
        && contains(&book.publisher, &search.publisher)
        && search.status.map_or(true, |s| book.status == s)
        && search
            .publish_date
            .map_or(true, |f| f.op.matches(book.publish_date.date_naive(), f.date))
}

#[async_trait]
impl BookStore for MemoryBookRepository {
    async fn create(&self, draft: &BookDraft) -> AppResult<Book> {
        let mut shelf = self.shelf.write().await;
        shelf.last_id += 1;

        let now = Utc::now();
        let book = Book {
            id: shelf.last_id,
            title: draft.title.clone(),
            author: draft.author.clone(),
            publisher: draft.publisher.clone(),
            publish_date: draft.publish_date,
            rating: UNRATED,
            status: BookStatus::CheckedIn,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        shelf.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get(&self, id: i32) -> AppResult<Book> {
        self.shelf
            .read()
            .await
            .books
            .get(&id)
            .filter(|b| b.deleted_at.is_none())
            .cloned()
            .ok_or_else(|| AppError::book_not_found(id))
    }

    async fn list(&self, search: &BookSearch, page: Pagination) -> AppResult<Vec<Book>> {
        let shelf = self.shelf.read().await;
        Ok(shelf
            .books
            .values()
            .filter(|b| is_match(b, search))
            .skip(usize::try_from(page.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit).unwrap_or(0))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i32, draft: &BookDraft) -> AppResult<()> {
        let mut shelf = self.shelf.write().await;
        let book = shelf.live_mut(id)?;
        book.title = draft.title.clone();
        book.author = draft.author.clone();
        book.publisher = draft.publisher.clone();
        book.publish_date = draft.publish_date;
        book.updated_at = Utc::now();
        Ok(())
    }

    async fn update_status(&self, id: i32, status: BookStatus) -> AppResult<()> {
        let mut shelf = self.shelf.write().await;
        let book = shelf.live_mut(id)?;
        book.status = status;
        book.updated_at = Utc::now();
        Ok(())
    }

    async fn rate(&self, id: i32, rating: i32) -> AppResult<()> {
        let mut shelf = self.shelf.write().await;
        let book = shelf.live_mut(id)?;
        book.rating = next_rating(book.rating, rating)?;
        book.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i32) -> AppResult<()> {
        let mut shelf = self.shelf.write().await;
        let book = shelf.live_mut(id)?;
        book.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn close(&self) {}
}
