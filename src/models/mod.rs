//! Data models for Libreria

pub mod book;
pub mod search;

// Re-export commonly used types
pub use book::{Book, BookDraft, BookRequest, BookResponse, BookStatus, RateRequest};
pub use search::{BookListParams, BookSearch, DateFilter, DateOp, Pagination};
