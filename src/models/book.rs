//! Book (catalog record) model and request/response types

use chrono::{DateTime, Utc};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult};

/// Rating of a book that has never been rated
pub const UNRATED: f64 = 0.0;

/// Rating stored on the first submission, whatever value was submitted.
///
/// Stored ratings already start from this baseline; changing it would
/// shift every existing average.
pub const FIRST_RATING: f64 = 3.0;

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, sqlx::Type)]
#[repr(i16)]
pub enum BookStatus {
    #[default]
    CheckedIn = 0,
    CheckedOut = 1,
}

impl BookStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::CheckedIn => "CheckedIn",
            BookStatus::CheckedOut => "CheckedOut",
        }
    }

    /// Parse a status label, ignoring case
    pub fn from_label(label: &str) -> Option<Self> {
        [BookStatus::CheckedIn, BookStatus::CheckedOut]
            .into_iter()
            .find(|s| s.label().eq_ignore_ascii_case(label))
    }
}

impl From<BookStatus> for i16 {
    fn from(s: BookStatus) -> Self {
        s as i16
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Book record as stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub publish_date: DateTime<Utc>,
    /// `UNRATED` until the first rating is submitted
    pub rating: f64,
    pub status: BookStatus,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields of a book, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub publish_date: DateTime<Utc>,
}

/// JSON key carrying the title, in requests, responses and field errors
pub const TITLE_KEY: &str = "name";

/// Create/update book request
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct BookRequest {
    #[serde(rename = "name", alias = "title")]
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub author: String,
    #[validate(length(min = 1, max = 200, message = "must be between 1 and 200 characters"))]
    pub publisher: String,
    #[validate(required(message = "is required"))]
    pub publish_date: Option<DateTime<Utc>>,
}

impl BookRequest {
    /// Validate every field and turn the request into a draft
    pub fn into_draft(self) -> AppResult<BookDraft> {
        self.into_draft_at(Utc::now())
    }

    fn into_draft_at(self, now: DateTime<Utc>) -> AppResult<BookDraft> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };

        if let Some(date) = self.publish_date {
            if date > now {
                let mut error = ValidationError::new("max");
                error.message = Some("must not be in the future".into());
                errors.add("publish_date", error);
            }
        }

        match self.publish_date {
            Some(publish_date) if errors.errors().is_empty() => Ok(BookDraft {
                title: self.title,
                author: self.author,
                publisher: self.publisher,
                publish_date,
            }),
            _ => Err(AppError::from(errors).with_field_renamed("title", TITLE_KEY)),
        }
    }
}

/// Rate book request
#[derive(Debug, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(default)]
pub struct RateRequest {
    /// Score between 1 and 3
    #[validate(range(min = 1, max = 3, message = "must be between 1 and 3"))]
    pub rating: i32,
}

/// Book as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i32,
    pub name: String,
    pub author: String,
    pub publisher: String,
    pub publish_date: DateTime<Utc>,
    pub status: BookStatus,
    /// Absent while the book is unrated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl From<Book> for BookResponse {
    fn from(b: Book) -> Self {
        Self {
            id: b.id,
            name: b.title,
            author: b.author,
            publisher: b.publisher,
            publish_date: b.publish_date,
            status: b.status,
            rating: (b.rating != UNRATED).then_some(b.rating),
        }
    }
}

/// Rating after `input` is submitted for a book currently rated `current`.
///
/// Mirrors the SQL used by the PostgreSQL store: the first rating is always
/// `FIRST_RATING`, later ones average with the stored value and round to two
/// decimals, halves away from zero.
pub fn next_rating(current: f64, input: i32) -> AppResult<f64> {
    if current == UNRATED {
        return Ok(FIRST_RATING);
    }

    let current = Decimal::from_f64(current)
        .ok_or_else(|| AppError::Internal(format!("invalid stored rating {}", current)))?;
    ((Decimal::from(input) + current) / Decimal::TWO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| AppError::Internal("rating out of range".to_string()))
}
