//! Book (catalog) endpoints

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use super::{ApiJson, ApiQuery, BookId};
use crate::{
    error::{AppResult, ErrorResponse},
    models::{
        BookListParams, BookRequest, BookResponse, BookSearch, BookStatus, Pagination,
        RateRequest,
    },
    AppState,
};

/// Create a new book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<(StatusCode, Json<BookResponse>)> {
    let draft = request.into_draft()?;
    let book = state.services.books.add_book(&draft).await?;
    Ok((StatusCode::CREATED, Json(book.into())))
}

/// List books with filters and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookListParams),
    responses(
        (status = 200, description = "Matching books", body = Vec<BookResponse>),
        (status = 400, description = "Invalid filter", body = ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<BookListParams>,
) -> AppResult<Json<Vec<BookResponse>>> {
    let page = Pagination::from_params(&params)?;
    let search = BookSearch::from_params(&params)?;

    let books = state.services.books.list_books(&search, page).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Get book by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 400, description = "Invalid book id", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> AppResult<Json<BookResponse>> {
    let book = state.services.books.get_book(id).await?;
    Ok(Json(book.into()))
}

/// Replace the bibliographic fields of a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 204, description = "Book updated"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    ApiJson(request): ApiJson<BookRequest>,
) -> AppResult<StatusCode> {
    let draft = request.into_draft()?;
    state.services.books.update_book(id, &draft).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a book in
#[utoipa::path(
    patch,
    path = "/books/{id}/in",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book checked in"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn check_in_book(state: State<AppState>, id: BookId) -> AppResult<StatusCode> {
    update_book_status(state, id, BookStatus::CheckedIn).await
}

/// Check a book out
#[utoipa::path(
    patch,
    path = "/books/{id}/out",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book checked out"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn check_out_book(state: State<AppState>, id: BookId) -> AppResult<StatusCode> {
    update_book_status(state, id, BookStatus::CheckedOut).await
}

async fn update_book_status(
    State(state): State<AppState>,
    BookId(id): BookId,
    status: BookStatus,
) -> AppResult<StatusCode> {
    state.services.books.update_book_status(id, status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rate a book from 1 to 3
#[utoipa::path(
    patch,
    path = "/books/{id}/rate",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    request_body = RateRequest,
    responses(
        (status = 204, description = "Rating recorded"),
        (status = 400, description = "Invalid rating", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn rate_book(
    State(state): State<AppState>,
    BookId(id): BookId,
    ApiJson(request): ApiJson<RateRequest>,
) -> AppResult<StatusCode> {
    request.validate()?;
    state.services.books.rate_book(id, request.rating).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    BookId(id): BookId,
) -> AppResult<StatusCode> {
    state.services.books.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
