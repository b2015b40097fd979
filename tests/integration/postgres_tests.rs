//! PostgreSQL store tests
//!
//! Need a reachable database: `DATABASE_URL=postgres://... cargo test -- --ignored`

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use libreria_server::{
    config::DatabaseConfig,
    models::{BookDraft, BookSearch, BookStatus, Pagination},
    repository::{BookStore, PgBookRepository},
    AppError,
};

async fn repository() -> PgBookRepository {
    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").ok(),
        max_retries: 1,
        ..Default::default()
    };
    let repository = PgBookRepository::connect(&config)
        .await
        .expect("Failed to connect to database");
    repository.migrate().await.expect("Failed to run migrations");
    sqlx::query("TRUNCATE books RESTART IDENTITY")
        .execute(repository.pool())
        .await
        .expect("Failed to truncate books");
    repository
}

fn draft(title: &str, year: i32) -> BookDraft {
    BookDraft {
        title: title.to_string(),
        author: "Frank Herbert".to_string(),
        publisher: "Ace".to_string(),
        publish_date: Utc.with_ymd_and_hms(year, 8, 1, 0, 0, 0).unwrap(),
    }
}

// The database is shared, so these scenarios run in one test.
#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_book_lifecycle() {
    let repo = repository().await;

    let dune = repo.create(&draft("Dune", 1965)).await.unwrap();
    repo.create(&draft("Dune Messiah", 1969)).await.unwrap();
    repo.create(&draft("100% Dune_", 1970)).await.unwrap();
    assert_eq!(dune.status, BookStatus::CheckedIn);
    assert_eq!(dune.rating, 0.0);

    // `%` and `_` are matched literally
    let search = BookSearch {
        title: Some("0% D".to_string()),
        ..Default::default()
    };
    let found = repo.list(&search, Pagination::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "100% Dune_");

    repo.update_status(dune.id, BookStatus::CheckedOut).await.unwrap();
    let search = BookSearch {
        status: Some(BookStatus::CheckedOut),
        ..Default::default()
    };
    let found = repo.list(&search, Pagination::default()).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, dune.id);

    repo.rate(dune.id, 2).await.unwrap();
    assert_eq!(repo.get(dune.id).await.unwrap().rating, 3.0);
    repo.rate(dune.id, 2).await.unwrap();
    assert_eq!(repo.get(dune.id).await.unwrap().rating, 2.5);
    repo.rate(dune.id, 2).await.unwrap();
    repo.rate(dune.id, 3).await.unwrap();
    assert_eq!(repo.get(dune.id).await.unwrap().rating, 2.63);

    repo.delete(dune.id).await.unwrap();
    assert!(matches!(repo.get(dune.id).await, Err(AppError::NotFound(_))));
    assert!(matches!(repo.delete(dune.id).await, Err(AppError::NotFound(_))));
    assert_eq!(
        repo.list(&BookSearch::default(), Pagination::default()).await.unwrap().len(),
        2
    );

    // Concurrent raters: every update lands
    let repo = Arc::new(repo);
    let target = repo.create(&draft("Children of Dune", 1976)).await.unwrap();
    repo.rate(target.id, 1).await.unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.rate(target.id, 1).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert_eq!(repo.get(target.id).await.unwrap().rating, 1.13);
}
