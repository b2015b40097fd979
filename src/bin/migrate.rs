//! Apply or revert the database schema
//!
//! Usage: `migrate up` | `migrate down`

use anyhow::{bail, Context};

use libreria_server::{config::AppConfig, repository::PgBookRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "libreria_server=info,migrate=info".into()),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_default();
    if command != "up" && command != "down" {
        bail!("unknown command {:?}, expected 'up' or 'down'", command);
    }

    let config = AppConfig::load().context("Failed to load configuration")?;
    let repository = PgBookRepository::connect(&config.database)
        .await
        .context("Failed to connect to database")?;

    if command == "up" {
        repository.migrate().await.context("Failed to apply migrations")?;
        tracing::info!("Migrations applied");
    } else {
        repository.migrate_down().await.context("Failed to revert migrations")?;
        tracing::info!("Migrations reverted");
    }

    repository.pool().close().await;
    Ok(())
}
