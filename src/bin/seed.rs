//! Demo data seeder for Swipe Match
//!
//! Inserts users with filled-in profiles into the configured PostgreSQL
//! database. Every account logs in with `SEED_PASSWORD`.
//!
//! Run: cargo run --bin seed -- [count]

use swipe_match::config::Settings;
use swipe_match::services::{seed_users, PostgresStore, SEED_PASSWORD};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: usize = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let count = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<usize>()?,
        None => DEFAULT_COUNT,
    };

    let settings = Settings::load()?;
    if settings.database.in_memory {
        warn!("database.in_memory is set; seeding an in-memory store would be lost on exit");
        return Ok(());
    }

    let store = PostgresStore::from_settings(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.min_connections,
        settings.database.acquire_timeout_secs,
        settings.database.idle_timeout_secs,
    )
    .await?;

    let profiles = seed_users(&store, count, SEED_PASSWORD).await?;

    info!(count = profiles.len(), password = SEED_PASSWORD, "Seeding complete");

    Ok(())
}
