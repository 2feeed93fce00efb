//! SQLite persistence layer for the studio booking system.
//!
//! This crate provides async database operations for appointments, services,
//! business hours, availability blocks, checkouts and payments using SQLx
//! with SQLite. Every operation is tenant-scoped: the tenant id is an
//! explicit argument, never a compiled-in constant.
//!
//! # Example
//!
//! ```no_run
//! use database::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:studio.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let hours = database::business_hours::get_for_weekday(db.pool(), "studio-1", 1).await?;
//!     println!("{hours:?}");
//!
//!     Ok(())
//! }
//! ```

pub mod appointment;
pub mod availability_block;
pub mod business_hours;
pub mod checkout;
pub mod checkout_item;
pub mod error;
pub mod models;
pub mod payment;
pub mod service;
pub mod settings;

pub use error::{DatabaseError, Result};
pub use models::{
    Appointment, AvailabilityBlock, BusinessHours, Checkout, CheckoutItem, Payment, Service,
    StudioSettings,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for an in-memory database in tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to database: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up
    /// to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
