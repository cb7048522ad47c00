//! SQLite storage implementation for tickerline.
//!
//! This crate is the only place in the workspace where Diesel dependencies
//! exist. It implements the store traits defined in `tickerline-core`:
//! - Database connection pooling and management
//! - Embedded Diesel migrations
//! - The quote and daily price history repository
//!
//! ```text
//!   core (resolver, store traits)
//!                │
//!                ▼
//!     storage-sqlite (this crate)
//!                │
//!                ▼
//!            SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod market_data;
pub mod schema;

pub use db::{
    create_pool, get_connection, init, open, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};
pub use errors::{IntoStore, StorageError};
pub use market_data::MarketDataRepository;
