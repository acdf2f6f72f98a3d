//! # PostgreSQL Infrastructure
//!
//! Adapters implementing the platform's storage ports on PostgreSQL through
//! the sqlx runtime API:
//!
//! - [`PgEventStore`] backs the kernel's append-only aggregate event log
//! - [`PgSystemEventRepository`] persists system events together with their
//!   relationships and tags
//!
//! Schema DDL lives in the repository's top-level `migrations/` directory as
//! plain SQL.
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PgSystemEventRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/coverbridge")).await?;
//! let repository = PgSystemEventRepository::new(pool.clone());
//! ```

pub mod error;
pub mod event_store;
pub mod pool;
pub mod system_event_repository;

pub use error::DatabaseError;
pub use event_store::PgEventStore;
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use system_event_repository::PgSystemEventRepository;
