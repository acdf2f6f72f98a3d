//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the Coverbridge
//! test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for system events and read models
//! - `fakes`: In-memory substitutes for the persistence and trigger ports
//! - `database`: Database test helpers and container management
//! - `assertions`: Custom assertion helpers for system events
//! - `generators`: Property-based test data generators
//! - `logging`: Tracing setup for test binaries

pub mod fixtures;
pub mod builders;
pub mod fakes;
pub mod database;
pub mod assertions;
pub mod generators;
pub mod logging;

pub use fixtures::*;
pub use builders::*;
pub use fakes::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
pub use logging::*;
