//! # Vigil Database Crate
//!
//! This crate owns every conversation with PostgreSQL: building the run's
//! connection pool and the catalog reads and schema statements issued by the
//! auditor and the repairer.
//!
//! ## Public API
//!
//! - `connect`: establishes the bounded connection pool from resolved credentials.
//! - `DbRepository`: holds the pool; scoped `acquire`, one-shot `shutdown`, and the
//!   live `SchemaStore` implementation.
//! - `SchemaStore`: the async seam the upper components are written against.
//! - `DbError`: the specific error types that can be returned from this crate.
//! - `testing` (feature `test-util`): per-test schemas for live database tests.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod store;
#[cfg(feature = "test-util")]
pub mod testing;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, connect_options, connect_with_options};
pub use error::DbError;
pub use repository::DbRepository;
pub use store::SchemaStore;
