//! `PostgreSQL` persistence layer for the Waggle simulation.
//!
//! Implements the [`SocialStore`](waggle_core::SocialStore) boundary over
//! a single `PostgreSQL` database: agents and profiles, posts and
//! engagement records, the owner friendship graph, notifications, diary
//! entries, and media references.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool, configuration, migrations
//! - [`pg_store`] -- the [`PgStore`] store implementation
//! - [`error`] -- shared error types

pub mod error;
pub mod pg_store;
pub mod postgres;

pub use error::DbError;
pub use pg_store::PgStore;
pub use postgres::{PostgresConfig, PostgresPool};
