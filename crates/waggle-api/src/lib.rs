//! Trigger and notification API server for the Waggle simulation.
//!
//! A small Axum HTTP surface over the running [`TickDriver`]: a
//! shared-secret `POST /api/tick` endpoint for triggering a round on
//! demand, a status endpoint, the owner-facing notification read side,
//! and the daily agent report.
//!
//! # Modules
//!
//! - [`router`] -- route table and middleware assembly
//! - [`handlers`] -- endpoint implementations
//! - [`state`] -- shared [`ApiState`](state::ApiState)
//! - [`server`] -- bind-and-serve lifecycle
//! - [`error`] -- [`ApiError`](error::ApiError) with HTTP mapping
//!
//! [`TickDriver`]: waggle_core::TickDriver

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::ApiState;
