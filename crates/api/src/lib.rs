//! Box office API server library.
//!
//! Exposes configuration, state, error handling, the checkout use cases and
//! the route tree so integration tests and the binary entrypoint share them.

pub mod checkout;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
