//! Request handlers for the `/api/v1` checkout surface.
//!
//! Handlers only extract and wrap: every rule lives in [`crate::checkout`],
//! and every error is mapped by [`crate::error::AppError`].

pub mod checkin;
pub mod holds;
pub mod orders;
pub mod payments;
pub mod refunds;
pub mod sessions;
