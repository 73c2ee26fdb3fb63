//! Domain building blocks for the box office.
//!
//! Everything in this crate is free of I/O and of any dependency on the
//! database or HTTP layers, so it can be shared by the repositories, the
//! checkout use cases and the tests alike.

pub mod audit;
pub mod error;
pub mod hashing;
pub mod holds;
pub mod idempotency;
pub mod notification;
pub mod payment;
pub mod pricing;
pub mod seats;
pub mod status;
pub mod tickets;
pub mod types;
pub mod webhook;
