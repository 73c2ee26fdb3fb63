//! Box office event bus and buyer notification plumbing.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`CheckoutEvent`]: the domain event envelope published after commits.
//! - [`ConfirmationDispatcher`]: background task that turns `order.paid`
//!   events into order confirmation messages.

pub mod bus;
pub mod confirmation;

pub use bus::{CheckoutEvent, EventBus};
pub use confirmation::ConfirmationDispatcher;
