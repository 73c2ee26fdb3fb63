pub mod audit;
pub mod hold;
pub mod order;
pub mod payment;
pub mod policy;
pub mod seat;
pub mod session;
pub mod ticket;
