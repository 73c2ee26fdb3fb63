pub mod audit_repo;
pub mod hold_repo;
pub mod order_repo;
pub mod payment_repo;
pub mod policy_repo;
pub mod refund_repo;
pub mod seat_repo;
pub mod session_repo;
pub mod ticket_repo;

pub use audit_repo::AuditRepo;
pub use hold_repo::HoldRepo;
pub use order_repo::OrderRepo;
pub use payment_repo::PaymentRepo;
pub use policy_repo::CommercialPolicyRepo;
pub use refund_repo::RefundRepo;
pub use seat_repo::SeatRepo;
pub use session_repo::SessionRepo;
pub use ticket_repo::TicketRepo;
