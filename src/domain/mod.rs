pub mod outbox;
pub mod payment;
pub mod ports;
pub mod routing;
