//! Domain model and the ports the application layer depends on.

pub mod order_process;
pub mod ports;
