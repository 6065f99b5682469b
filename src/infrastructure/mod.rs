//! Adapters implementing the domain ports.

pub mod http_callback;
pub mod in_memory;
