//! Application layer orchestrating the order process lifecycle.
//!
//! This module defines the `OrderProcessor`, which registers order processes,
//! runs one background tokio task per order to simulate the work, persists
//! the terminal status and hands the result to the callback notifier.

pub mod processor;
