use crate::domain::order_process::OrderProcess;
use crate::domain::ports::OrderProcessStore;
use crate::error::{OrderProcessError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A thread-safe in-memory store for order processes.
///
/// Uses `Arc<Mutex<HashMap<String, OrderProcess>>>`: one exclusive lock over
/// the whole map, held only for the map operation itself. Every read hands
/// out a clone, so callers never observe a record mid-update.
#[derive(Default, Clone)]
pub struct InMemoryOrderProcessStore {
    processes: Arc<Mutex<HashMap<String, OrderProcess>>>,
}

impl InMemoryOrderProcessStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderProcessStore for InMemoryOrderProcessStore {
    async fn add(&self, process: OrderProcess) -> Result<()> {
        let mut processes = self.processes.lock().await;
        match processes.entry(process.order_id.clone()) {
            Entry::Occupied(_) => Err(OrderProcessError::AlreadyExists(process.order_id)),
            Entry::Vacant(slot) => {
                slot.insert(process);
                Ok(())
            }
        }
    }

    async fn update(&self, process: OrderProcess) -> Result<()> {
        let mut processes = self.processes.lock().await;
        match processes.get_mut(&process.order_id) {
            Some(stored) => {
                *stored = process;
                Ok(())
            }
            None => Err(OrderProcessError::NotFound(process.order_id)),
        }
    }

    async fn get_by_id(&self, order_id: &str) -> Result<OrderProcess> {
        let processes = self.processes.lock().await;
        processes
            .get(order_id)
            .cloned()
            .ok_or_else(|| OrderProcessError::NotFound(order_id.to_string()))
    }

    async fn get_all(&self) -> Result<Vec<OrderProcess>> {
        let processes = self.processes.lock().await;
        Ok(processes.values().cloned().collect())
    }
}
