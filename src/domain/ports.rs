use super::order_process::OrderProcess;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Keyed storage for order processes.
///
/// Implementations must be safe to share between request handlers and
/// background workers.
#[async_trait]
pub trait OrderProcessStore: Send + Sync {
    /// Inserts a new record. Fails with `AlreadyExists` if the id is taken.
    async fn add(&self, process: OrderProcess) -> Result<()>;
    /// Replaces an existing record wholesale. Fails with `NotFound` if absent.
    async fn update(&self, process: OrderProcess) -> Result<()>;
    async fn get_by_id(&self, order_id: &str) -> Result<OrderProcess>;
    /// Snapshot of every record, in no particular order.
    async fn get_all(&self) -> Result<Vec<OrderProcess>>;
}

/// Counts of delivery rounds from one `deliver` call.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct DeliveryReport {
    pub delivered: u32,
    pub abandoned: u32,
}

impl DeliveryReport {
    pub fn rounds(&self) -> u32 {
        self.delivered + self.abandoned
    }
}

/// Sends a completed order process to an external callback endpoint.
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    /// Runs `duplicates + 1` delivery rounds against `callback_url`.
    ///
    /// `None` means no callback was requested and nothing is sent. Failed
    /// rounds are abandoned and counted in the report, never returned as errors.
    async fn deliver(
        &self,
        process: &OrderProcess,
        callback_url: Option<&str>,
        duplicates: u32,
    ) -> DeliveryReport;
}

pub type OrderProcessStoreRef = Arc<dyn OrderProcessStore>;
pub type CallbackNotifierRef = Arc<dyn CallbackNotifier>;
