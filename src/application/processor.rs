use crate::domain::order_process::{OrderProcess, Outcome};
use crate::domain::ports::{CallbackNotifierRef, DeliveryReport, OrderProcessStoreRef};
use crate::error::{OrderProcessError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

/// Bounds for the simulated work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Exclusive upper bound on extra delivery rounds per order.
    pub max_duplicate_callbacks: u32,
    /// Exclusive upper bound, in seconds, on simulated processing time.
    pub max_order_process_duration: u64,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            max_duplicate_callbacks: 2,
            max_order_process_duration: 600,
        }
    }
}

/// Random draws for one order, taken together when its worker starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationPlan {
    pub duration: Duration,
    pub outcome: Outcome,
    pub duplicates: u32,
}

impl SimulationPlan {
    pub fn draw<R: Rng + ?Sized>(rng: &mut R, config: &ProcessorConfig) -> Self {
        let seconds = below(rng, config.max_order_process_duration);
        let outcome = if rng.gen_bool(0.5) {
            Outcome::Failed
        } else {
            Outcome::Succeeded
        };
        let duplicates = below(rng, u64::from(config.max_duplicate_callbacks)) as u32;

        Self {
            duration: Duration::from_secs(seconds),
            outcome,
            duplicates,
        }
    }
}

/// Uniform draw from `[0, bound)`; an empty range yields zero.
fn below<R: Rng + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    if bound == 0 { 0 } else { rng.gen_range(0..bound) }
}

/// Drives order processes from `RUNNING` to a terminal status.
///
/// Each dispatched order gets its own tokio task. Dispatchers never receive a
/// handle; the processor keeps them in a [`TaskTracker`] so the number of
/// in-flight workers can be observed and tests can wait for them.
///
/// Cloning is cheap and every clone shares the same store, notifier, random
/// source and tracker.
#[derive(Clone)]
pub struct OrderProcessor {
    store: OrderProcessStoreRef,
    notifier: CallbackNotifierRef,
    config: ProcessorConfig,
    rng: Arc<Mutex<StdRng>>,
    tracker: TaskTracker,
    idle_gate: Arc<tokio::sync::Mutex<()>>,
}

impl OrderProcessor {
    /// Creates a processor with an entropy-seeded random source.
    ///
    /// # Arguments
    ///
    /// * `store` - Where records are registered and completed.
    /// * `notifier` - Used once a process reaches a terminal status.
    /// * `config` - Bounds for duration and duplication draws.
    pub fn new(
        store: OrderProcessStoreRef,
        notifier: CallbackNotifierRef,
        config: ProcessorConfig,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            tracker: TaskTracker::new(),
            idle_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Replaces the random source, e.g. with `StdRng::seed_from_u64`.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Arc::new(Mutex::new(rng));
        self
    }

    pub fn store(&self) -> &OrderProcessStoreRef {
        &self.store
    }

    /// Number of workers that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every worker dispatched so far has finished.
    ///
    /// Callers are serialized so a finished waiter cannot reopen the tracker
    /// while another is still waiting on it.
    pub async fn wait_idle(&self) {
        let _gate = self.idle_gate.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    fn plan(&self) -> SimulationPlan {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        SimulationPlan::draw(&mut *rng, &self.config)
    }

    /// Registers a new `RUNNING` process and dispatches its worker.
    ///
    /// Returns the registered record. Fails with `AlreadyExists` without
    /// dispatching anything if the order id is taken.
    pub async fn start(
        &self,
        order_id: impl Into<String>,
        callback_url: Option<String>,
    ) -> Result<OrderProcess> {
        let process = OrderProcess::new(order_id);
        self.store.add(process.clone()).await?;

        match &callback_url {
            Some(_) => info!(order_id = %process.order_id, "processing order with callback"),
            None => info!(order_id = %process.order_id, "processing order with no callback"),
        }
        self.dispatch(process.clone(), callback_url);
        Ok(process)
    }

    /// Spawns the worker for an already registered process and returns at once.
    pub fn dispatch(&self, process: OrderProcess, callback_url: Option<String>) {
        let worker = self.clone();
        self.tracker.spawn(async move {
            let order_id = process.order_id.clone();
            if let Err(e) = worker.run(process, callback_url).await {
                error!(order_id = %order_id, error = %e, "order process worker stopped");
            }
        });
    }

    /// The worker body: simulate, persist the terminal status, then call back.
    ///
    /// The store update always completes before any callback attempt. If the
    /// record vanished from the store the worker stops with
    /// `InvariantViolation` and no callback is sent.
    pub async fn run(
        &self,
        mut process: OrderProcess,
        callback_url: Option<String>,
    ) -> Result<DeliveryReport> {
        let plan = self.plan();
        info!(
            order_id = %process.order_id,
            seconds = plan.duration.as_secs(),
            "order process started"
        );

        tokio::time::sleep(plan.duration).await;

        process.complete(plan.outcome)?;
        info!(order_id = %process.order_id, status = %process.status, "order process finished");

        self.store
            .update(process.clone())
            .await
            .map_err(|e| match e {
                OrderProcessError::NotFound(id) => OrderProcessError::InvariantViolation(format!(
                    "order process for order {id} vanished before it could be completed"
                )),
                other => other,
            })?;

        if callback_url.is_none() {
            return Ok(DeliveryReport::default());
        }

        Ok(self
            .notifier
            .deliver(&process, callback_url.as_deref(), plan.duplicates)
            .await)
    }
}
