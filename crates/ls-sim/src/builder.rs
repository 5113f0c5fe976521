//! Fluent builder for constructing a [`Coordinator`].

use std::sync::Arc;

use tracing::info;

use ls_core::SimConfig;
use ls_network::Scenario;
use ls_worker::Worker;

use crate::barrier::Barrier;
use crate::{Coordinator, SimError, SimResult};

/// Fluent builder for [`Coordinator`].
///
/// # Required inputs
///
/// - [`SimConfig`]: sync interval, barrier timeout, sub-round budget, …
/// - [`Scenario`]: network, partition and demand, already validated.
///
/// # Optional inputs (have defaults)
///
/// | Method                | Default                                   |
/// |-----------------------|-------------------------------------------|
/// | `.num_threads(n)`     | `config.num_threads`, else cluster count  |
/// | `.thread_prefix(s)`   | `"ls-worker"`                             |
///
/// # Example
///
/// ```rust,ignore
/// let scenario = Scenario::new(network, partition, demand)?;
/// let mut coordinator = CoordinatorBuilder::new(SimConfig::default(), scenario).build()?;
/// coordinator.run(&mut NoopSink)?;
/// ```
pub struct CoordinatorBuilder {
    config:        SimConfig,
    scenario:      Arc<Scenario>,
    thread_prefix: String,
}

impl CoordinatorBuilder {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, scenario: impl Into<Arc<Scenario>>) -> Self {
        Self {
            config,
            scenario:      scenario.into(),
            thread_prefix: "ls-worker".to_owned(),
        }
    }

    /// Override the pool size from the config.
    pub fn num_threads(mut self, n: usize) -> Self {
        self.config.num_threads = Some(n);
        self
    }

    /// Name pool threads `{prefix}-{i}`.
    pub fn thread_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_prefix = prefix.into();
        self
    }

    /// Validate the config, build the worker pool and one worker per
    /// cluster, and return a ready-to-run [`Coordinator`].
    pub fn build(self) -> SimResult<Coordinator> {
        self.config.validate()?;

        let worker_count = self.scenario.worker_count();
        let threads = self.config.num_threads.unwrap_or(worker_count).max(1);
        let prefix = self.thread_prefix;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()
            .map_err(|e| SimError::ThreadPool(e.to_string()))?;
        info!(threads, workers = worker_count, "worker pool ready");

        let workers = self
            .scenario
            .partition()
            .workers()
            .map(|id| Worker::new(id, &self.scenario))
            .collect();

        let barrier = Barrier::new(pool, self.config.barrier_timeout);
        Ok(Coordinator::new(self.config, self.scenario, barrier, workers))
    }
}
