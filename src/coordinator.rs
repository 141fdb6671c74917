// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Coordinator: one configured evolution run over a task queue.

Builds the population manager, summary sinks, dispatcher and stop condition
from an [`ArborConfig`] and drives the run. The transport is supplied by the
caller so the same coordinator works with in-process workers and ZeroMQ.
*/

use crate::error::ArborResult;
use crate::settings;
use arbor_config::{validate_config, ArborConfig};
use arbor_dispatch::{AbortHandle, DispatchStats, TaskDispatcher};
use arbor_evolution::{
    Evaluator, EvolutionRun, JsonLinesSummarySink, PopulationManager, RunReport, SeedStrategy,
    TracingSummarySink,
};
use arbor_transports::TaskQueueServer;
use std::sync::Arc;
use tracing::info;

pub struct Coordinator {
    config: ArborConfig,
    dispatcher: Arc<TaskDispatcher>,
}

impl Coordinator {
    /// `transport` must already be started
    pub fn new(config: ArborConfig, transport: Arc<dyn TaskQueueServer>) -> ArborResult<Self> {
        validate_config(&config)?;
        let dispatcher = TaskDispatcher::new(transport, settings::dispatch_config(&config))?;
        Ok(Self {
            config,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn config(&self) -> &ArborConfig {
        &self.config
    }

    /// Cancels the run in progress; see [`AbortHandle::reset`] to run again
    pub fn abort_handle(&self) -> AbortHandle {
        self.dispatcher.abort_handle()
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    /// Generation 0, with a tracing sink and the JSON-lines sink if configured
    pub fn population(&self, strategy: SeedStrategy) -> ArborResult<PopulationManager> {
        let mut manager = PopulationManager::new(settings::evolution_config(&self.config)?)?;
        manager.add_sink(Box::new(TracingSummarySink));
        if let Some(path) = &self.config.run.summary_path {
            manager.add_sink(Box::new(JsonLinesSummarySink::create(path)?));
        }
        manager.initialize(self.config.population.size, strategy)?;
        Ok(manager)
    }

    pub async fn run(&self, strategy: SeedStrategy) -> ArborResult<RunReport> {
        let manager = self.population(strategy)?;
        let evaluator: Arc<dyn Evaluator> = self.dispatcher.clone();
        let run = EvolutionRun::new(manager, evaluator, settings::stop_condition(&self.config))?;

        info!(
            target: "arbor",
            "🦀 [COORDINATOR] Starting run: population {}, profile '{}'",
            self.config.population.size,
            self.config.language.profile
        );
        let report = run.run().await?;

        let stats = self.dispatcher.stats();
        info!(
            target: "arbor",
            "🦀 [COORDINATOR] Run finished after {} generations ({}); {} tasks sent, {} timeouts",
            report.generations,
            report.stop_reason,
            stats.sent,
            stats.timeouts
        );
        Ok(report)
    }
}
