// SPDX-FileCopyrightText: 2026 Linkrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The polling cycle: every pair once, in order, under one deadline.
//!
//! A stuck automation call cannot be cancelled cleanly from the inside, so
//! the poller never tries to. A cycle that overruns its deadline, or in which
//! every source fails in the driver, ends the run with
//! [`RelayError::RestartRequested`] and leaves recovery to the supervisor.

use std::sync::Arc;

use linkrelay_config::model::{ChannelPair, PollConfig};
use linkrelay_core::{RelayError, RestartReason};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::relay::{Relay, RelayOutcome};

/// Per-pair results of one sweep.
#[derive(Debug, Default)]
pub struct CycleReport {
    pub outcomes: Vec<(String, RelayOutcome)>,
    pub failures: Vec<(String, String)>,
    pub driver_failures: usize,
}

impl CycleReport {
    pub fn sent(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RelayOutcome::Sent { .. }))
            .count()
    }
}

pub struct Poller {
    relay: Arc<Relay>,
    pairs: Vec<ChannelPair>,
    config: PollConfig,
}

impl Poller {
    pub fn new(relay: Arc<Relay>, pairs: Vec<ChannelPair>, config: PollConfig) -> Self {
        Self {
            relay,
            pairs,
            config,
        }
    }

    /// Runs one bounded sweep over every pair.
    pub async fn run_cycle(&self) -> Result<CycleReport, RelayError> {
        let report = tokio::time::timeout(self.config.cycle_timeout(), self.sweep())
            .await
            .map_err(|_| {
                error!(timeout = ?self.config.cycle_timeout(), "poll cycle overran its deadline");
                RelayError::RestartRequested {
                    reason: RestartReason::CycleTimeout,
                }
            })?;

        if !self.pairs.is_empty() && report.driver_failures == self.pairs.len() {
            error!(
                sources = self.pairs.len(),
                "every source failed in the driver this cycle"
            );
            return Err(RelayError::RestartRequested {
                reason: RestartReason::RepeatedDriverFailure,
            });
        }

        info!(
            pairs = self.pairs.len(),
            sent = report.sent(),
            failed = report.failures.len(),
            "poll cycle complete"
        );
        Ok(report)
    }

    async fn sweep(&self) -> CycleReport {
        let mut report = CycleReport::default();
        for (i, pair) in self.pairs.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.inter_source_pause()).await;
            }
            let label = pair.label();
            match self.relay.process_pair(pair).await {
                Ok(outcome) => {
                    if matches!(
                        outcome,
                        RelayOutcome::LinkGenerationFailed {
                            driver_failure: true
                        }
                    ) {
                        report.driver_failures += 1;
                    }
                    report.outcomes.push((label, outcome));
                }
                Err(e) => {
                    warn!(pair = %label, error = %e, "source check failed");
                    if e.is_driver() {
                        report.driver_failures += 1;
                    }
                    report.failures.push((label, e.to_string()));
                }
            }
        }
        report
    }

    /// Poll until cancelled or until a restart is needed.
    ///
    /// Returns `Ok(())` on cancellation and `Err(RestartRequested)` when the
    /// automation environment must be rebuilt. Isolated sessions are closed
    /// either way.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), RelayError> {
        info!(pairs = self.pairs.len(), "relay running");
        for pair in &self.pairs {
            info!(source = %pair.source, destination = %pair.destination, "watching {}", pair.label());
        }

        let result = loop {
            tokio::select! {
                cycle = self.run_cycle() => match cycle {
                    Ok(_) => {}
                    Err(e @ RelayError::RestartRequested { .. }) => break Err(e),
                    Err(e) => error!(error = %e, "poll cycle failed"),
                },
                _ = cancel.cancelled() => break Ok(()),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.cycle_pause()) => {}
                _ = cancel.cancelled() => break Ok(()),
            }
        };

        self.relay.rotation().close().await;
        match &result {
            Ok(()) => info!("relay stopped"),
            Err(e) => warn!(error = %e, "relay stopping for restart"),
        }
        result
    }
}
