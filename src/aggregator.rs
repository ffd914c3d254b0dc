/*
 *  Copyright 2025 Colliery Software
 *
 *  Licensed under the Apache License, Version 2.0 (the "License");
 *  you may not use this file except in compliance with the License.
 *  You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 *  Unless required by applicable law or agreed to in writing, software
 *  distributed under the License is distributed on an "AS IS" BASIS,
 *  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  See the License for the specific language governing permissions and
 *  limitations under the License.
 */

//! Result Aggregator Module
//!
//! Workflows that fan out triggers to several modules use the aggregator to
//! stitch the asynchronously produced analysis results back into a single
//! outcome. There is no push-based completion signal; the aggregator polls
//! each requested module's latest result at a fixed interval until either
//! all results are present or the deadline elapses.
//!
//! On deadline expiry the aggregator returns whatever subset it has,
//! naming the missing modules, rather than blocking indefinitely or failing
//! the whole workflow. Callers branch on [`AggregateOutcome::is_partial`].

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time;
use tracing::{debug, warn};

use crate::dal::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::error::StoreError;
use crate::models::analysis_result::AnalysisResult;
use crate::module::ModuleName;

/// The collected results of a bounded aggregation wait.
///
/// `results` holds the latest qualifying result per module that produced one
/// within the deadline; `missing` names the modules that did not, in the
/// order they were requested.
#[derive(Debug)]
pub struct AggregateOutcome {
    /// Latest result per requested module, keyed by module name
    pub results: HashMap<ModuleName, AnalysisResult>,
    /// Requested modules with no qualifying result at deadline expiry
    pub missing: Vec<ModuleName>,
}

impl AggregateOutcome {
    /// Returns true when at least one requested module produced no result
    /// before the deadline.
    pub fn is_partial(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Polls per-module result stores with a deadline and partial-result
/// fallback.
///
/// The aggregator is cheap to construct and holds only a DAL clone; workflow
/// code typically creates one per fan-in step via the engine facade.
#[derive(Clone)]
pub struct ResultAggregator {
    dal: DAL,
    poll_interval: Duration,
}

impl ResultAggregator {
    /// Creates an aggregator with the default 250ms poll interval.
    pub fn new(dal: DAL) -> Self {
        Self {
            dal,
            poll_interval: Duration::from_millis(250),
        }
    }

    /// Overrides the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Waits until every requested module has a result newer than `since`,
    /// or until the deadline elapses.
    ///
    /// The first check happens immediately, so results that are already
    /// present return without any sleep. Between checks the aggregator
    /// sleeps `min(poll_interval, remaining)`, which keeps the total wait
    /// from overshooting the deadline by more than one query round. An
    /// empty module list completes immediately.
    ///
    /// `since` is the workflow's start-time watermark: pass the timestamp
    /// recorded when the fan-out triggers were created so stale results from
    /// earlier runs are not mistaken for fresh ones. `None` accepts any
    /// recorded result.
    pub async fn wait_for_results(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        modules: &[ModuleName],
        since: Option<UniversalTimestamp>,
        deadline: Duration,
    ) -> Result<AggregateOutcome, StoreError> {
        let start_time = Instant::now();
        let mut results: HashMap<ModuleName, AnalysisResult> = HashMap::new();

        loop {
            for module in modules {
                if results.contains_key(module) {
                    continue;
                }

                if let Some(result) = self
                    .dal
                    .analysis_result()
                    .latest_for_module(tenant_id, employee_id, *module, since)
                    .await?
                {
                    debug!(
                        "Collected {} result for employee {} ({} of {})",
                        module,
                        employee_id,
                        results.len() + 1,
                        modules.len()
                    );
                    results.insert(*module, result);
                }
            }

            if modules.iter().all(|module| results.contains_key(module)) {
                return Ok(AggregateOutcome {
                    results,
                    missing: Vec::new(),
                });
            }

            let elapsed = start_time.elapsed();
            if elapsed >= deadline {
                let missing: Vec<ModuleName> = modules
                    .iter()
                    .filter(|module| !results.contains_key(module))
                    .copied()
                    .collect();

                warn!(
                    "Aggregation deadline expired for employee {} with {} of {} results (missing: {:?})",
                    employee_id,
                    results.len(),
                    modules.len(),
                    missing
                );

                return Ok(AggregateOutcome { results, missing });
            }

            let remaining = deadline - elapsed;
            time::sleep(self.poll_interval.min(remaining)).await;
        }
    }
}
