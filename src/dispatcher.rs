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

//! Trigger Dispatcher Module
//!
//! This module provides the dispatch loop at the center of the trigger engine.
//! The Dispatcher is responsible for:
//! - Polling the store for claimable triggers per (tenant, target module) route
//! - Claiming triggers through the store's compare-and-swap transition
//! - Invoking the matching module handler with timeout protection
//! - Persisting handler outcomes idempotently (results and chained triggers)
//! - Managing retry bookkeeping for failed triggers
//!
//! The dispatcher uses a semaphore to bound concurrent handler invocations.
//! Multiple dispatcher processes may poll the same store concurrently; the
//! claim transition guarantees each trigger is processed by exactly one of
//! them per attempt. A failure in one trigger never aborts the cycle for
//! the others.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::dal::DAL;
use crate::database::universal_types::UniversalTimestamp;
use crate::error::{DispatchError, StoreError};
use crate::handler::{HandlerOutcome, HandlerRegistry};
use crate::models::trigger::{ClaimOutcome, NewTrigger, Trigger};
use crate::retry::RetryPolicy;

/// Configuration for the trigger dispatcher
///
/// This struct defines the parameters that control the behavior of the
/// dispatch loop. It includes settings for concurrency, timeouts, polling
/// and the retry policy applied to failed triggers.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// How often the dispatcher polls the store for pending triggers.
    /// Lower values increase responsiveness but may increase database load.
    pub poll_interval: Duration,

    /// Maximum number of triggers fetched per (tenant, target module) route
    /// in a single poll cycle.
    pub batch_size: i64,

    /// Maximum number of concurrent handler invocations allowed at any
    /// given time. This controls the parallelism of trigger processing.
    pub max_concurrent_handlers: usize,

    /// Maximum time allowed for a single handler invocation before it is
    /// timed out and the trigger is marked failed.
    pub handler_timeout: Duration,

    /// How long the dispatch loop backs off after a persistence error
    /// before attempting the next poll cycle.
    pub error_backoff: Duration,

    /// Retry policy applied to failed triggers.
    pub retry_policy: RetryPolicy,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            batch_size: 10,
            max_concurrent_handlers: 4,
            handler_timeout: Duration::from_secs(30),
            error_backoff: Duration::from_secs(1),
            retry_policy: RetryPolicy::default(),
        }
    }
}

/// Dispatcher is the core component responsible for driving triggers through
/// their lifecycle.
///
/// It manages:
/// - Trigger claiming across all active (tenant, target module) routes
/// - Handler resolution and invocation with timeout protection
/// - Idempotent persistence of analysis results and chained triggers
/// - Retry scheduling and permanent-failure bookkeeping
///
/// The dispatcher maintains its own instance ID for logging so concurrent
/// dispatcher processes can be told apart in shared-store deployments.
pub struct Dispatcher {
    /// Data access layer for trigger and result persistence
    dal: DAL,
    /// Registry of module handlers keyed by target module
    registry: Arc<HandlerRegistry>,
    /// Unique identifier for this dispatcher instance
    instance_id: Uuid,
    /// Configuration parameters for dispatch behavior
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a new Dispatcher instance.
    ///
    /// # Arguments
    /// * `dal` - Data access layer backed by the shared trigger store
    /// * `registry` - Registry containing the module handlers to dispatch to
    /// * `config` - Configuration parameters for dispatch behavior
    pub fn new(dal: DAL, registry: Arc<HandlerRegistry>, config: DispatcherConfig) -> Self {
        Self {
            dal,
            registry,
            instance_id: Uuid::new_v4(),
            config,
        }
    }

    /// Starts the dispatcher's main polling loop.
    ///
    /// This method polls for and processes triggers until the enclosing task
    /// is cancelled (the engine facade races it against a shutdown signal).
    /// Persistence errors are logged and backed off; they never end the loop.
    pub async fn run(&self) -> Result<(), DispatchError> {
        info!("Starting trigger dispatcher (instance: {})", self.instance_id);

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent_handlers));
        let mut interval = time::interval(self.config.poll_interval);

        loop {
            interval.tick().await;

            // Only poll if we have available handler slots
            if semaphore.available_permits() == 0 {
                debug!("All handler slots busy, skipping poll");
                continue;
            }

            if let Err(e) = self.dispatch_cycle(&semaphore).await {
                error!("Dispatch cycle failed: {}", e);
                time::sleep(self.config.error_backoff).await;
            }
        }
    }

    /// Runs one poll cycle: fetch the active routes, then claim and dispatch
    /// a batch of due triggers per route.
    ///
    /// Claim conflicts (another dispatcher got there first) are skipped
    /// silently. The cycle returns early once the concurrency budget is
    /// exhausted; remaining triggers are picked up on a later cycle.
    async fn dispatch_cycle(&self, semaphore: &Arc<Semaphore>) -> Result<(), StoreError> {
        let routes = self.dal.trigger().pending_routes().await?;

        if routes.is_empty() {
            debug!("No pending triggers found");
            return Ok(());
        }

        for route in routes {
            let batch = self
                .dal
                .trigger()
                .get_pending(route.tenant_id, route.target_module, self.config.batch_size)
                .await?;

            for trigger in batch {
                let permit = match semaphore.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        debug!("All handler slots busy, deferring remaining triggers");
                        return Ok(());
                    }
                };

                match self.dal.trigger().claim(trigger.id).await? {
                    ClaimOutcome::Claimed(claimed) => {
                        info!(
                            "Trigger state change: Pending -> Processing (trigger: {}, type: {}, target: {})",
                            claimed.id, claimed.trigger_type, claimed.target_module
                        );

                        let dispatcher = self.clone();

                        // Process trigger in background, holding the permit
                        // until the handler and its bookkeeping complete
                        tokio::spawn(async move {
                            let _permit = permit;

                            if let Err(e) = dispatcher.process_trigger(claimed).await {
                                error!("Trigger processing failed: {}", e);
                            }
                        });
                    }
                    ClaimOutcome::Conflict => {
                        debug!(
                            "Trigger {} already claimed by another dispatcher",
                            trigger.id
                        );
                        drop(permit);
                    }
                }
            }
        }

        Ok(())
    }

    /// Drives a single claimed trigger to a terminal or retryable state.
    ///
    /// On handler success the outcome is persisted and the trigger marked
    /// completed. On handler error or timeout the trigger is marked failed
    /// and, when the retry policy allows, scheduled back to pending.
    ///
    /// # Returns
    /// An error only when the store itself rejects the bookkeeping writes;
    /// handler failures are absorbed into the trigger's retry state.
    async fn process_trigger(&self, trigger: Trigger) -> Result<(), DispatchError> {
        match self.invoke_handler(&trigger).await {
            Ok(outcome) => match self.persist_outcome(&trigger, outcome).await {
                Ok(()) => {
                    self.dal.trigger().mark_completed(trigger.id).await?;
                    info!(
                        "Trigger state change: Processing -> Completed (trigger: {}, type: {}, target: {})",
                        trigger.id, trigger.trigger_type, trigger.target_module
                    );
                    Ok(())
                }
                Err(e) => self.handle_failure(&trigger, DispatchError::Store(e)).await,
            },
            Err(error) => self.handle_failure(&trigger, error).await,
        }
    }

    /// Resolves the handler for the trigger's target module and invokes it
    /// with timeout protection.
    async fn invoke_handler(&self, trigger: &Trigger) -> Result<HandlerOutcome, DispatchError> {
        let handler = self
            .registry
            .get(trigger.target_module)
            .ok_or(DispatchError::NoHandler(trigger.target_module))?;

        match time::timeout(self.config.handler_timeout, handler.process(trigger)).await {
            Ok(result) => result.map_err(DispatchError::Handler),
            Err(_) => Err(DispatchError::HandlerTimeout(trigger.target_module)),
        }
    }

    /// Persists a handler outcome: analysis results first, then any chained
    /// child triggers.
    ///
    /// Both writes are idempotent against re-dispatch of the same trigger: a
    /// result already recorded for (trigger id, module) is skipped, as is a
    /// child trigger already present for this parent with the same target
    /// module and trigger type. A retried trigger therefore never duplicates
    /// the work of an earlier partial attempt.
    async fn persist_outcome(
        &self,
        trigger: &Trigger,
        outcome: HandlerOutcome,
    ) -> Result<(), StoreError> {
        for result in outcome.results {
            if self
                .dal
                .analysis_result()
                .exists_for_trigger(trigger.id, result.module)
                .await?
            {
                debug!(
                    "Result for (trigger: {}, module: {}) already recorded, skipping",
                    trigger.id, result.module
                );
                continue;
            }

            self.dal
                .analysis_result()
                .create(result.with_triggered_by(trigger.id))
                .await?;
        }

        if outcome.child_triggers.is_empty() {
            return Ok(());
        }

        let existing = self.dal.trigger().find_children(trigger.id).await?;
        for request in outcome.child_triggers {
            let duplicate = existing.iter().any(|child| {
                child.target_module == request.target_module
                    && child.trigger_type == request.trigger_type
            });
            if duplicate {
                debug!(
                    "Child trigger ({} -> {}) already present for parent {}, skipping",
                    request.trigger_type, request.target_module, trigger.id
                );
                continue;
            }

            let child = NewTrigger::new(
                trigger.tenant_id,
                trigger.target_module,
                request.target_module,
                request.trigger_type,
                request.payload,
            )
            .with_parent(trigger.id)
            .with_max_retries(trigger.max_retries);

            self.dal.trigger().create(child).await?;
        }

        Ok(())
    }

    /// Records a failed attempt and decides what happens next.
    ///
    /// The trigger is marked failed with the error message and an incremented
    /// retry count. If retries remain and the policy's conditions allow, the
    /// trigger is scheduled back to pending after the policy's backoff delay;
    /// otherwise it stays failed permanently and is left for monitoring to
    /// surface via `list_failed` / `count_by_status`.
    async fn handle_failure(
        &self,
        trigger: &Trigger,
        error: DispatchError,
    ) -> Result<(), DispatchError> {
        error!(
            "Handler invocation failed: {} (trigger: {}, type: {}, target: {})",
            error, trigger.id, trigger.trigger_type, trigger.target_module
        );

        let failed = self
            .dal
            .trigger()
            .mark_failed(trigger.id, &error.to_string())
            .await?;

        if failed.retries_exhausted() {
            error!(
                "Trigger failed permanently after {} attempts: {} (target: {})",
                failed.retry_count, failed.id, failed.target_module
            );
            return Ok(());
        }

        if !self.config.retry_policy.conditions_allow(&error) {
            warn!(
                "Trigger failure is not retryable, leaving failed: {} ({})",
                failed.id, error
            );
            return Ok(());
        }

        let retry_delay = self.config.retry_policy.calculate_delay(failed.retry_count);
        let retry_at = UniversalTimestamp(Utc::now() + retry_delay);
        self.dal.trigger().schedule_retry(failed.id, retry_at).await?;

        info!(
            "Scheduled retry for trigger {} in {:?} (attempt {})",
            failed.id,
            retry_delay,
            failed.retry_count + 1
        );

        Ok(())
    }
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            dal: self.dal.clone(),
            registry: Arc::clone(&self.registry),
            instance_id: self.instance_id,
            config: self.config.clone(),
        }
    }
}
