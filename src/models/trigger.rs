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

//! Trigger Model
//!
//! A trigger is the durable handoff record between two modules: "module A
//! finished something module B should react to". Triggers move through a
//! small state machine and are the only coordination primitive between
//! modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::module::ModuleName;
use crate::retry::DEFAULT_MAX_ATTEMPTS;

/// Lifecycle status of a trigger.
///
/// Legal transitions:
///
/// ```text
/// Pending -> Processing -> Completed
///                       -> Failed -> Pending   (explicit retry re-queue)
/// Pending -> Cancelled                         (tenant deprovisioning)
/// ```
///
/// `Cancelled` is terminal and distinct from `Failed`: cancelled triggers
/// were never attempted and are never retried. `Failed` becomes effectively
/// terminal once `retry_count` reaches `max_retries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TriggerStatus {
    /// The stored (capitalized) form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerStatus::Pending => "Pending",
            TriggerStatus::Processing => "Processing",
            TriggerStatus::Completed => "Completed",
            TriggerStatus::Failed => "Failed",
            TriggerStatus::Cancelled => "Cancelled",
        }
    }

    /// True for statuses no transition ever leaves.
    ///
    /// `Failed` is not listed: it can be re-queued to `Pending` until the
    /// retry cap is reached, which only the dispatcher decides.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TriggerStatus::Completed | TriggerStatus::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    ///
    /// The store enforces this with guarded updates; this method is the
    /// single written-down form of the state machine.
    pub fn can_transition_to(&self, next: TriggerStatus) -> bool {
        use TriggerStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Cancelled)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Failed, Pending)
        )
    }
}

impl fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TriggerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(TriggerStatus::Pending),
            "Processing" => Ok(TriggerStatus::Processing),
            "Completed" => Ok(TriggerStatus::Completed),
            "Failed" => Ok(TriggerStatus::Failed),
            "Cancelled" => Ok(TriggerStatus::Cancelled),
            other => Err(format!("unknown trigger status: {}", other)),
        }
    }
}

/// A cross-module trigger record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique identifier for the trigger
    pub id: UniversalUuid,
    /// Tenant that owns this trigger; every read and write is scoped by it
    pub tenant_id: UniversalUuid,
    /// Module that emitted the trigger
    pub source_module: ModuleName,
    /// Module whose handler will process the trigger
    pub target_module: ModuleName,
    /// Event kind within the source/target contract (e.g. "culture_engagement")
    pub trigger_type: String,
    /// Opaque JSON payload; its shape is owned by the emitter/handler pair
    pub payload: serde_json::Value,
    /// Current lifecycle status
    pub status: TriggerStatus,
    /// Failure reason from the most recent attempt; cleared on success
    pub error_message: Option<String>,
    /// Number of failed attempts so far
    pub retry_count: i32,
    /// Retry cap recorded at creation time
    pub max_retries: i32,
    /// Trigger that caused this one, for chained workflows; the idempotency key
    pub parent_trigger_id: Option<UniversalUuid>,
    /// When the dispatcher claimed the trigger
    pub claimed_at: Option<UniversalTimestamp>,
    /// When processing finished (success or failure)
    pub processed_at: Option<UniversalTimestamp>,
    /// Earliest time a re-queued trigger becomes claimable again
    pub retry_at: Option<UniversalTimestamp>,
    /// When the trigger was created; FIFO dispatch orders by this
    pub created_at: UniversalTimestamp,
    /// When the record was last updated
    pub updated_at: UniversalTimestamp,
}

impl Trigger {
    /// True once the retry cap is reached; a failed trigger in this state
    /// is never re-queued.
    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

/// A trigger to be created.
///
/// Built by emitters (or by the dispatcher when materializing handler child
/// requests). Status is always `Pending` at insert; the store rejects nil
/// tenant ids and null payloads before writing anything.
#[derive(Debug, Clone)]
pub struct NewTrigger {
    /// Owning tenant
    pub tenant_id: UniversalUuid,
    /// Emitting module
    pub source_module: ModuleName,
    /// Handling module
    pub target_module: ModuleName,
    /// Event kind within the source/target contract
    pub trigger_type: String,
    /// Opaque JSON payload
    pub payload: serde_json::Value,
    /// Parent trigger for chained workflows
    pub parent_trigger_id: Option<UniversalUuid>,
    /// Retry cap for this trigger
    pub max_retries: i32,
}

impl NewTrigger {
    pub fn new(
        tenant_id: UniversalUuid,
        source_module: ModuleName,
        target_module: ModuleName,
        trigger_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            tenant_id,
            source_module,
            target_module,
            trigger_type: trigger_type.into(),
            payload,
            parent_trigger_id: None,
            max_retries: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_parent(mut self, parent_trigger_id: UniversalUuid) -> Self {
        self.parent_trigger_id = Some(parent_trigger_id);
        self
    }
}

/// A (tenant, target module) pair with claimable pending work.
///
/// The dispatcher services every route returned by the store each cycle, so
/// no tenant or module can starve another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TriggerRoute {
    pub tenant_id: UniversalUuid,
    pub target_module: ModuleName,
}

/// Result of a claim attempt.
///
/// Losing the compare-and-set race is an expected outcome under concurrent
/// dispatch, not an error.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// This worker won the claim; the trigger is now `Processing`.
    Claimed(Trigger),
    /// The trigger exists but was not `Pending` (someone else claimed it,
    /// or it already reached a terminal status).
    Conflict,
}
