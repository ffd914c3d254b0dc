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

//! Module handler contract
//!
//! A module handler is the processing side of a trigger route: the
//! dispatcher claims a trigger, looks up the handler registered for the
//! trigger's target module, and invokes it under a bounded timeout. The
//! handler returns what should happen next — analysis results to persist
//! and child triggers to enqueue — and the dispatcher materializes both,
//! so handlers stay free of persistence concerns and the idempotency
//! bookkeeping lives in exactly one place.

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::models::analysis_result::NewAnalysisResult;
use crate::models::trigger::Trigger;
use crate::module::ModuleName;

mod registry;

pub use registry::HandlerRegistry;

/// A child trigger requested by a handler.
///
/// Handlers describe only where the follow-up work goes; the dispatcher
/// stamps the tenant, the source module, and the parent trigger id when it
/// materializes the request into a stored trigger.
#[derive(Debug, Clone)]
pub struct TriggerRequest {
    /// Module that should process the follow-up
    pub target_module: ModuleName,
    /// Type tag of the follow-up trigger
    pub trigger_type: String,
    /// Opaque payload for the follow-up
    pub payload: serde_json::Value,
}

/// Everything a handler wants persisted after processing one trigger.
#[derive(Debug, Default)]
pub struct HandlerOutcome {
    /// Analysis results to store
    pub results: Vec<NewAnalysisResult>,
    /// Child triggers to enqueue
    pub child_triggers: Vec<TriggerRequest>,
}

/// Processing logic for one module.
///
/// Implementations must fail fast on trigger types they do not recognize
/// ([`HandlerError::UnsupportedTriggerType`]) rather than guessing, and
/// must be safe to re-invoke for the same trigger: the dispatcher
/// deduplicates persisted output by parent trigger id, so a retried
/// invocation that succeeds after a partial failure never double-writes.
#[async_trait]
pub trait ModuleHandler: Send + Sync {
    /// The module this handler serves. Also its registry key.
    fn module(&self) -> ModuleName;

    /// Processes one claimed trigger.
    async fn process(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError>;
}
