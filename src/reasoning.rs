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

//! Reasoning stage abstraction
//!
//! Module handlers delegate the analytical content of their results to a
//! reasoning stage: an external collaborator treated as a single bounded
//! call. The stage is a trait so deployments can plug in their own client;
//! [`StaticReasoner`] is the deterministic local implementation used as the
//! default wiring and in tests.

use async_trait::async_trait;
use serde_json::Value;

use crate::database::universal_types::UniversalUuid;
use crate::error::ReasoningError;
use crate::module::ModuleName;

/// Everything a reasoning stage needs to know about the trigger under
/// analysis, independent of the payload.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    /// Tenant that owns the trigger
    pub tenant_id: UniversalUuid,
    /// Employee the analysis is about
    pub employee_id: UniversalUuid,
    /// Module producing the result
    pub module: ModuleName,
    /// Trigger type being processed
    pub trigger_type: String,
}

/// Analysis content produced by the reasoning stage.
#[derive(Debug, Clone)]
pub struct Insight {
    /// Observations drawn from the payload
    pub insights: Vec<String>,
    /// Suggested follow-up actions
    pub recommendations: Vec<String>,
    /// Confidence in the analysis, 0.0 to 1.0
    pub confidence: f64,
}

/// A single bounded analysis call.
///
/// The dispatcher's handler timeout covers the whole handler invocation,
/// reasoning call included, so implementations need no deadline handling of
/// their own. [`ReasoningError::Unavailable`] failures are transient and
/// subject to the engine's retry policy; [`ReasoningError::Rejected`]
/// failures are permanent.
#[async_trait]
pub trait ReasoningStage: Send + Sync {
    /// Analyzes one trigger payload, producing the content of an analysis
    /// result.
    async fn analyze(
        &self,
        context: &AnalysisContext,
        payload: &Value,
    ) -> Result<Insight, ReasoningError>;
}

/// Deterministic reasoning stage with no external dependencies.
///
/// Derives its output mechanically from the context and payload, so the
/// same input always produces the same analysis. Used as the default engine
/// wiring and throughout the test suite.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticReasoner;

#[async_trait]
impl ReasoningStage for StaticReasoner {
    async fn analyze(
        &self,
        context: &AnalysisContext,
        payload: &Value,
    ) -> Result<Insight, ReasoningError> {
        let mut insights = vec![format!(
            "{} signal for employee {}",
            context.trigger_type, context.employee_id
        )];
        if let Some(score) = payload.get("overall_score").and_then(Value::as_f64) {
            insights.push(format!("overall score {:.1}", score));
        }

        Ok(Insight {
            insights,
            recommendations: vec![format!("review {} indicators", context.module)],
            confidence: 0.8,
        })
    }
}
