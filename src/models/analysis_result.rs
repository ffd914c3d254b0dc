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

//! Analysis Result Model
//!
//! The per-module output of handler processing. Results accumulate as a
//! history per (tenant, employee, module); the aggregator reads the newest
//! entry past a watermark, never a join against triggers.

use serde::{Deserialize, Serialize};

use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::module::ModuleName;

/// A stored analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Unique identifier for the result
    pub id: UniversalUuid,
    /// Tenant that owns this result
    pub tenant_id: UniversalUuid,
    /// Employee the analysis concerns
    pub employee_id: UniversalUuid,
    /// Module that produced the result
    pub module: ModuleName,
    /// Trigger whose processing produced this result; the idempotency key
    pub triggered_by: Option<UniversalUuid>,
    /// One-line human-readable summary
    pub summary: String,
    /// Analysis insights
    pub insights: Vec<String>,
    /// Recommended actions
    pub recommendations: Vec<String>,
    /// Reasoning confidence in [0, 1]
    pub confidence: f64,
    /// When the result was recorded; the aggregator compares against this
    pub created_at: UniversalTimestamp,
}

/// An analysis result to be recorded.
///
/// Handlers build these; the dispatcher stamps `triggered_by` with the
/// trigger being processed before persisting, so the idempotency key is
/// always present for dispatcher-written results.
#[derive(Debug, Clone)]
pub struct NewAnalysisResult {
    /// Owning tenant
    pub tenant_id: UniversalUuid,
    /// Employee the analysis concerns
    pub employee_id: UniversalUuid,
    /// Module producing the result
    pub module: ModuleName,
    /// Originating trigger, when known
    pub triggered_by: Option<UniversalUuid>,
    /// One-line human-readable summary
    pub summary: String,
    /// Analysis insights
    pub insights: Vec<String>,
    /// Recommended actions
    pub recommendations: Vec<String>,
    /// Reasoning confidence in [0, 1]
    pub confidence: f64,
}

impl NewAnalysisResult {
    pub fn new(
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        module: ModuleName,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id,
            employee_id,
            module,
            triggered_by: None,
            summary: summary.into(),
            insights: Vec::new(),
            recommendations: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn with_insights(mut self, insights: Vec<String>) -> Self {
        self.insights = insights;
        self
    }

    pub fn with_recommendations(mut self, recommendations: Vec<String>) -> Self {
        self.recommendations = recommendations;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_triggered_by(mut self, trigger_id: UniversalUuid) -> Self {
        self.triggered_by = Some(trigger_id);
        self
    }
}
