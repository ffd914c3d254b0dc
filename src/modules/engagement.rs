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

//! Engagement module handler
//!
//! Consumes the engagement half of the culture survey fan-out.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handler::{HandlerOutcome, ModuleHandler};
use crate::models::analysis_result::NewAnalysisResult;
use crate::models::trigger::Trigger;
use crate::module::ModuleName;
use crate::modules::payloads::{self, SurveySignal};
use crate::reasoning::{AnalysisContext, ReasoningStage};

/// Handler for `culture_engagement` triggers.
pub struct EngagementHandler {
    reasoner: Arc<dyn ReasoningStage>,
}

impl EngagementHandler {
    pub fn new(reasoner: Arc<dyn ReasoningStage>) -> Self {
        Self { reasoner }
    }
}

#[async_trait]
impl ModuleHandler for EngagementHandler {
    fn module(&self) -> ModuleName {
        ModuleName::Engagement
    }

    async fn process(&self, trigger: &Trigger) -> Result<HandlerOutcome, HandlerError> {
        if trigger.trigger_type != payloads::CULTURE_ENGAGEMENT {
            return Err(HandlerError::UnsupportedTriggerType {
                module: self.module(),
                trigger_type: trigger.trigger_type.clone(),
            });
        }

        let signal: SurveySignal = serde_json::from_value(trigger.payload.clone())
            .map_err(|e| HandlerError::InvalidPayload(e.to_string()))?;

        let context = AnalysisContext {
            tenant_id: trigger.tenant_id,
            employee_id: signal.employee_id,
            module: self.module(),
            trigger_type: trigger.trigger_type.clone(),
        };
        let insight = self.reasoner.analyze(&context, &trigger.payload).await?;

        let result = NewAnalysisResult::new(
            trigger.tenant_id,
            signal.employee_id,
            self.module(),
            format!("Engagement follow-ups from survey {}", signal.survey_id),
        )
        .with_insights(insight.insights)
        .with_recommendations(insight.recommendations)
        .with_confidence(insight.confidence);

        Ok(HandlerOutcome {
            results: vec![result],
            child_triggers: Vec::new(),
        })
    }
}
