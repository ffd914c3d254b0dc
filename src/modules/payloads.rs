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

//! Trigger-type vocabulary and payload shapes
//!
//! Payloads are opaque JSON at the store level; these are the typed shapes
//! the built-in handlers parse them into. The constants are the trigger
//! types those handlers accept — anything else is rejected with
//! `UnsupportedTriggerType` rather than guessed at.

use serde::{Deserialize, Serialize};

use crate::database::universal_types::UniversalUuid;
use crate::workflows::structure::RecommendationPriority;

/// Culture survey fan-out: recognition analysis request.
pub const CULTURE_RECOGNITION: &str = "culture_recognition";

/// Culture survey fan-out: engagement analysis request.
pub const CULTURE_ENGAGEMENT: &str = "culture_engagement";

/// Structure review found a staffing gap for hiring to plan against.
pub const POSITION_GAP_IDENTIFIED: &str = "position_gap_identified";

/// Performance review cycle requesting prioritized inputs from a module.
pub const PERFORMANCE_INPUTS_REQUESTED: &str = "performance_inputs_requested";

/// Hiring's chained request for a role requirements profile from skills.
pub const ROLE_REQUIREMENTS_PROFILE: &str = "role_requirements_profile";

/// Payload of the culture survey fan-out triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySignal {
    /// Employee who completed the survey
    pub employee_id: UniversalUuid,
    /// Survey instance the scores came from
    pub survey_id: String,
    /// Aggregate survey score
    pub overall_score: f64,
}

/// Payload of a `position_gap_identified` trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionGap {
    /// Manager or analyst the gap was identified for
    pub requested_by: UniversalUuid,
    /// Department carrying the gap
    pub department: String,
    /// Role title to hire for
    pub role_title: String,
    /// Urgency inherited from the structure recommendation
    pub priority: RecommendationPriority,
}

/// Payload of a `role_requirements_profile` trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleProfileRequest {
    /// Requester the profile is attributed to
    pub requested_by: UniversalUuid,
    /// Role title to profile
    pub role_title: String,
}

/// Payload of a `performance_inputs_requested` trigger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewCycleInputs {
    /// Employee under review
    pub employee_id: UniversalUuid,
    /// Review cycle the inputs feed, e.g. "2025-H2"
    pub cycle_id: String,
}
