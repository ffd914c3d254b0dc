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

//! Structure review workflow
//!
//! The structure module's decision point: when an organization review
//! recommends adding a position with enough urgency, hiring gets involved
//! through a `position_gap_identified` trigger. Every other recommendation
//! kind and any low-priority add stays inside the structure module.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dal::DAL;
use crate::database::universal_types::UniversalUuid;
use crate::error::StoreError;
use crate::models::trigger::{NewTrigger, Trigger};
use crate::module::ModuleName;
use crate::modules::payloads::{self, PositionGap};

/// What a structure review recommends changing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    AddPosition,
    RemovePosition,
    Reassign,
    MergeTeams,
}

/// Urgency of a recommendation. Ordering follows declaration order:
/// `Low < Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// A single recommendation produced by a structure review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureRecommendation {
    pub tenant_id: UniversalUuid,
    /// The reviewer or review process that raised the recommendation.
    pub requested_by: UniversalUuid,
    pub department: String,
    pub role_title: String,
    pub kind: RecommendationKind,
    pub priority: RecommendationPriority,
}

/// Decides whether a structure recommendation warrants hiring involvement.
///
/// Emits exactly one `position_gap_identified` trigger to hiring when the
/// recommendation is `AddPosition` with priority above `Low`; otherwise
/// emits nothing. Returns the created trigger, if any, so callers can track
/// the downstream chain.
pub async fn handle_recommendation(
    dal: &DAL,
    recommendation: &StructureRecommendation,
) -> Result<Option<Trigger>, StoreError> {
    if recommendation.kind != RecommendationKind::AddPosition {
        debug!(
            "Recommendation {:?} for {} stays within structure, no trigger",
            recommendation.kind, recommendation.role_title
        );
        return Ok(None);
    }

    if recommendation.priority <= RecommendationPriority::Low {
        debug!(
            "Low priority add-position for {} not escalated to hiring",
            recommendation.role_title
        );
        return Ok(None);
    }

    let gap = PositionGap {
        requested_by: recommendation.requested_by,
        department: recommendation.department.clone(),
        role_title: recommendation.role_title.clone(),
        priority: recommendation.priority,
    };

    let trigger = dal
        .trigger()
        .create(NewTrigger::new(
            recommendation.tenant_id,
            ModuleName::Structure,
            ModuleName::Hiring,
            payloads::POSITION_GAP_IDENTIFIED,
            serde_json::to_value(&gap)?,
        ))
        .await?;

    info!(
        "Emitted position gap trigger {} for {} in {} (priority: {:?})",
        trigger.id, recommendation.role_title, recommendation.department, recommendation.priority
    );

    Ok(Some(trigger))
}
