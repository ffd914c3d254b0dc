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

//! PostgreSQL-specific database models
//!
//! This module contains Diesel model definitions that use native PostgreSQL
//! types. These models are used internally by the PostgreSQL DAL paths and
//! converted to/from domain types at the DAL boundary.

use crate::database::schema::postgres::*;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::models::analysis_result::AnalysisResult;
use crate::models::trigger::Trigger;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

// ============================================================================
// Trigger Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = triggers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PgTrigger {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub source_module: String,
    pub target_module: String,
    pub trigger_type: String,
    pub payload: String,
    pub status: String,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub parent_trigger_id: Option<Uuid>,
    pub claimed_at: Option<NaiveDateTime>,
    pub processed_at: Option<NaiveDateTime>,
    pub retry_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = triggers)]
pub struct NewPgTrigger {
    pub tenant_id: Uuid,
    pub source_module: String,
    pub target_module: String,
    pub trigger_type: String,
    pub payload: String,
    pub status: String,
    pub max_retries: i32,
    pub parent_trigger_id: Option<Uuid>,
}

// ============================================================================
// Analysis Result Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = analysis_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PgAnalysisResult {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub module: String,
    pub triggered_by: Option<Uuid>,
    pub summary: String,
    pub insights: String,
    pub recommendations: String,
    pub confidence: f64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = analysis_results)]
pub struct NewPgAnalysisResult {
    pub tenant_id: Uuid,
    pub employee_id: Uuid,
    pub module: String,
    pub triggered_by: Option<Uuid>,
    pub summary: String,
    pub insights: String,
    pub recommendations: String,
    pub confidence: f64,
}

// ============================================================================
// Conversion to Domain Types
// ============================================================================

impl From<PgTrigger> for Trigger {
    fn from(pg: PgTrigger) -> Self {
        Trigger {
            id: UniversalUuid(pg.id),
            tenant_id: UniversalUuid(pg.tenant_id),
            source_module: pg
                .source_module
                .parse()
                .expect("Invalid module name in database"),
            target_module: pg
                .target_module
                .parse()
                .expect("Invalid module name in database"),
            trigger_type: pg.trigger_type,
            payload: serde_json::from_str(&pg.payload).expect("Invalid JSON payload in database"),
            status: pg.status.parse().expect("Invalid trigger status in database"),
            error_message: pg.error_message,
            retry_count: pg.retry_count,
            max_retries: pg.max_retries,
            parent_trigger_id: pg.parent_trigger_id.map(UniversalUuid),
            claimed_at: pg.claimed_at.map(UniversalTimestamp::from_naive),
            processed_at: pg.processed_at.map(UniversalTimestamp::from_naive),
            retry_at: pg.retry_at.map(UniversalTimestamp::from_naive),
            created_at: UniversalTimestamp::from_naive(pg.created_at),
            updated_at: UniversalTimestamp::from_naive(pg.updated_at),
        }
    }
}

impl From<PgAnalysisResult> for AnalysisResult {
    fn from(pg: PgAnalysisResult) -> Self {
        AnalysisResult {
            id: UniversalUuid(pg.id),
            tenant_id: UniversalUuid(pg.tenant_id),
            employee_id: UniversalUuid(pg.employee_id),
            module: pg.module.parse().expect("Invalid module name in database"),
            triggered_by: pg.triggered_by.map(UniversalUuid),
            summary: pg.summary,
            insights: serde_json::from_str(&pg.insights)
                .expect("Invalid insights list in database"),
            recommendations: serde_json::from_str(&pg.recommendations)
                .expect("Invalid recommendations list in database"),
            confidence: pg.confidence,
            created_at: UniversalTimestamp::from_naive(pg.created_at),
        }
    }
}
