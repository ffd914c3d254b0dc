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

//! SQLite-specific database models
//!
//! This module contains Diesel model definitions that use SQLite-compatible
//! types: UUIDs are stored as 16-byte BLOBs and timestamps as RFC 3339 text.
//! These models are used internally by the SQLite DAL paths and converted
//! to/from domain types at the DAL boundary.

use crate::database::schema::sqlite::*;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::models::analysis_result::AnalysisResult;
use crate::models::trigger::Trigger;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

// ============================================================================
// Conversion Utilities
// ============================================================================

/// Convert a UUID to a byte vector for SQLite BLOB storage.
pub fn uuid_to_blob(uuid: &Uuid) -> Vec<u8> {
    uuid.as_bytes().to_vec()
}

/// Convert a byte vector from SQLite BLOB storage back to a UUID.
pub fn blob_to_uuid(blob: &[u8]) -> Result<Uuid, uuid::Error> {
    Uuid::from_slice(blob)
}

/// Convert a datetime to RFC 3339 text for SQLite storage.
pub fn datetime_to_string(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse RFC 3339 text from SQLite storage back to a datetime.
pub fn string_to_datetime(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&Utc))
}

/// Current timestamp as RFC 3339 text, for client-side column values.
pub fn current_timestamp_string() -> String {
    Utc::now().to_rfc3339()
}

// ============================================================================
// Trigger Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = triggers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteTrigger {
    pub id: Vec<u8>,
    pub tenant_id: Vec<u8>,
    pub source_module: String,
    pub target_module: String,
    pub trigger_type: String,
    pub payload: String,
    pub status: String,
    pub error_message: Option<String>,
    pub retry_count: i32,
    pub max_retries: i32,
    pub parent_trigger_id: Option<Vec<u8>>,
    pub claimed_at: Option<String>,
    pub processed_at: Option<String>,
    pub retry_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = triggers)]
pub struct NewSqliteTrigger {
    pub id: Vec<u8>,
    pub tenant_id: Vec<u8>,
    pub source_module: String,
    pub target_module: String,
    pub trigger_type: String,
    pub payload: String,
    pub status: String,
    pub max_retries: i32,
    pub parent_trigger_id: Option<Vec<u8>>,
    pub created_at: String,
    pub updated_at: String,
}

// ============================================================================
// Analysis Result Models
// ============================================================================

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = analysis_results)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteAnalysisResult {
    pub id: Vec<u8>,
    pub tenant_id: Vec<u8>,
    pub employee_id: Vec<u8>,
    pub module: String,
    pub triggered_by: Option<Vec<u8>>,
    pub summary: String,
    pub insights: String,
    pub recommendations: String,
    pub confidence: f64,
    pub created_at: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = analysis_results)]
pub struct NewSqliteAnalysisResult {
    pub id: Vec<u8>,
    pub tenant_id: Vec<u8>,
    pub employee_id: Vec<u8>,
    pub module: String,
    pub triggered_by: Option<Vec<u8>>,
    pub summary: String,
    pub insights: String,
    pub recommendations: String,
    pub confidence: f64,
    pub created_at: String,
}

// ============================================================================
// Conversion to Domain Types
// ============================================================================

impl From<SqliteTrigger> for Trigger {
    fn from(sqlite: SqliteTrigger) -> Self {
        Trigger {
            id: UniversalUuid(blob_to_uuid(&sqlite.id).expect("Invalid UUID in database")),
            tenant_id: UniversalUuid(
                blob_to_uuid(&sqlite.tenant_id).expect("Invalid UUID in database"),
            ),
            source_module: sqlite
                .source_module
                .parse()
                .expect("Invalid module name in database"),
            target_module: sqlite
                .target_module
                .parse()
                .expect("Invalid module name in database"),
            trigger_type: sqlite.trigger_type,
            payload: serde_json::from_str(&sqlite.payload)
                .expect("Invalid JSON payload in database"),
            status: sqlite
                .status
                .parse()
                .expect("Invalid trigger status in database"),
            error_message: sqlite.error_message,
            retry_count: sqlite.retry_count,
            max_retries: sqlite.max_retries,
            parent_trigger_id: sqlite
                .parent_trigger_id
                .map(|blob| UniversalUuid(blob_to_uuid(&blob).expect("Invalid UUID in database"))),
            claimed_at: sqlite
                .claimed_at
                .map(|dt| UniversalTimestamp(string_to_datetime(&dt).expect("Invalid timestamp"))),
            processed_at: sqlite
                .processed_at
                .map(|dt| UniversalTimestamp(string_to_datetime(&dt).expect("Invalid timestamp"))),
            retry_at: sqlite
                .retry_at
                .map(|dt| UniversalTimestamp(string_to_datetime(&dt).expect("Invalid timestamp"))),
            created_at: UniversalTimestamp(
                string_to_datetime(&sqlite.created_at).expect("Invalid timestamp in database"),
            ),
            updated_at: UniversalTimestamp(
                string_to_datetime(&sqlite.updated_at).expect("Invalid timestamp in database"),
            ),
        }
    }
}

impl From<SqliteAnalysisResult> for AnalysisResult {
    fn from(sqlite: SqliteAnalysisResult) -> Self {
        AnalysisResult {
            id: UniversalUuid(blob_to_uuid(&sqlite.id).expect("Invalid UUID in database")),
            tenant_id: UniversalUuid(
                blob_to_uuid(&sqlite.tenant_id).expect("Invalid UUID in database"),
            ),
            employee_id: UniversalUuid(
                blob_to_uuid(&sqlite.employee_id).expect("Invalid UUID in database"),
            ),
            module: sqlite
                .module
                .parse()
                .expect("Invalid module name in database"),
            triggered_by: sqlite
                .triggered_by
                .map(|blob| UniversalUuid(blob_to_uuid(&blob).expect("Invalid UUID in database"))),
            summary: sqlite.summary,
            insights: serde_json::from_str(&sqlite.insights)
                .expect("Invalid insights list in database"),
            recommendations: serde_json::from_str(&sqlite.recommendations)
                .expect("Invalid recommendations list in database"),
            confidence: sqlite.confidence,
            created_at: UniversalTimestamp(
                string_to_datetime(&sqlite.created_at).expect("Invalid timestamp in database"),
            ),
        }
    }
}
