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

//! Diesel schema definitions, split per backend.
//!
//! The two backends store the same logical tables with different column
//! types: PostgreSQL uses native `UUID`/`TIMESTAMP` columns while SQLite
//! stores UUIDs as 16-byte BLOBs and timestamps as RFC 3339 text. Column
//! order here must match the migrations exactly; Diesel maps `Queryable`
//! structs positionally.

/// PostgreSQL table definitions.
pub mod postgres {
    diesel::table! {
        triggers (id) {
            id -> Uuid,
            tenant_id -> Uuid,
            source_module -> Text,
            target_module -> Text,
            trigger_type -> Text,
            payload -> Text,
            status -> Text,
            error_message -> Nullable<Text>,
            retry_count -> Int4,
            max_retries -> Int4,
            parent_trigger_id -> Nullable<Uuid>,
            claimed_at -> Nullable<Timestamp>,
            processed_at -> Nullable<Timestamp>,
            retry_at -> Nullable<Timestamp>,
            created_at -> Timestamp,
            updated_at -> Timestamp,
        }
    }

    diesel::table! {
        analysis_results (id) {
            id -> Uuid,
            tenant_id -> Uuid,
            employee_id -> Uuid,
            module -> Text,
            triggered_by -> Nullable<Uuid>,
            summary -> Text,
            insights -> Text,
            recommendations -> Text,
            confidence -> Float8,
            created_at -> Timestamp,
        }
    }

    diesel::allow_tables_to_appear_in_same_query!(triggers, analysis_results);
}

/// SQLite table definitions.
pub mod sqlite {
    diesel::table! {
        triggers (id) {
            id -> Binary,
            tenant_id -> Binary,
            source_module -> Text,
            target_module -> Text,
            trigger_type -> Text,
            payload -> Text,
            status -> Text,
            error_message -> Nullable<Text>,
            retry_count -> Integer,
            max_retries -> Integer,
            parent_trigger_id -> Nullable<Binary>,
            claimed_at -> Nullable<Text>,
            processed_at -> Nullable<Text>,
            retry_at -> Nullable<Text>,
            created_at -> Text,
            updated_at -> Text,
        }
    }

    diesel::table! {
        analysis_results (id) {
            id -> Binary,
            tenant_id -> Binary,
            employee_id -> Binary,
            module -> Text,
            triggered_by -> Nullable<Binary>,
            summary -> Text,
            insights -> Text,
            recommendations -> Text,
            confidence -> Double,
            created_at -> Text,
        }
    }

    diesel::allow_tables_to_appear_in_same_query!(triggers, analysis_results);
}
