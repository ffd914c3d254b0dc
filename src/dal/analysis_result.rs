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

//! Unified Analysis Result DAL with runtime backend selection
//!
//! This module persists the analysis results produced by module handlers
//! and serves the lookups the aggregator and workflows depend on: the
//! freshest result per (tenant, employee, module) and the
//! already-processed check used for idempotent re-dispatch.

use super::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::database::BackendType;
use crate::error::{StoreError, ValidationError};
use crate::models::analysis_result::{AnalysisResult, NewAnalysisResult};
use crate::module::ModuleName;
use diesel::prelude::*;
use uuid::Uuid;

/// Data access layer for analysis result operations with runtime backend
/// selection.
#[derive(Clone)]
pub struct AnalysisResultDAL<'a> {
    dal: &'a DAL,
}

impl<'a> AnalysisResultDAL<'a> {
    /// Creates a new AnalysisResultDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Persists a new analysis result.
    ///
    /// Rejects records with a nil tenant or employee id before touching
    /// the database.
    pub async fn create(&self, new_result: NewAnalysisResult) -> Result<AnalysisResult, StoreError> {
        if new_result.tenant_id.is_nil() {
            return Err(ValidationError::MissingTenantId.into());
        }
        if new_result.employee_id.is_nil() {
            return Err(ValidationError::MissingEmployeeId.into());
        }
        match self.dal.backend() {
            BackendType::Postgres => self.create_postgres(new_result).await,
            BackendType::Sqlite => self.create_sqlite(new_result).await,
        }
    }

    async fn create_postgres(
        &self,
        new_result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        use crate::dal::postgres_models::{NewPgAnalysisResult, PgAnalysisResult};
        use crate::database::schema::postgres::analysis_results;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let insights = serde_json::to_string(&new_result.insights)?;
        let recommendations = serde_json::to_string(&new_result.recommendations)?;
        let pg_new = NewPgAnalysisResult {
            tenant_id: new_result.tenant_id.0,
            employee_id: new_result.employee_id.0,
            module: new_result.module.as_str().to_string(),
            triggered_by: new_result.triggered_by.map(|u| u.0),
            summary: new_result.summary,
            insights,
            recommendations,
            confidence: new_result.confidence,
        };

        let pg_result: PgAnalysisResult = conn
            .interact(move |conn| {
                diesel::insert_into(analysis_results::table)
                    .values(&pg_new)
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_result.into())
    }

    async fn create_sqlite(
        &self,
        new_result: NewAnalysisResult,
    ) -> Result<AnalysisResult, StoreError> {
        use crate::dal::sqlite_models::{
            current_timestamp_string, uuid_to_blob, NewSqliteAnalysisResult, SqliteAnalysisResult,
        };
        use crate::database::schema::sqlite::analysis_results;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        // For SQLite, generate UUID and timestamps client-side
        let id = UniversalUuid::new_v4();
        let id_blob = uuid_to_blob(&id.0);

        let insights = serde_json::to_string(&new_result.insights)?;
        let recommendations = serde_json::to_string(&new_result.recommendations)?;
        let sqlite_new = NewSqliteAnalysisResult {
            id: id_blob.clone(),
            tenant_id: uuid_to_blob(&new_result.tenant_id.0),
            employee_id: uuid_to_blob(&new_result.employee_id.0),
            module: new_result.module.as_str().to_string(),
            triggered_by: new_result.triggered_by.map(|u| uuid_to_blob(&u.0)),
            summary: new_result.summary,
            insights,
            recommendations,
            confidence: new_result.confidence,
            created_at: current_timestamp_string(),
        };

        conn.interact(move |conn| {
            diesel::insert_into(analysis_results::table)
                .values(&sqlite_new)
                .execute(conn)
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        // Retrieve the inserted record
        let sqlite_result: SqliteAnalysisResult = conn
            .interact(move |conn| analysis_results::table.find(id_blob).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_result.into())
    }

    /// Retrieves the most recent analysis result for one employee and
    /// module, if any.
    ///
    /// When `since` is given, only results created strictly after that
    /// time are considered. The aggregator passes its watermark here so a
    /// stale result from an earlier workflow run is never mistaken for a
    /// fresh one.
    pub async fn latest_for_module(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        module: ModuleName,
        since: Option<UniversalTimestamp>,
    ) -> Result<Option<AnalysisResult>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => {
                self.latest_for_module_postgres(tenant_id, employee_id, module, since)
                    .await
            }
            BackendType::Sqlite => {
                self.latest_for_module_sqlite(tenant_id, employee_id, module, since)
                    .await
            }
        }
    }

    async fn latest_for_module_postgres(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        module: ModuleName,
        since: Option<UniversalTimestamp>,
    ) -> Result<Option<AnalysisResult>, StoreError> {
        use crate::dal::postgres_models::PgAnalysisResult;
        use crate::database::schema::postgres::analysis_results;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let employee_uuid: Uuid = employee_id.0;
        let module = module.as_str();
        let since_naive = since.map(|ts| ts.to_naive());
        let result: Option<PgAnalysisResult> = conn
            .interact(move |conn| {
                let mut query = analysis_results::table
                    .filter(analysis_results::tenant_id.eq(tenant_uuid))
                    .filter(analysis_results::employee_id.eq(employee_uuid))
                    .filter(analysis_results::module.eq(module))
                    .into_boxed();

                if let Some(since) = since_naive {
                    query = query.filter(analysis_results::created_at.gt(since));
                }

                query
                    .order(analysis_results::created_at.desc())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(result.map(Into::into))
    }

    async fn latest_for_module_sqlite(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        module: ModuleName,
        since: Option<UniversalTimestamp>,
    ) -> Result<Option<AnalysisResult>, StoreError> {
        use crate::dal::sqlite_models::{datetime_to_string, uuid_to_blob, SqliteAnalysisResult};
        use crate::database::schema::sqlite::analysis_results;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let employee_blob = uuid_to_blob(&employee_id.0);
        let module = module.as_str();
        let since_string = since.map(|ts| datetime_to_string(ts.as_datetime()));
        let result: Option<SqliteAnalysisResult> = conn
            .interact(move |conn| {
                let mut query = analysis_results::table
                    .filter(analysis_results::tenant_id.eq(tenant_blob))
                    .filter(analysis_results::employee_id.eq(employee_blob))
                    .filter(analysis_results::module.eq(module))
                    .into_boxed();

                if let Some(since) = since_string {
                    query = query.filter(analysis_results::created_at.gt(since));
                }

                query
                    .order(analysis_results::created_at.desc())
                    .first(conn)
                    .optional()
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(result.map(Into::into))
    }

    /// Returns whether a result produced by the given trigger already
    /// exists for a module.
    ///
    /// The dispatcher consults this before persisting handler output so a
    /// retried trigger never stores its results twice.
    pub async fn exists_for_trigger(
        &self,
        trigger_id: UniversalUuid,
        module: ModuleName,
    ) -> Result<bool, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.exists_for_trigger_postgres(trigger_id, module).await,
            BackendType::Sqlite => self.exists_for_trigger_sqlite(trigger_id, module).await,
        }
    }

    async fn exists_for_trigger_postgres(
        &self,
        trigger_id: UniversalUuid,
        module: ModuleName,
    ) -> Result<bool, StoreError> {
        use crate::database::schema::postgres::analysis_results;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let trigger_uuid: Uuid = trigger_id.0;
        let module = module.as_str();
        let count: i64 = conn
            .interact(move |conn| {
                analysis_results::table
                    .filter(analysis_results::triggered_by.eq(trigger_uuid))
                    .filter(analysis_results::module.eq(module))
                    .count()
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(count > 0)
    }

    async fn exists_for_trigger_sqlite(
        &self,
        trigger_id: UniversalUuid,
        module: ModuleName,
    ) -> Result<bool, StoreError> {
        use crate::dal::sqlite_models::uuid_to_blob;
        use crate::database::schema::sqlite::analysis_results;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let trigger_blob = uuid_to_blob(&trigger_id.0);
        let module = module.as_str();
        let count: i64 = conn
            .interact(move |conn| {
                analysis_results::table
                    .filter(analysis_results::triggered_by.eq(trigger_blob))
                    .filter(analysis_results::module.eq(module))
                    .count()
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(count > 0)
    }

    /// Retrieves an employee's analysis history across all modules, newest
    /// first.
    pub async fn list_for_employee(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => {
                self.list_for_employee_postgres(tenant_id, employee_id, limit)
                    .await
            }
            BackendType::Sqlite => {
                self.list_for_employee_sqlite(tenant_id, employee_id, limit)
                    .await
            }
        }
    }

    async fn list_for_employee_postgres(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        use crate::dal::postgres_models::PgAnalysisResult;
        use crate::database::schema::postgres::analysis_results;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let employee_uuid: Uuid = employee_id.0;
        let pg_results: Vec<PgAnalysisResult> = conn
            .interact(move |conn| {
                analysis_results::table
                    .filter(analysis_results::tenant_id.eq(tenant_uuid))
                    .filter(analysis_results::employee_id.eq(employee_uuid))
                    .order(analysis_results::created_at.desc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_results.into_iter().map(Into::into).collect())
    }

    async fn list_for_employee_sqlite(
        &self,
        tenant_id: UniversalUuid,
        employee_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<AnalysisResult>, StoreError> {
        use crate::dal::sqlite_models::{uuid_to_blob, SqliteAnalysisResult};
        use crate::database::schema::sqlite::analysis_results;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let employee_blob = uuid_to_blob(&employee_id.0);
        let sqlite_results: Vec<SqliteAnalysisResult> = conn
            .interact(move |conn| {
                analysis_results::table
                    .filter(analysis_results::tenant_id.eq(tenant_blob))
                    .filter(analysis_results::employee_id.eq(employee_blob))
                    .order(analysis_results::created_at.desc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_results.into_iter().map(Into::into).collect())
    }
}
