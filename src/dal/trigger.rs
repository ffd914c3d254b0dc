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

//! Unified Trigger DAL with runtime backend selection
//!
//! This module provides the persistence operations for trigger records,
//! working with both PostgreSQL and SQLite backends. It owns the trigger
//! status state machine at the storage level: creation in `Pending`,
//! compare-and-swap claiming into `Processing`, terminal transitions to
//! `Completed` and `Cancelled`, and the `Failed` -> `Pending` re-queue
//! used for retries.

use super::DAL;
use crate::database::universal_types::{UniversalTimestamp, UniversalUuid};
use crate::database::BackendType;
use crate::error::{StoreError, ValidationError};
use crate::models::trigger::{ClaimOutcome, NewTrigger, Trigger, TriggerRoute, TriggerStatus};
use crate::module::ModuleName;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

/// Data access layer for trigger operations with runtime backend selection.
#[derive(Clone)]
pub struct TriggerDAL<'a> {
    dal: &'a DAL,
}

impl<'a> TriggerDAL<'a> {
    /// Creates a new TriggerDAL instance.
    pub fn new(dal: &'a DAL) -> Self {
        Self { dal }
    }

    /// Creates a new trigger record in the `Pending` state.
    ///
    /// Rejects requests with a nil tenant id or a null payload before
    /// touching the database.
    pub async fn create(&self, new_trigger: NewTrigger) -> Result<Trigger, StoreError> {
        if new_trigger.tenant_id.is_nil() {
            return Err(ValidationError::MissingTenantId.into());
        }
        if new_trigger.payload.is_null() {
            return Err(ValidationError::EmptyPayload.into());
        }
        match self.dal.backend() {
            BackendType::Postgres => self.create_postgres(new_trigger).await,
            BackendType::Sqlite => self.create_sqlite(new_trigger).await,
        }
    }

    async fn create_postgres(&self, new_trigger: NewTrigger) -> Result<Trigger, StoreError> {
        use crate::dal::postgres_models::{NewPgTrigger, PgTrigger};
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let payload = serde_json::to_string(&new_trigger.payload)?;
        let pg_new = NewPgTrigger {
            tenant_id: new_trigger.tenant_id.0,
            source_module: new_trigger.source_module.as_str().to_string(),
            target_module: new_trigger.target_module.as_str().to_string(),
            trigger_type: new_trigger.trigger_type,
            payload,
            status: TriggerStatus::Pending.as_str().to_string(),
            max_retries: new_trigger.max_retries,
            parent_trigger_id: new_trigger.parent_trigger_id.map(|u| u.0),
        };

        let pg_trigger: PgTrigger = conn
            .interact(move |conn| {
                diesel::insert_into(triggers::table)
                    .values(&pg_new)
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_trigger.into())
    }

    async fn create_sqlite(&self, new_trigger: NewTrigger) -> Result<Trigger, StoreError> {
        use crate::dal::sqlite_models::{
            current_timestamp_string, uuid_to_blob, NewSqliteTrigger, SqliteTrigger,
        };
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        // For SQLite, generate UUID and timestamps client-side
        let id = UniversalUuid::new_v4();
        let now = current_timestamp_string();
        let id_blob = uuid_to_blob(&id.0);

        let payload = serde_json::to_string(&new_trigger.payload)?;
        let sqlite_new = NewSqliteTrigger {
            id: id_blob.clone(),
            tenant_id: uuid_to_blob(&new_trigger.tenant_id.0),
            source_module: new_trigger.source_module.as_str().to_string(),
            target_module: new_trigger.target_module.as_str().to_string(),
            trigger_type: new_trigger.trigger_type,
            payload,
            status: TriggerStatus::Pending.as_str().to_string(),
            max_retries: new_trigger.max_retries,
            parent_trigger_id: new_trigger.parent_trigger_id.map(|u| uuid_to_blob(&u.0)),
            created_at: now.clone(),
            updated_at: now,
        };

        conn.interact(move |conn| {
            diesel::insert_into(triggers::table)
                .values(&sqlite_new)
                .execute(conn)
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        // Retrieve the inserted record
        let sqlite_trigger: SqliteTrigger = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_trigger.into())
    }

    /// Retrieves a trigger by its unique identifier.
    pub async fn get_by_id(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.get_by_id_postgres(id).await,
            BackendType::Sqlite => self.get_by_id_sqlite(id).await,
        }
    }

    async fn get_by_id_postgres(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let uuid_id: Uuid = id.0;
        let trigger: Option<PgTrigger> = conn
            .interact(move |conn| triggers::table.find(uuid_id).first(conn).optional())
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        trigger
            .map(Into::into)
            .ok_or(StoreError::TriggerNotFound(id))
    }

    async fn get_by_id_sqlite(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        use crate::dal::sqlite_models::{uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_blob = uuid_to_blob(&id.0);
        let trigger: Option<SqliteTrigger> = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn).optional())
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        trigger
            .map(Into::into)
            .ok_or(StoreError::TriggerNotFound(id))
    }

    /// Retrieves pending triggers for one tenant and target module, oldest
    /// first.
    ///
    /// Triggers scheduled for a future retry are excluded until their
    /// `retry_at` time has passed.
    pub async fn get_pending(
        &self,
        tenant_id: UniversalUuid,
        target_module: ModuleName,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => {
                self.get_pending_postgres(tenant_id, target_module, limit)
                    .await
            }
            BackendType::Sqlite => {
                self.get_pending_sqlite(tenant_id, target_module, limit)
                    .await
            }
        }
    }

    async fn get_pending_postgres(
        &self,
        tenant_id: UniversalUuid,
        target_module: ModuleName,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let module = target_module.as_str();
        let pg_triggers: Vec<PgTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_uuid))
                    .filter(triggers::target_module.eq(module))
                    .filter(triggers::status.eq("Pending"))
                    .filter(
                        triggers::retry_at
                            .is_null()
                            .or(triggers::retry_at.le(diesel::dsl::now)),
                    )
                    .order(triggers::created_at.asc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_triggers.into_iter().map(Into::into).collect())
    }

    async fn get_pending_sqlite(
        &self,
        tenant_id: UniversalUuid,
        target_module: ModuleName,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::sqlite_models::{current_timestamp_string, uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let module = target_module.as_str();
        let sqlite_triggers: Vec<SqliteTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_blob))
                    .filter(triggers::target_module.eq(module))
                    .filter(triggers::status.eq("Pending"))
                    .filter(
                        triggers::retry_at
                            .is_null()
                            .or(triggers::retry_at.le(current_timestamp_string())),
                    )
                    .order(triggers::created_at.asc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_triggers.into_iter().map(Into::into).collect())
    }

    /// Atomically claims a pending trigger for processing.
    ///
    /// The claim is a compare-and-swap on the status column: the row moves
    /// from `Pending` to `Processing` only if it is still `Pending`, so
    /// exactly one of any number of concurrent claimants wins. Losers get
    /// [`ClaimOutcome::Conflict`], which is an expected outcome rather than
    /// an error.
    pub async fn claim(&self, id: UniversalUuid) -> Result<ClaimOutcome, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.claim_postgres(id).await,
            BackendType::Sqlite => self.claim_sqlite(id).await,
        }
    }

    async fn claim_postgres(&self, id: UniversalUuid) -> Result<ClaimOutcome, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let uuid_id: Uuid = id.0;
        let rows = conn
            .interact(move |conn| {
                diesel::update(
                    triggers::table
                        .filter(triggers::id.eq(uuid_id))
                        .filter(triggers::status.eq("Pending")),
                )
                .set((
                    triggers::status.eq("Processing"),
                    triggers::claimed_at.eq(diesel::dsl::now),
                    triggers::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            let existing: Option<PgTrigger> = conn
                .interact(move |conn| triggers::table.find(uuid_id).first(conn).optional())
                .await
                .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;
            return match existing {
                Some(_) => Ok(ClaimOutcome::Conflict),
                None => Err(StoreError::TriggerNotFound(id)),
            };
        }

        let claimed: PgTrigger = conn
            .interact(move |conn| triggers::table.find(uuid_id).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(ClaimOutcome::Claimed(claimed.into()))
    }

    async fn claim_sqlite(&self, id: UniversalUuid) -> Result<ClaimOutcome, StoreError> {
        use crate::dal::sqlite_models::{current_timestamp_string, uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_blob = uuid_to_blob(&id.0);
        let now = current_timestamp_string();
        let update_blob = id_blob.clone();
        let rows = conn
            .interact(move |conn| {
                diesel::update(
                    triggers::table
                        .filter(triggers::id.eq(update_blob))
                        .filter(triggers::status.eq("Pending")),
                )
                .set((
                    triggers::status.eq("Processing"),
                    triggers::claimed_at.eq(now.clone()),
                    triggers::updated_at.eq(now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            let check_blob = id_blob.clone();
            let existing: Option<SqliteTrigger> = conn
                .interact(move |conn| triggers::table.find(check_blob).first(conn).optional())
                .await
                .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;
            return match existing {
                Some(_) => Ok(ClaimOutcome::Conflict),
                None => Err(StoreError::TriggerNotFound(id)),
            };
        }

        let claimed: SqliteTrigger = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(ClaimOutcome::Claimed(claimed.into()))
    }

    /// Marks a processing trigger as successfully completed.
    ///
    /// Sets `processed_at` and clears any error message left over from
    /// earlier failed attempts.
    pub async fn mark_completed(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.mark_completed_postgres(id).await,
            BackendType::Sqlite => self.mark_completed_sqlite(id).await,
        }
    }

    async fn mark_completed_postgres(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let uuid_id: Uuid = id.0;
        let rows = conn
            .interact(move |conn| {
                diesel::update(triggers::table.find(uuid_id))
                    .set((
                        triggers::status.eq("Completed"),
                        triggers::error_message.eq(None::<String>),
                        triggers::processed_at.eq(diesel::dsl::now),
                        triggers::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            return Err(StoreError::TriggerNotFound(id));
        }

        let updated: PgTrigger = conn
            .interact(move |conn| triggers::table.find(uuid_id).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(updated.into())
    }

    async fn mark_completed_sqlite(&self, id: UniversalUuid) -> Result<Trigger, StoreError> {
        use crate::dal::sqlite_models::{current_timestamp_string, uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_blob = uuid_to_blob(&id.0);
        let now = current_timestamp_string();
        let update_blob = id_blob.clone();
        let rows = conn
            .interact(move |conn| {
                diesel::update(triggers::table.find(update_blob))
                    .set((
                        triggers::status.eq("Completed"),
                        triggers::error_message.eq(None::<String>),
                        triggers::processed_at.eq(now.clone()),
                        triggers::updated_at.eq(now),
                    ))
                    .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            return Err(StoreError::TriggerNotFound(id));
        }

        let updated: SqliteTrigger = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(updated.into())
    }

    /// Marks a processing trigger as failed, recording the error and
    /// incrementing its retry count.
    pub async fn mark_failed(&self, id: UniversalUuid, error: &str) -> Result<Trigger, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.mark_failed_postgres(id, error).await,
            BackendType::Sqlite => self.mark_failed_sqlite(id, error).await,
        }
    }

    async fn mark_failed_postgres(
        &self,
        id: UniversalUuid,
        error: &str,
    ) -> Result<Trigger, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let uuid_id: Uuid = id.0;
        let error = error.to_string();
        let rows = conn
            .interact(move |conn| {
                diesel::update(triggers::table.find(uuid_id))
                    .set((
                        triggers::status.eq("Failed"),
                        triggers::error_message.eq(error),
                        triggers::retry_count.eq(triggers::retry_count + 1),
                        triggers::processed_at.eq(diesel::dsl::now),
                        triggers::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            return Err(StoreError::TriggerNotFound(id));
        }

        let updated: PgTrigger = conn
            .interact(move |conn| triggers::table.find(uuid_id).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(updated.into())
    }

    async fn mark_failed_sqlite(
        &self,
        id: UniversalUuid,
        error: &str,
    ) -> Result<Trigger, StoreError> {
        use crate::dal::sqlite_models::{current_timestamp_string, uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_blob = uuid_to_blob(&id.0);
        let now = current_timestamp_string();
        let error = error.to_string();
        let update_blob = id_blob.clone();
        let rows = conn
            .interact(move |conn| {
                diesel::update(triggers::table.find(update_blob))
                    .set((
                        triggers::status.eq("Failed"),
                        triggers::error_message.eq(error),
                        triggers::retry_count.eq(triggers::retry_count + 1),
                        triggers::processed_at.eq(now.clone()),
                        triggers::updated_at.eq(now),
                    ))
                    .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        if rows == 0 {
            return Err(StoreError::TriggerNotFound(id));
        }

        let updated: SqliteTrigger = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn))
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(updated.into())
    }

    /// Re-queues a failed trigger for another attempt after a backoff delay.
    ///
    /// Moves the row from `Failed` back to `Pending` with `retry_at` set,
    /// clearing the claim and processing timestamps. The retry count
    /// recorded by [`mark_failed`](Self::mark_failed) is preserved. If the
    /// trigger has already left the `Failed` state this is a no-op and the
    /// current row is returned unchanged.
    pub async fn schedule_retry(
        &self,
        id: UniversalUuid,
        retry_at: UniversalTimestamp,
    ) -> Result<Trigger, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.schedule_retry_postgres(id, retry_at).await,
            BackendType::Sqlite => self.schedule_retry_sqlite(id, retry_at).await,
        }
    }

    async fn schedule_retry_postgres(
        &self,
        id: UniversalUuid,
        retry_at: UniversalTimestamp,
    ) -> Result<Trigger, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let uuid_id: Uuid = id.0;
        let retry_naive = retry_at.to_naive();
        conn.interact(move |conn| {
            diesel::update(
                triggers::table
                    .filter(triggers::id.eq(uuid_id))
                    .filter(triggers::status.eq("Failed")),
            )
            .set((
                triggers::status.eq("Pending"),
                triggers::retry_at.eq(retry_naive),
                triggers::claimed_at.eq(None::<NaiveDateTime>),
                triggers::processed_at.eq(None::<NaiveDateTime>),
                triggers::updated_at.eq(diesel::dsl::now),
            ))
            .execute(conn)
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        let trigger: Option<PgTrigger> = conn
            .interact(move |conn| triggers::table.find(uuid_id).first(conn).optional())
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        trigger
            .map(Into::into)
            .ok_or(StoreError::TriggerNotFound(id))
    }

    async fn schedule_retry_sqlite(
        &self,
        id: UniversalUuid,
        retry_at: UniversalTimestamp,
    ) -> Result<Trigger, StoreError> {
        use crate::dal::sqlite_models::{
            current_timestamp_string, datetime_to_string, uuid_to_blob, SqliteTrigger,
        };
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let id_blob = uuid_to_blob(&id.0);
        let retry_string = datetime_to_string(retry_at.as_datetime());
        let update_blob = id_blob.clone();
        conn.interact(move |conn| {
            diesel::update(
                triggers::table
                    .filter(triggers::id.eq(update_blob))
                    .filter(triggers::status.eq("Failed")),
            )
            .set((
                triggers::status.eq("Pending"),
                triggers::retry_at.eq(retry_string),
                triggers::claimed_at.eq(None::<String>),
                triggers::processed_at.eq(None::<String>),
                triggers::updated_at.eq(current_timestamp_string()),
            ))
            .execute(conn)
        })
        .await
        .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        let trigger: Option<SqliteTrigger> = conn
            .interact(move |conn| triggers::table.find(id_blob).first(conn).optional())
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        trigger
            .map(Into::into)
            .ok_or(StoreError::TriggerNotFound(id))
    }

    /// Cancels every pending trigger for a tenant, returning how many rows
    /// were cancelled.
    ///
    /// Only `Pending` rows are affected; triggers already claimed by a
    /// worker run to completion.
    pub async fn cancel_pending_for_tenant(
        &self,
        tenant_id: UniversalUuid,
    ) -> Result<usize, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.cancel_pending_for_tenant_postgres(tenant_id).await,
            BackendType::Sqlite => self.cancel_pending_for_tenant_sqlite(tenant_id).await,
        }
    }

    async fn cancel_pending_for_tenant_postgres(
        &self,
        tenant_id: UniversalUuid,
    ) -> Result<usize, StoreError> {
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let rows = conn
            .interact(move |conn| {
                diesel::update(
                    triggers::table
                        .filter(triggers::tenant_id.eq(tenant_uuid))
                        .filter(triggers::status.eq("Pending")),
                )
                .set((
                    triggers::status.eq("Cancelled"),
                    triggers::processed_at.eq(diesel::dsl::now),
                    triggers::updated_at.eq(diesel::dsl::now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(rows)
    }

    async fn cancel_pending_for_tenant_sqlite(
        &self,
        tenant_id: UniversalUuid,
    ) -> Result<usize, StoreError> {
        use crate::dal::sqlite_models::{current_timestamp_string, uuid_to_blob};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let now = current_timestamp_string();
        let rows = conn
            .interact(move |conn| {
                diesel::update(
                    triggers::table
                        .filter(triggers::tenant_id.eq(tenant_blob))
                        .filter(triggers::status.eq("Pending")),
                )
                .set((
                    triggers::status.eq("Cancelled"),
                    triggers::processed_at.eq(now.clone()),
                    triggers::updated_at.eq(now),
                ))
                .execute(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(rows)
    }

    /// Returns the distinct (tenant, target module) routes that currently
    /// have due pending triggers.
    ///
    /// The dispatcher polls this instead of scanning the whole table so a
    /// poll cycle only visits routes with work to do.
    pub async fn pending_routes(&self) -> Result<Vec<TriggerRoute>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.pending_routes_postgres().await,
            BackendType::Sqlite => self.pending_routes_sqlite().await,
        }
    }

    async fn pending_routes_postgres(&self) -> Result<Vec<TriggerRoute>, StoreError> {
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let rows: Vec<(Uuid, String)> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::status.eq("Pending"))
                    .filter(
                        triggers::retry_at
                            .is_null()
                            .or(triggers::retry_at.le(diesel::dsl::now)),
                    )
                    .select((triggers::tenant_id, triggers::target_module))
                    .distinct()
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(rows
            .into_iter()
            .map(|(tenant_id, target_module)| TriggerRoute {
                tenant_id: UniversalUuid(tenant_id),
                target_module: target_module
                    .parse()
                    .expect("Invalid module name in database"),
            })
            .collect())
    }

    async fn pending_routes_sqlite(&self) -> Result<Vec<TriggerRoute>, StoreError> {
        use crate::dal::sqlite_models::{blob_to_uuid, current_timestamp_string};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let rows: Vec<(Vec<u8>, String)> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::status.eq("Pending"))
                    .filter(
                        triggers::retry_at
                            .is_null()
                            .or(triggers::retry_at.le(current_timestamp_string())),
                    )
                    .select((triggers::tenant_id, triggers::target_module))
                    .distinct()
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(rows
            .into_iter()
            .map(|(tenant_blob, target_module)| TriggerRoute {
                tenant_id: UniversalUuid(
                    blob_to_uuid(&tenant_blob).expect("Invalid UUID in database"),
                ),
                target_module: target_module
                    .parse()
                    .expect("Invalid module name in database"),
            })
            .collect())
    }

    /// Retrieves the child triggers created while processing a parent
    /// trigger, oldest first.
    pub async fn find_children(
        &self,
        parent_id: UniversalUuid,
    ) -> Result<Vec<Trigger>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.find_children_postgres(parent_id).await,
            BackendType::Sqlite => self.find_children_sqlite(parent_id).await,
        }
    }

    async fn find_children_postgres(
        &self,
        parent_id: UniversalUuid,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let parent_uuid: Uuid = parent_id.0;
        let pg_triggers: Vec<PgTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::parent_trigger_id.eq(parent_uuid))
                    .order(triggers::created_at.asc())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_triggers.into_iter().map(Into::into).collect())
    }

    async fn find_children_sqlite(
        &self,
        parent_id: UniversalUuid,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::sqlite_models::{uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let parent_blob = uuid_to_blob(&parent_id.0);
        let sqlite_triggers: Vec<SqliteTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::parent_trigger_id.eq(parent_blob))
                    .order(triggers::created_at.asc())
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_triggers.into_iter().map(Into::into).collect())
    }

    /// Counts a tenant's triggers in the given status.
    pub async fn count_by_status(
        &self,
        tenant_id: UniversalUuid,
        status: TriggerStatus,
    ) -> Result<i64, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.count_by_status_postgres(tenant_id, status).await,
            BackendType::Sqlite => self.count_by_status_sqlite(tenant_id, status).await,
        }
    }

    async fn count_by_status_postgres(
        &self,
        tenant_id: UniversalUuid,
        status: TriggerStatus,
    ) -> Result<i64, StoreError> {
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let status = status.as_str();
        let count: i64 = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_uuid))
                    .filter(triggers::status.eq(status))
                    .count()
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(count)
    }

    async fn count_by_status_sqlite(
        &self,
        tenant_id: UniversalUuid,
        status: TriggerStatus,
    ) -> Result<i64, StoreError> {
        use crate::dal::sqlite_models::uuid_to_blob;
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let status = status.as_str();
        let count: i64 = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_blob))
                    .filter(triggers::status.eq(status))
                    .count()
                    .get_result(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(count)
    }

    /// Retrieves a tenant's failed triggers, most recently failed first.
    pub async fn list_failed(
        &self,
        tenant_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        match self.dal.backend() {
            BackendType::Postgres => self.list_failed_postgres(tenant_id, limit).await,
            BackendType::Sqlite => self.list_failed_sqlite(tenant_id, limit).await,
        }
    }

    async fn list_failed_postgres(
        &self,
        tenant_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::postgres_models::PgTrigger;
        use crate::database::schema::postgres::triggers;

        let conn = self
            .dal
            .database
            .get_connection_with_schema()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_uuid: Uuid = tenant_id.0;
        let pg_triggers: Vec<PgTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_uuid))
                    .filter(triggers::status.eq("Failed"))
                    .order(triggers::updated_at.desc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(pg_triggers.into_iter().map(Into::into).collect())
    }

    async fn list_failed_sqlite(
        &self,
        tenant_id: UniversalUuid,
        limit: i64,
    ) -> Result<Vec<Trigger>, StoreError> {
        use crate::dal::sqlite_models::{uuid_to_blob, SqliteTrigger};
        use crate::database::schema::sqlite::triggers;

        let conn = self
            .dal
            .pool()
            .expect_sqlite()
            .get()
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))?;

        let tenant_blob = uuid_to_blob(&tenant_id.0);
        let sqlite_triggers: Vec<SqliteTrigger> = conn
            .interact(move |conn| {
                triggers::table
                    .filter(triggers::tenant_id.eq(tenant_blob))
                    .filter(triggers::status.eq("Failed"))
                    .order(triggers::updated_at.desc())
                    .limit(limit)
                    .load(conn)
            })
            .await
            .map_err(|e| StoreError::ConnectionPool(e.to_string()))??;

        Ok(sqlite_triggers.into_iter().map(Into::into).collect())
    }
}
