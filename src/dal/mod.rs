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

//! Data Access Layer with runtime backend selection
//!
//! This module provides the persistence layer for triggers and analysis
//! results. Every operation works against both PostgreSQL and SQLite,
//! selecting the appropriate implementation at runtime from the backend
//! the [`Database`] was built for.
//!
//! ## Architecture
//!
//! Each entity gets a focused DAL type ([`TriggerDAL`],
//! [`AnalysisResultDAL`]) borrowed out of the shared [`DAL`] facade.
//! Public methods dispatch on [`BackendType`] to private per-backend
//! functions that use the backend-specific schema and row models, so
//! backend differences (UUID blobs, text timestamps, server-side
//! defaults) never leak above this layer.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use hermod::dal::DAL;
//! use hermod::database::Database;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let database = Database::new("sqlite://triggers.db", "hermod", 5);
//! let dal = DAL::new(database);
//!
//! let pending = dal.trigger().pending_routes().await?;
//! # Ok(())
//! # }
//! ```

use crate::database::{AnyPool, BackendType, Database};

#[cfg(feature = "postgres")]
pub(crate) mod postgres_models;
#[cfg(feature = "sqlite")]
pub(crate) mod sqlite_models;

mod analysis_result;
mod trigger;

pub use analysis_result::AnalysisResultDAL;
pub use trigger::TriggerDAL;

/// Unified data access layer that works with both PostgreSQL and SQLite.
///
/// The DAL holds a [`Database`] and hands out entity-specific accessors.
/// It is cheap to clone; all clones share the same connection pool.
#[derive(Clone, Debug)]
pub struct DAL {
    /// Database instance providing pooled connections for all operations.
    pub database: Database,
}

impl DAL {
    /// Creates a new DAL instance with the provided database.
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Returns the backend type this DAL dispatches to.
    pub fn backend(&self) -> BackendType {
        self.database.backend()
    }

    /// Returns a reference to the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Returns the underlying connection pool.
    pub fn pool(&self) -> AnyPool {
        self.database.pool()
    }

    /// Returns a DAL instance for trigger operations.
    pub fn trigger(&self) -> TriggerDAL {
        TriggerDAL::new(self)
    }

    /// Returns a DAL instance for analysis result operations.
    pub fn analysis_result(&self) -> AnalysisResultDAL {
        AnalysisResultDAL::new(self)
    }
}
