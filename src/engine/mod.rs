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

//! Engine facade
//!
//! [`TriggerEngine`] wires the whole stack together from a database URL and
//! an [`EngineConfig`]: connection pool, migrations, optional PostgreSQL
//! schema setup, the handler registry, and the background dispatcher. It
//! owns the dispatcher's lifecycle and hands out DAL and aggregator handles
//! for emitters and fan-in steps.
//!
//! # Example
//!
//! ```rust,ignore
//! let engine = TriggerEngine::new("sqlite://triggers.db", EngineConfig::default()).await?;
//! engine.start().await?;
//!
//! let dal = engine.dal();
//! // ... emit triggers, aggregate results ...
//!
//! engine.shutdown().await?;
//! ```

mod config;

pub use config::{EngineConfig, EngineConfigBuilder};

use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{error, info};

use crate::aggregator::ResultAggregator;
use crate::dal::DAL;
use crate::database::connection::Database;
use crate::dispatcher::{Dispatcher, DispatcherConfig};
use crate::error::EngineError;
use crate::handler::HandlerRegistry;
use crate::reasoning::StaticReasoner;

/// The assembled trigger engine.
///
/// Construction validates the configuration, builds the connection pool and
/// runs migrations; [`start`](TriggerEngine::start) then spawns the
/// background dispatcher and [`shutdown`](TriggerEngine::shutdown) stops it
/// and joins the task. The engine is the intended composition root; nothing
/// stops callers from wiring [`Dispatcher`] and [`DAL`] by hand, but the
/// facade covers the common case.
pub struct TriggerEngine {
    /// Database connection pool shared by every component
    database: Database,
    /// Data access layer over the shared pool
    dal: DAL,
    /// Configuration the engine was built with
    config: EngineConfig,
    /// The dispatcher driven by the background service
    dispatcher: Arc<Dispatcher>,
    /// Runtime handles for the background service
    runtime_handles: Arc<RwLock<RuntimeHandles>>,
}

/// Internal structure for managing the background dispatcher task
/// and its shutdown channel.
struct RuntimeHandles {
    dispatcher_handle: Option<tokio::task::JoinHandle<()>>,
    shutdown_sender: Option<broadcast::Sender<()>>,
}

impl std::fmt::Debug for TriggerEngine {
    // The dispatcher holds `dyn ModuleHandler` trait objects, so Debug
    // cannot be derived; report the configuration and elide the rest.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TriggerEngine {
    /// Creates an engine with the built-in handler set.
    ///
    /// The standard registry is wired to the deterministic
    /// [`StaticReasoner`]; use [`with_registry`](TriggerEngine::with_registry)
    /// to supply handlers backed by a real reasoning stage.
    pub async fn new(database_url: &str, config: EngineConfig) -> Result<Self, EngineError> {
        let registry = HandlerRegistry::standard(Arc::new(StaticReasoner));
        Self::with_registry(database_url, config, registry).await
    }

    /// Creates an engine with a caller-supplied handler registry.
    ///
    /// Validates the schema configuration, builds the pool, and runs
    /// migrations (inside the schema when one is configured).
    ///
    /// # Errors
    /// `EngineError::Configuration` for an invalid schema name or a schema
    /// configured on a non-PostgreSQL URL; `EngineError::Migration` when
    /// migrations cannot be applied.
    pub async fn with_registry(
        database_url: &str,
        config: EngineConfig,
        registry: HandlerRegistry,
    ) -> Result<Self, EngineError> {
        if let Some(schema) = config.schema() {
            Self::validate_schema_name(schema)?;

            if !database_url.starts_with("postgresql://")
                && !database_url.starts_with("postgres://")
            {
                return Err(EngineError::Configuration(
                    "Schema isolation is only supported with PostgreSQL. \
                     For SQLite multi-tenancy, use separate database files instead."
                        .to_string(),
                ));
            }
        }

        let database = Database::new_with_schema(
            database_url,
            "hermod",
            config.db_pool_size(),
            config.schema(),
        );

        match config.schema() {
            Some(schema) => {
                database.setup_schema(schema).await.map_err(|e| {
                    EngineError::Configuration(format!(
                        "Failed to set up schema '{}': {}",
                        schema, e
                    ))
                })?;
            }
            None => {
                database
                    .run_migrations()
                    .await
                    .map_err(EngineError::Migration)?;
            }
        }

        let dal = DAL::new(database.clone());

        let dispatcher_config = DispatcherConfig {
            poll_interval: config.poll_interval(),
            batch_size: config.batch_size(),
            max_concurrent_handlers: config.max_concurrent_handlers(),
            handler_timeout: config.handler_timeout(),
            error_backoff: config.error_backoff(),
            retry_policy: config.retry_policy().clone(),
        };
        let dispatcher = Dispatcher::new(dal.clone(), Arc::new(registry), dispatcher_config);

        Ok(Self {
            database,
            dal,
            config,
            dispatcher: Arc::new(dispatcher),
            runtime_handles: Arc::new(RwLock::new(RuntimeHandles {
                dispatcher_handle: None,
                shutdown_sender: None,
            })),
        })
    }

    /// Validates the schema name contains only alphanumeric characters and
    /// underscores and does not start with a digit.
    fn validate_schema_name(schema: &str) -> Result<(), EngineError> {
        if !schema.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(EngineError::Configuration(
                "Schema name must contain only alphanumeric characters and underscores"
                    .to_string(),
            ));
        }

        if schema.chars().next().map_or(true, |c| c.is_ascii_digit()) {
            return Err(EngineError::Configuration(
                "Schema name must not be empty or start with a digit".to_string(),
            ));
        }

        Ok(())
    }

    /// Starts the background dispatcher service.
    ///
    /// Calling start on an already-running engine is a no-op.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut handles = self.runtime_handles.write().await;

        if handles.dispatcher_handle.is_some() {
            return Ok(());
        }

        info!("Starting trigger engine background services");

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);

        let dispatcher = Arc::clone(&self.dispatcher);
        let dispatcher_handle = tokio::spawn(async move {
            let mut dispatch_future = Box::pin(dispatcher.run());

            tokio::select! {
                result = &mut dispatch_future => {
                    if let Err(e) = result {
                        error!("Dispatcher loop failed: {}", e);
                    } else {
                        info!("Dispatcher loop completed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Dispatcher shutdown requested");
                }
            }
        });

        handles.dispatcher_handle = Some(dispatcher_handle);
        handles.shutdown_sender = Some(shutdown_tx);

        Ok(())
    }

    /// Gracefully shuts down the background dispatcher.
    ///
    /// Sends the shutdown signal and waits for the dispatcher task to
    /// finish. Handler invocations already in flight run to completion on
    /// their own spawned tasks.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let mut handles = self.runtime_handles.write().await;

        if let Some(sender) = handles.shutdown_sender.take() {
            let _ = sender.send(());
        }

        if let Some(handle) = handles.dispatcher_handle.take() {
            let _ = handle.await;
        }

        info!("Trigger engine stopped");
        Ok(())
    }

    /// Returns a DAL handle over the engine's store.
    pub fn dal(&self) -> DAL {
        self.dal.clone()
    }

    /// Returns a result aggregator configured with the engine's poll
    /// interval.
    pub fn aggregator(&self) -> ResultAggregator {
        ResultAggregator::new(self.dal.clone())
            .with_poll_interval(self.config.aggregator_poll_interval())
    }

    /// Returns the engine's database handle.
    pub fn database(&self) -> Database {
        self.database.clone()
    }
}
