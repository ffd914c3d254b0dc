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

//! Configuration types for the trigger engine.
//!
//! This module contains the configuration struct and builder for
//! configuring the engine's behavior.

use std::time::Duration;

use crate::retry::RetryPolicy;

/// Configuration for the trigger engine
///
/// This struct defines the configuration parameters that control the
/// behavior of the [`TriggerEngine`](super::TriggerEngine): connection pool
/// sizing, dispatcher polling and concurrency, handler timeouts, and the
/// retry policy for failed triggers.
///
/// # Construction
///
/// Use [`EngineConfig::builder()`] to create a configuration:
///
/// ```rust,ignore
/// let config = EngineConfig::builder()
///     .max_concurrent_handlers(8)
///     .handler_timeout(Duration::from_secs(60))
///     .build();
/// ```
///
/// Or use the default configuration:
///
/// ```rust,ignore
/// let config = EngineConfig::default();
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct EngineConfig {
    db_pool_size: u32,
    schema: Option<String>,
    poll_interval: Duration,
    batch_size: i64,
    max_concurrent_handlers: usize,
    handler_timeout: Duration,
    error_backoff: Duration,
    aggregator_poll_interval: Duration,
    retry_policy: RetryPolicy,
}

impl EngineConfig {
    /// Creates a new configuration builder with default values.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Number of database connections in the pool.
    pub fn db_pool_size(&self) -> u32 {
        self.db_pool_size
    }

    /// Optional PostgreSQL schema for hard tenant isolation.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// How often the dispatcher polls for pending triggers.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Maximum triggers fetched per route in one poll cycle.
    pub fn batch_size(&self) -> i64 {
        self.batch_size
    }

    /// Maximum number of concurrent handler invocations.
    pub fn max_concurrent_handlers(&self) -> usize {
        self.max_concurrent_handlers
    }

    /// Maximum time allowed for a single handler invocation.
    pub fn handler_timeout(&self) -> Duration {
        self.handler_timeout
    }

    /// Back-off after a persistence error in the dispatch loop.
    pub fn error_backoff(&self) -> Duration {
        self.error_backoff
    }

    /// Poll interval used by aggregators created through the engine.
    pub fn aggregator_poll_interval(&self) -> Duration {
        self.aggregator_poll_interval
    }

    /// Retry policy applied to failed triggers.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }
}

/// Builder for [`EngineConfig`].
///
/// Use this builder to create a customized configuration:
///
/// ```rust,ignore
/// let config = EngineConfig::builder()
///     .db_pool_size(20)
///     .poll_interval(Duration::from_millis(50))
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self {
            config: EngineConfig {
                db_pool_size: 10,
                schema: None,
                poll_interval: Duration::from_millis(100),
                batch_size: 10,
                max_concurrent_handlers: 4,
                handler_timeout: Duration::from_secs(30),
                error_backoff: Duration::from_secs(1),
                aggregator_poll_interval: Duration::from_millis(250),
                retry_policy: RetryPolicy::default(),
            },
        }
    }
}

impl EngineConfigBuilder {
    /// Sets the database pool size.
    pub fn db_pool_size(mut self, value: u32) -> Self {
        self.config.db_pool_size = value;
        self
    }

    /// Sets the PostgreSQL schema for multi-tenant isolation.
    ///
    /// The name must be alphanumeric/underscore and must not start with a
    /// digit; it is validated when the engine is built.
    pub fn schema(mut self, value: impl Into<String>) -> Self {
        self.config.schema = Some(value.into());
        self
    }

    /// Sets the dispatcher poll interval.
    pub fn poll_interval(mut self, value: Duration) -> Self {
        self.config.poll_interval = value;
        self
    }

    /// Sets the per-route dispatch batch size.
    pub fn batch_size(mut self, value: i64) -> Self {
        self.config.batch_size = value;
        self
    }

    /// Sets the maximum number of concurrent handler invocations.
    pub fn max_concurrent_handlers(mut self, value: usize) -> Self {
        self.config.max_concurrent_handlers = value;
        self
    }

    /// Sets the handler timeout.
    pub fn handler_timeout(mut self, value: Duration) -> Self {
        self.config.handler_timeout = value;
        self
    }

    /// Sets the persistence-error backoff.
    pub fn error_backoff(mut self, value: Duration) -> Self {
        self.config.error_backoff = value;
        self
    }

    /// Sets the aggregator poll interval.
    pub fn aggregator_poll_interval(mut self, value: Duration) -> Self {
        self.config.aggregator_poll_interval = value;
        self
    }

    /// Sets the retry policy for failed triggers.
    pub fn retry_policy(mut self, value: RetryPolicy) -> Self {
        self.config.retry_policy = value;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> EngineConfig {
        self.config
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfigBuilder::default().build()
    }
}
