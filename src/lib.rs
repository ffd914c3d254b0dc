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

//! # Hermod
//!
//! Hermod is the cross-module workflow trigger engine for a multi-tenant
//! people-analytics platform. Platform modules (culture, recognition,
//! engagement, skills, structure, hiring, performance, ...) never call each
//! other directly; they communicate through durable triggers persisted in a
//! shared store and driven by a background dispatcher.
//!
//! ## Architecture
//!
//! - **Trigger Store** ([`dal`]): durable trigger and analysis-result rows
//!   behind a backend-agnostic data access layer (PostgreSQL or SQLite,
//!   selected at runtime from the connection URL). Every read and write is
//!   scoped by tenant.
//! - **Dispatcher** ([`dispatcher`]): polls the store per (tenant, target
//!   module) route, claims triggers through an atomic compare-and-swap
//!   transition, and invokes the matching handler under a timeout. Failed
//!   triggers are retried with backoff up to a per-trigger cap.
//! - **Handler Registry** ([`handler`], [`modules`]): a closed set of
//!   per-module handlers keyed by [`ModuleName`]. Handlers parse their
//!   payload contract, call the reasoning stage, and return results plus
//!   any chained trigger requests; the dispatcher persists both
//!   idempotently.
//! - **Result Aggregator** ([`aggregator`]): bounded polling with a
//!   deadline and partial-result fallback, for workflows that fan out to
//!   several modules and need the results stitched back together.
//! - **Workflow Emitters** ([`workflows`]): the thin decision points inside
//!   source modules that create triggers (survey fan-out, position-gap
//!   escalation, review-cycle input requests).
//!
//! Multiple dispatcher processes may share one store; the claim transition
//! guarantees no trigger is processed twice concurrently. Ordering is FIFO
//! per (tenant, target module) route only.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hermod::{EngineConfig, TriggerEngine};
//! use hermod::workflows::culture::{self, SurveyCompleted};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     hermod::init_logging(None);
//!
//!     let engine = TriggerEngine::new("sqlite://triggers.db", EngineConfig::default()).await?;
//!     engine.start().await?;
//!
//!     let dal = engine.dal();
//!     let event = SurveyCompleted {
//!         tenant_id: hermod::UniversalUuid::new_v4(),
//!         employee_id: hermod::UniversalUuid::new_v4(),
//!         survey_id: "q3-pulse".to_string(),
//!         overall_score: 4.2,
//!     };
//!     let watermark = Some(hermod::current_timestamp());
//!     culture::handle_survey_completed(&dal, &event).await?;
//!
//!     let report = culture::combined_report(
//!         &engine.aggregator(),
//!         event.tenant_id,
//!         event.employee_id,
//!         watermark,
//!         Duration::from_secs(30),
//!     )
//!     .await?;
//!     println!("combined report complete: {}", report.is_complete());
//!
//!     engine.shutdown().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Backend Features
//!
//! Both backends are enabled by default; disable default features and pick
//! one to slim the build:
//!
//! - `postgres`: PostgreSQL with optional schema-per-tenant isolation
//! - `sqlite`: SQLite (file or in-memory), suited to tests and single-node
//!   deployments

pub mod aggregator;
pub mod dal;
pub mod database;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod handler;
pub mod models;
pub mod module;
pub mod modules;
pub mod reasoning;
pub mod retry;
pub mod workflows;

pub use aggregator::{AggregateOutcome, ResultAggregator};
pub use dal::DAL;
pub use database::connection::{BackendType, Database};
pub use database::universal_types::{current_timestamp, UniversalTimestamp, UniversalUuid};
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use engine::{EngineConfig, EngineConfigBuilder, TriggerEngine};
pub use error::{
    DispatchError, EngineError, HandlerError, ReasoningError, RegistrationError, StoreError,
    ValidationError,
};
pub use handler::{HandlerOutcome, HandlerRegistry, ModuleHandler, TriggerRequest};
pub use models::analysis_result::{AnalysisResult, NewAnalysisResult};
pub use models::trigger::{ClaimOutcome, NewTrigger, Trigger, TriggerRoute, TriggerStatus};
pub use module::ModuleName;
pub use reasoning::{AnalysisContext, Insight, ReasoningStage, StaticReasoner};
pub use retry::{BackoffStrategy, RetryCondition, RetryPolicy, DEFAULT_MAX_ATTEMPTS};

/// Initializes a `tracing` subscriber for binaries and tests.
///
/// `filter` takes a directive string such as `"hermod=debug"`; when `None`
/// the `RUST_LOG` environment variable is honored, falling back to `info`.
/// Repeated calls are no-ops, so test setup can call this unconditionally.
pub fn init_logging(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let env_filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .try_init();
}
