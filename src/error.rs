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

//! Error types for the trigger engine.
//!
//! The taxonomy separates what the caller did wrong ([`ValidationError`]),
//! what the store could not do ([`StoreError`]), what a handler refused or
//! botched ([`HandlerError`]), and what the dispatch machinery hit around a
//! handler ([`DispatchError`]). Losing a claim race is deliberately not an
//! error; see [`ClaimOutcome`](crate::models::ClaimOutcome).

use thiserror::Error;

use crate::database::universal_types::UniversalUuid;
use crate::module::ModuleName;

/// Rejected input, detected before anything is written.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Trigger or result carried the nil UUID as its tenant id
    #[error("tenant id must not be nil")]
    MissingTenantId,

    /// Trigger payload was JSON null
    #[error("payload must not be null")]
    EmptyPayload,

    /// Result carried the nil UUID as its employee id
    #[error("employee id must not be nil")]
    MissingEmployeeId,
}

/// Errors from trigger and result store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Input failed validation; nothing was written
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No trigger with the given id exists
    #[error("trigger not found: {0}")]
    TriggerNotFound(UniversalUuid),

    /// The database rejected or failed the operation
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// The connection pool failed to produce a usable connection
    #[error("connection pool error: {0}")]
    ConnectionPool(String),

    /// A payload or insight list could not be serialized for storage
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// True for infrastructure failures (database, pool) as opposed to
    /// not-found or validation outcomes. The dispatcher backs off its poll
    /// cycle on these instead of treating them as trigger failures.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::ConnectionPool(_)
        )
    }
}

/// Errors from the external reasoning stage.
#[derive(Error, Debug)]
pub enum ReasoningError {
    /// The stage could not be reached or answered too slowly; retryable
    #[error("reasoning stage unavailable: {0}")]
    Unavailable(String),

    /// The stage rejected the input; retrying the same payload is pointless
    #[error("reasoning stage rejected the input: {0}")]
    Rejected(String),
}

/// Errors raised by a module handler while processing a trigger.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The trigger named a type this handler does not implement. Handlers
    /// fail fast on these rather than guessing.
    #[error("module {module} does not handle trigger type '{trigger_type}'")]
    UnsupportedTriggerType {
        module: ModuleName,
        trigger_type: String,
    },

    /// The payload did not match the shape the emitter/handler pair agreed on
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The reasoning stage failed
    #[error("reasoning failed: {0}")]
    Reasoning(#[from] ReasoningError),
}

impl HandlerError {
    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(&self) -> bool {
        match self {
            HandlerError::Reasoning(ReasoningError::Unavailable(_)) => true,
            HandlerError::Reasoning(ReasoningError::Rejected(_)) => false,
            HandlerError::UnsupportedTriggerType { .. } => false,
            HandlerError::InvalidPayload(_) => false,
        }
    }
}

/// Errors from the dispatch machinery around a handler invocation.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The handler exceeded the configured execution timeout
    #[error("handler for {0} exceeded the execution timeout")]
    HandlerTimeout(ModuleName),

    /// No handler is registered for the trigger's target module
    #[error("no handler registered for module {0}")]
    NoHandler(ModuleName),

    /// The handler itself failed
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// A store operation failed mid-dispatch
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DispatchError {
    /// Whether a retry has any chance of succeeding. Timeouts and
    /// infrastructure failures are transient; a missing handler or a
    /// rejected payload is not.
    pub fn is_transient(&self) -> bool {
        match self {
            DispatchError::HandlerTimeout(_) => true,
            DispatchError::NoHandler(_) => false,
            DispatchError::Handler(e) => e.is_transient(),
            DispatchError::Store(e) => e.is_persistence(),
        }
    }
}

/// Errors from handler registration.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Each module has at most one handler
    #[error("a handler for module {0} is already registered")]
    DuplicateHandler(ModuleName),
}

/// Errors from engine construction and lifecycle.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Invalid engine configuration
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Migrations failed to apply
    #[error("database migration failed: {0}")]
    Migration(String),

    /// Handler registration failed
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}
