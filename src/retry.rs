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

//! Retry policies for failed triggers.
//!
//! A failed trigger is re-queued to pending after a backoff delay; the
//! policy decides the delay (from the attempt number) and whether the
//! error class is worth retrying at all. The retry cap itself is stored on
//! each trigger row (`max_retries`), stamped from the policy at creation.

use std::time::Duration;

use crate::error::DispatchError;

/// Default retry cap stamped onto new triggers.
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// How the delay grows across attempts.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay for every attempt
    Fixed,
    /// Delay grows linearly with the attempt number
    Linear { multiplier: f64 },
    /// Delay doubles (or `base`-tuples) per attempt
    Exponential { base: f64, multiplier: f64 },
}

/// Which error classes are worth retrying.
///
/// All listed conditions must pass for a retry to be scheduled.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryCondition {
    /// Never retry
    Never,
    /// Retry every error until the cap
    AllErrors,
    /// Retry only errors classified as transient
    TransientOnly,
    /// Retry only errors whose message matches one of these substrings
    ErrorPattern { patterns: Vec<String> },
}

/// Retry policy applied by the dispatcher when a trigger fails.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry cap stamped onto triggers created under this policy
    pub max_attempts: i32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Ceiling on any computed delay
    pub max_delay: Duration,
    /// Delay growth across attempts
    pub backoff_strategy: BackoffStrategy,
    /// Error classes worth retrying; all must pass
    pub retry_conditions: Vec<RetryCondition>,
    /// Randomize delays by +/-25% to avoid thundering herds
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30000),
            // Delay proportional to the retry count
            backoff_strategy: BackoffStrategy::Linear { multiplier: 1.0 },
            retry_conditions: vec![RetryCondition::AllErrors],
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Computes the backoff delay before retry number `attempt` (1-based:
    /// the attempt count after the failure that was just recorded).
    ///
    /// The result is capped at `max_delay` and jittered when enabled.
    pub fn calculate_delay(&self, attempt: i32) -> Duration {
        let n = attempt.max(1);
        let base_ms = self.initial_delay.as_millis() as f64;
        let raw_ms = match self.backoff_strategy {
            BackoffStrategy::Fixed => base_ms,
            BackoffStrategy::Linear { multiplier } => base_ms * multiplier * n as f64,
            BackoffStrategy::Exponential { base, multiplier } => {
                base_ms * multiplier * base.powi(n - 1)
            }
        };

        let cap_ms = self.max_delay.as_millis() as f64;
        let capped_ms = raw_ms.min(cap_ms);

        let final_ms = if self.jitter {
            use rand::Rng;
            let factor: f64 = rand::thread_rng().gen_range(0.75..=1.25);
            (capped_ms * factor).min(cap_ms)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms as u64)
    }

    /// Evaluates the retry conditions against the error (all must pass).
    ///
    /// The attempt cap is checked separately against the trigger row, so
    /// this answers only "is this error class worth retrying".
    pub fn conditions_allow(&self, error: &DispatchError) -> bool {
        self.retry_conditions
            .iter()
            .all(|condition| match condition {
                RetryCondition::Never => false,
                RetryCondition::AllErrors => true,
                RetryCondition::TransientOnly => error.is_transient(),
                RetryCondition::ErrorPattern { patterns } => {
                    let error_msg = error.to_string().to_lowercase();
                    patterns
                        .iter()
                        .any(|pattern| error_msg.contains(&pattern.to_lowercase()))
                }
            })
    }
}
