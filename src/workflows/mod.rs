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

//! Workflow emitters
//!
//! The thin business decision points that sit on top of the trigger store:
//! each function here takes a domain event, decides whether and what to
//! trigger, and calls the store's create operation. Fan-in counterparts use
//! the aggregator to fold asynchronously produced results back into one
//! outcome for the caller.
//!
//! Emitters never claim or mutate triggers; that is the dispatcher's job.
//! A `ValidationError` from create surfaces here synchronously so the
//! workflow step can decide whether to abort.

pub mod culture;
pub mod performance;
pub mod structure;
