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

//! Built-in module handlers
//!
//! One handler per platform module that acts as a trigger target. Each
//! handler parses the payload contract it owns, runs the reasoning stage,
//! and returns results and any chained trigger requests for the dispatcher
//! to persist. Handlers never touch the store themselves.
//!
//! Payload contracts shared between emitting and consuming modules live in
//! [`payloads`].

pub mod payloads;

mod culture;
mod engagement;
mod hiring;
mod recognition;
mod skills;

pub use culture::CultureHandler;
pub use engagement::EngagementHandler;
pub use hiring::HiringHandler;
pub use recognition::RecognitionHandler;
pub use skills::SkillsHandler;
