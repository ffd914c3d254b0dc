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

//! The closed set of platform modules.
//!
//! Every trigger names a source and a target module, and every analysis
//! result belongs to a module. Keeping the set closed means routing is
//! checked exhaustively at compile time; adding a module is a deliberate
//! change here, not a stringly-typed convention.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A platform module that can emit triggers, handle them, or both.
///
/// Stored as lowercase text in the database; [`ModuleName::as_str`] and
/// [`FromStr`] are the only conversion points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleName {
    Culture,
    Recognition,
    Engagement,
    Skills,
    Structure,
    Hiring,
    Performance,
    Learning,
    Talent,
    Compensation,
}

impl ModuleName {
    /// Every module, in declaration order.
    pub const ALL: [ModuleName; 10] = [
        ModuleName::Culture,
        ModuleName::Recognition,
        ModuleName::Engagement,
        ModuleName::Skills,
        ModuleName::Structure,
        ModuleName::Hiring,
        ModuleName::Performance,
        ModuleName::Learning,
        ModuleName::Talent,
        ModuleName::Compensation,
    ];

    /// The stored (lowercase) name of the module.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleName::Culture => "culture",
            ModuleName::Recognition => "recognition",
            ModuleName::Engagement => "engagement",
            ModuleName::Skills => "skills",
            ModuleName::Structure => "structure",
            ModuleName::Hiring => "hiring",
            ModuleName::Performance => "performance",
            ModuleName::Learning => "learning",
            ModuleName::Talent => "talent",
            ModuleName::Compensation => "compensation",
        }
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModuleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "culture" => Ok(ModuleName::Culture),
            "recognition" => Ok(ModuleName::Recognition),
            "engagement" => Ok(ModuleName::Engagement),
            "skills" => Ok(ModuleName::Skills),
            "structure" => Ok(ModuleName::Structure),
            "hiring" => Ok(ModuleName::Hiring),
            "performance" => Ok(ModuleName::Performance),
            "learning" => Ok(ModuleName::Learning),
            "talent" => Ok(ModuleName::Talent),
            "compensation" => Ok(ModuleName::Compensation),
            other => Err(format!("unknown module name: {}", other)),
        }
    }
}
