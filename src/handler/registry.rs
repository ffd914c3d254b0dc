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

//! Handler registry keyed on the closed module enum.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::RegistrationError;
use crate::module::ModuleName;
use crate::reasoning::ReasoningStage;

use super::ModuleHandler;

/// Registry mapping module names to their handlers.
///
/// The mapping is closed: dispatch is keyed on [`ModuleName`], so a route
/// to a module without a registered handler is a configuration gap the
/// dispatcher surfaces as a permanent trigger failure, not a spelling
/// mistake discovered at runtime.
pub struct HandlerRegistry {
    handlers: HashMap<ModuleName, Arc<dyn ModuleHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Builds the registry with the built-in handler set, all sharing one
    /// reasoning stage:
    ///
    /// - recognition and engagement handlers for the culture survey fan-out
    /// - the hiring handler, which chains a role requirements profile
    ///   request to skills
    /// - culture and skills handlers for performance review input requests
    pub fn standard(reasoner: Arc<dyn ReasoningStage>) -> Self {
        use crate::modules::{
            CultureHandler, EngagementHandler, HiringHandler, RecognitionHandler, SkillsHandler,
        };

        let handlers: Vec<Arc<dyn ModuleHandler>> = vec![
            Arc::new(RecognitionHandler::new(reasoner.clone())),
            Arc::new(EngagementHandler::new(reasoner.clone())),
            Arc::new(HiringHandler::new(reasoner.clone())),
            Arc::new(CultureHandler::new(reasoner.clone())),
            Arc::new(SkillsHandler::new(reasoner)),
        ];

        let mut registry = Self::new();
        for handler in handlers {
            // Built-in modules are distinct; direct insertion cannot collide.
            registry.handlers.insert(handler.module(), handler);
        }
        registry
    }

    /// Registers a handler under its module name.
    pub fn register(
        &mut self,
        handler: Arc<dyn ModuleHandler>,
    ) -> Result<(), RegistrationError> {
        let module = handler.module();
        match self.handlers.entry(module) {
            Entry::Occupied(_) => Err(RegistrationError::DuplicateHandler(module)),
            Entry::Vacant(entry) => {
                entry.insert(handler);
                Ok(())
            }
        }
    }

    /// Looks up the handler for a module.
    pub fn get(&self, module: ModuleName) -> Option<Arc<dyn ModuleHandler>> {
        self.handlers.get(&module).cloned()
    }

    /// The modules with a registered handler, in name order.
    pub fn registered_modules(&self) -> Vec<ModuleName> {
        let mut modules: Vec<ModuleName> = self.handlers.keys().copied().collect();
        modules.sort_by_key(|module| module.as_str());
        modules
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("modules", &self.registered_modules())
            .finish()
    }
}
