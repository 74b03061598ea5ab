//! Command registry: name and alias lookup.

use crate::error::RegistryError;
use crate::types::CommandSpec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Table of every registered command. Built once at startup and read-only
/// afterwards; share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    commands: Vec<Arc<CommandSpec>>,
    by_name: HashMap<String, usize>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command. Fails if any name or alias is already taken
    /// (case-insensitive) or the parameter schema is malformed.
    pub fn register(&mut self, spec: CommandSpec) -> Result<(), RegistryError> {
        validate(&spec)?;

        let mut keys: Vec<String> = Vec::new();
        for name in spec.names() {
            let key = name.to_lowercase();
            if let Some(&index) = self.by_name.get(&key) {
                return Err(RegistryError::DuplicateAlias {
                    alias: name.to_string(),
                    command: spec.name.clone(),
                    existing: self.commands[index].name.clone(),
                });
            }
            if keys.contains(&key) {
                return Err(RegistryError::DuplicateAlias {
                    alias: name.to_string(),
                    command: spec.name.clone(),
                    existing: spec.name.clone(),
                });
            }
            keys.push(key);
        }

        let index = self.commands.len();
        for key in keys {
            self.by_name.insert(key, index);
        }
        debug!(command = %spec.name, overloads = spec.overloads.len(), "Registered command");
        self.commands.push(Arc::new(spec));
        Ok(())
    }

    /// Look up a command by primary name or alias.
    pub fn lookup(&self, name: &str) -> Result<Arc<CommandSpec>, RegistryError> {
        self.by_name
            .get(&name.to_lowercase())
            .map(|&index| self.commands[index].clone())
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Every command, in registration order.
    pub fn commands(&self) -> &[Arc<CommandSpec>] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Optional and remainder parameters must follow every required one, and
/// only the last parameter may capture the remainder.
fn validate(spec: &CommandSpec) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidSchema {
        command: spec.name.clone(),
        reason,
    };

    if spec.overloads.is_empty() {
        return Err(invalid("no overloads".into()));
    }

    for overload in &spec.overloads {
        let mut seen_optional = false;
        let last = overload.params.len().saturating_sub(1);

        for (i, param) in overload.params.iter().enumerate() {
            if param.remainder && i != last {
                return Err(invalid(format!(
                    "remainder parameter `{}` must be last",
                    param.name
                )));
            }
            if param.optional {
                seen_optional = true;
            } else if seen_optional {
                return Err(invalid(format!(
                    "required parameter `{}` follows an optional one",
                    param.name
                )));
            }
        }

        if overload.scopes.is_empty() {
            return Err(invalid("overload has no allowed scopes".into()));
        }
    }

    Ok(())
}
