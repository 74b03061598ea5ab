//! Engine error types.

use crate::context::{ContextCapability, Scope};
use crate::result::InvocationResult;
use crate::types::Capability;
use thiserror::Error;

/// Errors raised while building the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A name or alias is already taken by another command.
    #[error("Alias `{alias}` of `{command}` is already registered by `{existing}`")]
    DuplicateAlias {
        alias: String,
        command: String,
        existing: String,
    },

    /// An overload's parameter list breaks the ordering rules.
    #[error("Invalid parameter schema for `{command}`: {reason}")]
    InvalidSchema { command: String, reason: String },

    /// No command is registered under this name or alias.
    #[error("Command not found: {0}")]
    NotFound(String),
}

/// Errors raised while binding tokens to one overload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// Tokens ran out before a required parameter.
    #[error("Missing value for `{parameter}`")]
    InsufficientArguments { parameter: String },

    /// A token could not be converted to its parameter's type.
    #[error("Invalid value `{token}` for `{parameter}`: {reason}")]
    CoercionFailed {
        parameter: String,
        token: String,
        reason: String,
    },
}

/// Errors raised by typed argument accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Argument `{0}` was not supplied")]
    Missing(String),

    #[error("Argument `{name}` is not a {expected}")]
    WrongType { name: String, expected: &'static str },
}

/// Errors delivering a result through a context's reply capability.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Context has no target for this delivery: {0}")]
    NoTarget(String),
}

/// Per-trigger failures. Each one terminates a dispatch cycle and is
/// delivered to the caller as an `Error` result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("Usage: `{usage}`")]
    Syntax { usage: String },

    #[error("`{token}` is not a valid value for `{parameter}` ({reason})\nUsage: `{usage}`")]
    Coercion {
        parameter: String,
        token: String,
        reason: String,
        usage: String,
    },

    #[error("This command can only be used in: {}", scope_list(.allowed))]
    Scope { allowed: Vec<Scope> },

    #[error("This command needs {capability}, which is not available here")]
    ContextUnavailable { capability: ContextCapability },

    #[error("You need the `{capability}` permission to use this command")]
    Permission { capability: Capability },

    #[error("Something went wrong while running `{command}`")]
    HandlerFault { command: String, detail: String },

    #[error("There is no command named `{0}`")]
    UnknownCommand(String),
}

fn scope_list(scopes: &[Scope]) -> String {
    scopes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl DispatchError {
    /// Title shown on the error delivery path.
    pub fn title(&self) -> &'static str {
        match self {
            DispatchError::Syntax { .. } => "Syntax Error",
            DispatchError::Coercion { .. } => "Invalid Argument",
            DispatchError::Scope { .. } | DispatchError::ContextUnavailable { .. } => {
                "Scope Error"
            }
            DispatchError::Permission { .. } => "Permission Error",
            DispatchError::HandlerFault { .. } => "Error",
            DispatchError::UnknownCommand(_) => "Unknown Command",
        }
    }

    /// Convert into a deliverable result. Fault detail is only included
    /// when `diagnostics` is set.
    pub fn into_result(self, diagnostics: bool) -> InvocationResult {
        let title = self.title();
        let description = match &self {
            DispatchError::HandlerFault { detail, .. } if diagnostics => {
                format!("{}\n\n{}", self, detail)
            }
            _ => self.to_string(),
        };
        InvocationResult::error_titled(title, description)
    }
}
