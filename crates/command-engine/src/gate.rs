//! Scope and permission gate.

use crate::context::{ExecutionContext, Principal};
use crate::error::DispatchError;
use crate::types::{Capability, CommandSpec, Overload};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Answers whether a principal holds a capability in the channel and
/// group of `ctx`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CapabilityService: Send + Sync {
    async fn holds(
        &self,
        principal: &Principal,
        capability: Capability,
        ctx: &ExecutionContext,
    ) -> bool;
}

/// Validates a winning overload against the triggering context.
#[derive(Clone)]
pub struct Gate {
    capabilities: Arc<dyn CapabilityService>,
}

impl Gate {
    pub fn new(capabilities: Arc<dyn CapabilityService>) -> Self {
        Self { capabilities }
    }

    /// Checks scope, context capabilities and, when the context has a
    /// principal, the overload's required capabilities. Contexts without
    /// a principal run with the bot's own authority.
    pub async fn check(
        &self,
        spec: &CommandSpec,
        overload: &Overload,
        ctx: &ExecutionContext,
    ) -> Result<(), DispatchError> {
        let scope = ctx.scope();
        if !overload.allows(scope) {
            debug!(command = %spec.name, ?scope, "Scope rejected");
            return Err(DispatchError::Scope {
                allowed: overload.scopes.clone(),
            });
        }

        if let Some(missing) = overload.needs.iter().find(|c| !ctx.provides(**c)) {
            return Err(DispatchError::ContextUnavailable {
                capability: *missing,
            });
        }

        let Some(principal) = ctx.principal() else {
            return Ok(());
        };

        for capability in &overload.required {
            if !self
                .capabilities
                .holds(principal, *capability, ctx)
                .await
            {
                debug!(
                    command = %spec.name,
                    principal = %principal.id,
                    %capability,
                    "Permission denied"
                );
                return Err(DispatchError::Permission {
                    capability: *capability,
                });
            }
        }

        Ok(())
    }
}
