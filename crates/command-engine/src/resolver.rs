//! Overload resolution.

use crate::arguments::Arguments;
use crate::binder::Binder;
use crate::context::ExecutionContext;
use crate::error::{BindError, DispatchError};
use crate::types::{CommandSpec, Overload};
use tracing::debug;

/// Winning overload and its bound arguments.
#[derive(Debug, Clone)]
pub struct Resolved<'a> {
    pub overload: &'a Overload,
    pub arguments: Arguments,
}

/// Picks the first overload, by descending priority then declaration
/// order, that binds every token.
#[derive(Clone, Default)]
pub struct Resolver {
    binder: Binder,
}

impl Resolver {
    pub fn new(binder: Binder) -> Self {
        Self { binder }
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    /// Resolve `tokens` against `spec`. `prefix` is only used for the
    /// usage string reported on failure.
    pub async fn resolve<'a>(
        &self,
        spec: &'a CommandSpec,
        tokens: &[&str],
        ctx: &ExecutionContext,
        prefix: &str,
    ) -> Result<Resolved<'a>, DispatchError> {
        let order = spec.resolution_order();
        let mut first_coercion: Option<BindError> = None;

        for overload in order.iter().copied() {
            if !overload.accepts_count(tokens.len()) {
                debug!(
                    command = %spec.name,
                    declaration = overload.declaration,
                    tokens = tokens.len(),
                    "Overload arity does not fit"
                );
                continue;
            }

            match self.binder.bind(overload, tokens, ctx).await {
                Ok(binding) if binding.leftover == 0 || overload.has_remainder() => {
                    return Ok(Resolved {
                        overload,
                        arguments: binding.arguments,
                    });
                }
                Ok(binding) => {
                    debug!(
                        command = %spec.name,
                        declaration = overload.declaration,
                        leftover = binding.leftover,
                        "Overload left tokens unconsumed"
                    );
                }
                Err(err @ BindError::CoercionFailed { .. }) => {
                    debug!(
                        command = %spec.name,
                        declaration = overload.declaration,
                        error = %err,
                        "Overload failed coercion"
                    );
                    if first_coercion.is_none() {
                        first_coercion = Some(err);
                    }
                }
                Err(err) => {
                    debug!(command = %spec.name, error = %err, "Overload did not bind");
                }
            }
        }

        // Failures always point at the highest-priority shape.
        let usage = order
            .first()
            .map(|o| o.usage(prefix, &spec.name))
            .unwrap_or_else(|| format!("{}{}", prefix, spec.name));

        if let Some(BindError::CoercionFailed {
            parameter,
            token,
            reason,
        }) = first_coercion
        {
            return Err(DispatchError::Coercion {
                parameter,
                token,
                reason,
                usage,
            });
        }

        Err(DispatchError::Syntax { usage })
    }
}
