//! Parameter binder: raw tokens to a bound argument list for one overload.

use crate::arguments::{Arguments, BoundArgument};
use crate::coerce::{self, Coerce};
use crate::context::ExecutionContext;
use crate::error::BindError;
use crate::types::{Overload, ParamKind, ParameterSpec, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Successful binding of one overload.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub arguments: Arguments,
    /// Tokens left unconsumed (always zero when a remainder parameter
    /// captured them).
    pub leftover: usize,
}

/// Binds tokens to parameters, using built-in conversions unless a
/// coercer has been plugged in for the parameter's kind.
#[derive(Clone, Default)]
pub struct Binder {
    coercers: HashMap<ParamKind, Arc<dyn Coerce>>,
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the conversion used for `kind`.
    pub fn with_coercer(mut self, kind: ParamKind, coercer: Arc<dyn Coerce>) -> Self {
        self.coercers.insert(kind, coercer);
        self
    }

    /// Attempt to bind `tokens` to `overload`. Never touches shared
    /// state; either every parameter binds or a typed failure is
    /// returned.
    pub async fn bind(
        &self,
        overload: &Overload,
        tokens: &[&str],
        ctx: &ExecutionContext,
    ) -> Result<Binding, BindError> {
        let mut bound = Vec::with_capacity(overload.params.len());
        let mut cursor = 0;

        for param in &overload.params {
            let remaining = &tokens[cursor.min(tokens.len())..];

            if remaining.is_empty() {
                if !param.optional {
                    return Err(BindError::InsufficientArguments {
                        parameter: param.label().to_string(),
                    });
                }
                bound.push(BoundArgument {
                    name: param.name.clone(),
                    value: param.default.clone(),
                });
                continue;
            }

            let value = if param.remainder {
                cursor = tokens.len();
                self.bind_remainder(param, remaining, ctx).await?
            } else {
                cursor += 1;
                self.coerce(param, remaining[0], ctx).await?
            };

            bound.push(BoundArgument {
                name: param.name.clone(),
                value: Some(value),
            });
        }

        let leftover = tokens.len().saturating_sub(cursor);
        trace!(bound = bound.len(), leftover, "Bound overload");

        Ok(Binding {
            arguments: Arguments::new(bound),
            leftover,
        })
    }

    async fn bind_remainder(
        &self,
        param: &ParameterSpec,
        remaining: &[&str],
        ctx: &ExecutionContext,
    ) -> Result<Value, BindError> {
        match param.kind {
            ParamKind::Text => Ok(Value::Text(remaining.join(" "))),
            ParamKind::TextList => Ok(Value::TextList(
                remaining.iter().map(|t| t.to_string()).collect(),
            )),
            _ => self.coerce(param, &remaining.join(" "), ctx).await,
        }
    }

    async fn coerce(
        &self,
        param: &ParameterSpec,
        token: &str,
        ctx: &ExecutionContext,
    ) -> Result<Value, BindError> {
        let result = match self.coercers.get(&param.kind) {
            Some(coercer) => coercer.coerce(token, ctx).await,
            None => coerce::builtin(&param.kind, token),
        };

        result.map_err(|reason| BindError::CoercionFailed {
            parameter: param.label().to_string(),
            token: token.to_string(),
            reason,
        })
    }
}
