//! Handler invocation with fault isolation.

use crate::arguments::Arguments;
use crate::context::ExecutionContext;
use crate::error::DispatchError;
use crate::result::InvocationResult;
use crate::types::Overload;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info};

/// Runs handlers. Errors and panics raised by a handler are converted to
/// `HandlerFault` and never escape the invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invoker;

impl Invoker {
    pub fn new() -> Self {
        Self
    }

    /// Execute the overload's handler.
    pub async fn invoke(
        &self,
        command: &str,
        overload: &Overload,
        ctx: &ExecutionContext,
        arguments: Arguments,
    ) -> Result<InvocationResult, DispatchError> {
        info!(command = %command, scope = ?ctx.scope(), "Invoking handler");

        let outcome = AssertUnwindSafe(overload.handler.call(ctx, arguments))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                error!(command = %command, error = ?e, "Handler failed");
                Err(DispatchError::HandlerFault {
                    command: command.to_string(),
                    detail: format!("{:?}", e),
                })
            }
            Err(panic) => {
                let detail = panic_message(panic.as_ref());
                error!(command = %command, panic = %detail, "Handler panicked");
                Err(DispatchError::HandlerFault {
                    command: command.to_string(),
                    detail,
                })
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".into()
    }
}
