//! Dispatcher: orchestrates the pipeline for one trigger.
//!
//! `Received -> NameResolved -> OverloadSelected -> Gated -> Invoked -> Delivered`.
//! Any typed failure short-circuits to delivery of an `Error` result.
//! Pipelines share nothing but the read-only registry snapshot.

use crate::binder::Binder;
use crate::context::ExecutionContext;
use crate::error::DispatchError;
use crate::gate::{CapabilityService, Gate};
use crate::invoker::Invoker;
use crate::registry::Registry;
use crate::resolver::Resolver;
use crate::result::InvocationResult;
use crate::types::CommandSpec;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Pipeline stage reached by a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    NameResolved,
    OverloadSelected,
    Gated,
    Invoked,
    Delivered,
}

/// Supplies the command prefix in effect for a context.
#[async_trait]
pub trait PrefixSource: Send + Sync {
    async fn prefix_for(&self, ctx: &ExecutionContext) -> String;
}

/// Same prefix everywhere.
#[derive(Debug, Clone)]
pub struct StaticPrefix(pub String);

#[async_trait]
impl PrefixSource for StaticPrefix {
    async fn prefix_for(&self, _ctx: &ExecutionContext) -> String {
        self.0.clone()
    }
}

pub struct Dispatcher {
    registry: RwLock<Arc<Registry>>,
    resolver: Resolver,
    gate: Gate,
    invoker: Invoker,
    prefixes: Arc<dyn PrefixSource>,
    diagnostics: bool,
}

impl Dispatcher {
    /// Create a dispatcher with the `!` prefix and built-in coercions.
    pub fn new(registry: Arc<Registry>, capabilities: Arc<dyn CapabilityService>) -> Self {
        Self {
            registry: RwLock::new(registry),
            resolver: Resolver::default(),
            gate: Gate::new(capabilities),
            invoker: Invoker::new(),
            prefixes: Arc::new(StaticPrefix("!".into())),
            diagnostics: false,
        }
    }

    pub fn with_binder(mut self, binder: Binder) -> Self {
        self.resolver = Resolver::new(binder);
        self
    }

    pub fn with_prefixes(mut self, prefixes: Arc<dyn PrefixSource>) -> Self {
        self.prefixes = prefixes;
        self
    }

    /// Include handler fault detail in error replies.
    pub fn with_diagnostics(mut self, diagnostics: bool) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Current registry snapshot.
    pub async fn registry(&self) -> Arc<Registry> {
        self.registry.read().await.clone()
    }

    /// Swap in a rebuilt registry. Pipelines already running keep the
    /// snapshot they started with.
    pub async fn replace_registry(&self, registry: Arc<Registry>) {
        let count = registry.len();
        *self.registry.write().await = registry;
        info!(commands = count, "Registry replaced");
    }

    pub async fn prefix_for(&self, ctx: &ExecutionContext) -> String {
        self.prefixes.prefix_for(ctx).await
    }

    /// Handle a live message. Returns `None`, delivering nothing, when the
    /// text is not a command: no prefix, or an unknown name.
    pub async fn handle_message(&self, ctx: &ExecutionContext) -> Option<InvocationResult> {
        let text = ctx.raw_text()?;
        let prefix = self.prefix_for(ctx).await;
        let rest = text.trim_start().strip_prefix(prefix.as_str())?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return None;
        }

        let (name, tokens) = split_command(rest)?;
        let registry = self.registry().await;
        let spec = match registry.lookup(name) {
            Ok(spec) => spec,
            Err(_) => {
                debug!(name = %name, "Ignoring unknown command");
                return None;
            }
        };

        let result = self.pipeline(&spec, &tokens, ctx, &prefix).await;
        self.deliver(ctx, &result).await;
        Some(result)
    }

    /// Run a command without delivering the result. The command text may
    /// carry the prefix or omit it.
    pub async fn run(&self, ctx: &ExecutionContext, command_text: &str) -> InvocationResult {
        let prefix = self.prefix_for(ctx).await;
        let trimmed = command_text.trim();
        let text = trimmed.strip_prefix(prefix.as_str()).unwrap_or(trimmed);

        let Some((name, tokens)) = split_command(text) else {
            return DispatchError::Syntax {
                usage: format!("{}<command>", prefix),
            }
            .into_result(self.diagnostics);
        };

        let registry = self.registry().await;
        match registry.lookup(name) {
            Ok(spec) => self.pipeline(&spec, &tokens, ctx, &prefix).await,
            Err(_) => {
                info!(name = %name, scope = ?ctx.scope(), "Unknown command");
                DispatchError::UnknownCommand(name.to_string()).into_result(self.diagnostics)
            }
        }
    }

    /// Run a command and deliver its result through the context.
    pub async fn dispatch(&self, ctx: &ExecutionContext, command_text: &str) -> InvocationResult {
        let result = self.run(ctx, command_text).await;
        self.deliver(ctx, &result).await;
        result
    }

    async fn pipeline(
        &self,
        spec: &CommandSpec,
        tokens: &[&str],
        ctx: &ExecutionContext,
        prefix: &str,
    ) -> InvocationResult {
        match self.execute(spec, tokens, ctx, prefix).await {
            Ok(result) => result,
            Err(e) => {
                match &e {
                    DispatchError::HandlerFault { .. } => {
                        warn!(command = %spec.name, error = %e, "Dispatch failed")
                    }
                    _ => info!(command = %spec.name, error = %e, "Dispatch rejected"),
                }
                e.into_result(self.diagnostics)
            }
        }
    }

    async fn execute(
        &self,
        spec: &CommandSpec,
        tokens: &[&str],
        ctx: &ExecutionContext,
        prefix: &str,
    ) -> Result<InvocationResult, DispatchError> {
        debug!(stage = ?Stage::NameResolved, command = %spec.name, tokens = tokens.len());

        // Out-of-scope triggers never reach coercion.
        let scope = ctx.scope();
        if !spec.allows(scope) {
            return Err(DispatchError::Scope {
                allowed: spec.allowed_scopes(),
            });
        }

        let resolved = self.resolver.resolve(spec, tokens, ctx, prefix).await?;
        debug!(
            stage = ?Stage::OverloadSelected,
            command = %spec.name,
            declaration = resolved.overload.declaration
        );

        self.gate.check(spec, resolved.overload, ctx).await?;
        debug!(stage = ?Stage::Gated, command = %spec.name);

        let result = self
            .invoker
            .invoke(&spec.name, resolved.overload, ctx, resolved.arguments)
            .await?;
        debug!(stage = ?Stage::Invoked, command = %spec.name, success = result.is_success());

        Ok(result)
    }

    async fn deliver(&self, ctx: &ExecutionContext, result: &InvocationResult) {
        match ctx.reply(result).await {
            Ok(()) => debug!(stage = ?Stage::Delivered, scope = ?ctx.scope()),
            Err(e) => warn!(error = %e, scope = ?ctx.scope(), "Failed to deliver result"),
        }
    }
}

/// Split `name token token ...` on whitespace.
fn split_command(text: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = text.split_whitespace();
    let name = parts.next()?;
    debug!(stage = ?Stage::Received, name = %name);
    Some((name, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::{direct_context, group_context, scheduled_context, RecordingResponder};
    use crate::context::{ExecutionContext, Principal};
    use crate::types::{handler_fn, Capability, Overload, ParameterSpec};

    struct Everyone;

    #[async_trait]
    impl CapabilityService for Everyone {
        async fn holds(&self, _: &Principal, _: Capability, _: &ExecutionContext) -> bool {
            true
        }
    }

    fn registry() -> Arc<Registry> {
        let mut registry = Registry::new();
        registry
            .register(
                crate::types::CommandSpec::new("echo").alias("say").overload(
                    Overload::new(handler_fn(|_ctx, args| async move {
                        Ok(InvocationResult::text(args.text("text")?))
                    }))
                    .param(ParameterSpec::text("text").remainder()),
                ),
            )
            .unwrap();
        Arc::new(registry)
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(registry(), Arc::new(Everyone))
    }

    #[tokio::test]
    async fn test_plain_chatter_is_ignored() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = group_context("echo hello", responder.clone());
        assert!(dispatcher().handle_message(&ctx).await.is_none());

        let ctx = group_context("! echo hello", responder.clone());
        assert!(dispatcher().handle_message(&ctx).await.is_none());

        let ctx = group_context("!unknown thing", responder.clone());
        assert!(dispatcher().handle_message(&ctx).await.is_none());
        assert!(responder.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_alias_is_case_insensitive() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = direct_context("!SAY hi there", responder.clone());
        let result = dispatcher().handle_message(&ctx).await.unwrap();
        assert_eq!(result.text_content(), Some("hi there"));
        assert_eq!(responder.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let dispatcher = dispatcher().with_prefixes(Arc::new(StaticPrefix("bot.".into())));
        let ctx = group_context("bot.echo ok", Arc::new(RecordingResponder::default()));
        let result = dispatcher.handle_message(&ctx).await.unwrap();
        assert_eq!(result.text_content(), Some("ok"));
    }

    #[tokio::test]
    async fn test_run_does_not_deliver() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = scheduled_context("echo tick", responder.clone());
        let result = dispatcher().run(&ctx, "echo tick").await;
        assert_eq!(result.text_content(), Some("tick"));
        assert!(responder.delivered.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_unknown_command_reports_error() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = scheduled_context("nope", responder.clone());
        let result = dispatcher().dispatch(&ctx, "!nope").await;
        assert_eq!(
            result,
            InvocationResult::error_titled("Unknown Command", "There is no command named `nope`")
        );
        assert_eq!(responder.delivered.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_registry() {
        let dispatcher = dispatcher();
        dispatcher.replace_registry(Arc::new(Registry::new())).await;

        let ctx = group_context("!echo hi", Arc::new(RecordingResponder::default()));
        assert!(dispatcher.handle_message(&ctx).await.is_none());
    }
}
