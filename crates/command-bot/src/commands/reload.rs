//! Reload command - rereads the settings files and rebuilds the registry.

use crate::commands::{build_registry, CommandDeps};
use async_trait::async_trait;
use command_engine::{
    Arguments, Capability, CommandSpec, ExecutionContext, Handler, HandlerResult,
    InvocationResult, Overload, Scope,
};
use std::sync::Arc;
use tracing::info;

pub fn spec(deps: CommandDeps) -> CommandSpec {
    CommandSpec::new("reload")
        .help("Rereads the settings files and restarts every command and timer")
        .overload(
            Overload::new(Arc::new(ReloadHandler::new(deps)))
                .scopes(Scope::LIVE)
                .require(Capability::Owner),
        )
}

pub struct ReloadHandler {
    deps: CommandDeps,
}

impl ReloadHandler {
    pub fn new(deps: CommandDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Handler for ReloadHandler {
    async fn call(&self, _ctx: &ExecutionContext, _args: Arguments) -> HandlerResult {
        let Some(dispatcher) = self.deps.dispatcher.get() else {
            anyhow::bail!("dispatcher is not bound yet");
        };

        self.deps.stores.reload_all().await?;
        let registry = build_registry(&self.deps)?;
        let commands = registry.len();
        dispatcher.replace_registry(Arc::new(registry)).await;
        let timers = self.deps.scheduler.restore().await?;

        info!(commands, timers, "Reloaded");
        Ok(InvocationResult::text(format!(
            "Reloaded {} commands and {} timers",
            commands, timers
        )))
    }
}
