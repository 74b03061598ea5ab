//! Help command - lists commands or shows usage for one.

use crate::handle::DispatcherHandle;
use async_trait::async_trait;
use command_engine::{
    Arguments, CommandSpec, ExecutionContext, Handler, HandlerResult, InvocationResult, Overload,
    ParameterSpec, RichPayload,
};
use std::sync::Arc;

pub struct HelpHandler {
    dispatcher: DispatcherHandle,
}

impl HelpHandler {
    pub fn new(dispatcher: DispatcherHandle) -> Self {
        Self { dispatcher }
    }
}

pub fn spec(dispatcher: DispatcherHandle) -> CommandSpec {
    CommandSpec::new("help")
        .alias("man")
        .help("Lists commands, or shows how to use one")
        .overload(
            Overload::new(Arc::new(HelpHandler::new(dispatcher)))
                .param(ParameterSpec::text("command").optional()),
        )
}

#[async_trait]
impl Handler for HelpHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let Some(dispatcher) = self.dispatcher.get() else {
            return Ok(InvocationResult::error("Commands are still loading"));
        };
        let registry = dispatcher.registry().await;
        let prefix = dispatcher.prefix_for(ctx).await;

        if let Some(name) = args.opt_text("command")? {
            let name = name.strip_prefix(prefix.as_str()).unwrap_or(name);
            let Ok(spec) = registry.lookup(name) else {
                return Ok(InvocationResult::error_titled(
                    "Unknown Command",
                    format!("There is no command named `{}`", name),
                ));
            };

            let mut payload = RichPayload::new()
                .title(format!("{}{}", prefix, spec.name))
                .description(spec.help.clone())
                .field("Usage", spec.usages(&prefix).join("\n"));
            if !spec.aliases.is_empty() {
                payload = payload.field("Aliases", spec.aliases.join(", "));
            }
            let scopes: Vec<String> = spec.allowed_scopes().iter().map(ToString::to_string).collect();
            payload = payload.field("Works in", scopes.join(", "));
            return Ok(InvocationResult::rich(payload));
        }

        let scope = ctx.scope();
        let payload = registry
            .commands()
            .iter()
            .filter(|spec| spec.allows(scope))
            .fold(
                RichPayload::new()
                    .title("Commands")
                    .description(format!("Use {}help <command> for details", prefix)),
                |payload, spec| payload.inline_field(format!("{}{}", prefix, spec.name), spec.help.clone()),
            );
        Ok(InvocationResult::rich(payload))
    }
}
