//! Dynamicmessage command - a message rewritten on a timer with the
//! output of another command.

use crate::commands::CommandDeps;
use crate::handle::DispatcherHandle;
use crate::scheduler::RefreshScheduler;
use crate::storage::{DynamicMessage, DYNAMIC_MESSAGES};
use async_trait::async_trait;
use command_engine::{
    Arguments, Capability, CommandSpec, ContextCapability, ExecutionContext, Handler,
    HandlerResult, InvocationResult, Overload, ParameterSpec, Scope,
};
use settings_store::SettingsStore;
use signal_client::SignalClient;
use std::sync::Arc;
use tracing::info;

pub fn spec(deps: &CommandDeps) -> CommandSpec {
    CommandSpec::new("dynamicmessage")
        .help("Creates a message that runs a command automatically every specified number of minutes")
        .overload(
            Overload::new(Arc::new(DynamicMessageHandler::new(deps)))
                .param(ParameterSpec::unsigned("interval").display("interval (minutes)"))
                .param(ParameterSpec::text("command").remainder())
                .scopes(&[Scope::GroupMessage])
                .require(Capability::ManageMessages)
                .needs(ContextCapability::ChannelInfo),
        )
}

pub struct DynamicMessageHandler {
    signal: SignalClient,
    schedules: SettingsStore,
    scheduler: Arc<RefreshScheduler>,
    dispatcher: DispatcherHandle,
}

impl DynamicMessageHandler {
    pub fn new(deps: &CommandDeps) -> Self {
        Self {
            signal: deps.signal.clone(),
            schedules: deps.stores.schedules.clone(),
            scheduler: deps.scheduler.clone(),
            dispatcher: deps.dispatcher.clone(),
        }
    }
}

#[async_trait]
impl Handler for DynamicMessageHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let interval = args.unsigned("interval")?;
        let command = args.text("command")?.to_string();
        if interval == 0 {
            return Ok(InvocationResult::error("Interval must be greater than zero"));
        }

        if let Some(dispatcher) = self.dispatcher.get() {
            let prefix = dispatcher.prefix_for(ctx).await;
            let name = command
                .split_whitespace()
                .next()
                .map(|n| n.strip_prefix(prefix.as_str()).unwrap_or(n))
                .unwrap_or_default();
            if dispatcher.registry().await.lookup(name).is_err() {
                return Ok(InvocationResult::error_titled(
                    "Unknown Command",
                    format!("There is no command named `{}`", name),
                ));
            }
        }

        let channel = ctx
            .channel()
            .ok_or_else(|| anyhow::anyhow!("context has no channel"))?
            .id
            .clone();
        let sent = self
            .signal
            .send(&channel, &format!("Loading dynamic message with command '{}'", command))
            .await?;
        let Some(message_timestamp) = sent else {
            return Ok(InvocationResult::error(
                "Signal did not report a timestamp for the new message, so it cannot be updated",
            ));
        };

        let record = DynamicMessage {
            channel,
            guild: ctx.guild().map(|g| g.id.clone()),
            message_timestamp,
            command,
            interval_minutes: interval,
        };
        let saved = record.clone();
        self.schedules
            .update(DYNAMIC_MESSAGES, move |messages: &mut Vec<DynamicMessage>| {
                messages.push(saved)
            })
            .await?;
        self.schedules.save().await?;

        info!(key = %record.key(), every = interval, "Dynamic message created");
        self.scheduler.start_refresh(record).await;
        Ok(InvocationResult::empty())
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::{bot, group, run};
    use command_engine::InvocationResult;

    #[tokio::test]
    async fn test_rejects_zero_interval() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+2000", "!dynamicmessage 0 echo hi")).await,
            InvocationResult::error("Interval must be greater than zero")
        );
        assert_eq!(bot.scheduler().active().await, 0);
    }

    #[tokio::test]
    async fn test_rejects_unknown_command() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+2000", "!dynamicmessage 5 !nope")).await,
            InvocationResult::error_titled("Unknown Command", "There is no command named `nope`")
        );
    }

    #[tokio::test]
    async fn test_members_cannot_create() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+3000", "!dynamicmessage 5 echo hi")).await,
            InvocationResult::error_titled(
                "Permission Error",
                "You need the `Manage Messages` permission to use this command"
            )
        );
    }
}
