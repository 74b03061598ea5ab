//! Setprefix command - changes the command prefix for a conversation.

use crate::prefix::CUSTOM_PREFIXES;
use async_trait::async_trait;
use command_engine::{
    Arguments, Capability, ChannelKind, CommandSpec, ExecutionContext, Handler, HandlerResult,
    InvocationResult, Overload, ParameterSpec, Scope,
};
use settings_store::SettingsStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const MAX_PREFIX_CHARS: usize = 16;

pub struct SetPrefixHandler {
    settings: SettingsStore,
}

impl SetPrefixHandler {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }
}

pub fn spec(settings: SettingsStore) -> CommandSpec {
    CommandSpec::new("setprefix")
        .help("Sets the command prefix for this group or conversation")
        .overload(
            Overload::new(Arc::new(SetPrefixHandler::new(settings)))
                .param(ParameterSpec::text("prefix").remainder())
                .scopes(Scope::LIVE)
                .require(Capability::ManageGroup),
        )
}

#[async_trait]
impl Handler for SetPrefixHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let prefix = args.text("prefix")?;
        if prefix.chars().count() > MAX_PREFIX_CHARS {
            return Ok(InvocationResult::error(format!(
                "Prefix must be no more than {} characters in length",
                MAX_PREFIX_CHARS
            )));
        }

        let Some(key) = ctx.storage_key() else {
            return Ok(InvocationResult::error("There is no conversation to set a prefix for"));
        };

        self.settings
            .update(CUSTOM_PREFIXES, |prefixes: &mut HashMap<String, String>| {
                prefixes.insert(key.to_string(), prefix.to_string())
            })
            .await?;
        self.settings.save().await?;
        info!(conversation = %key, prefix = %prefix, "Prefix changed");

        let place = match ctx.channel().map(|c| c.kind) {
            Some(ChannelKind::Group) => "group",
            _ => "conversation",
        };
        Ok(InvocationResult::text(format!(
            "Prefix set to `{}` for this {}",
            prefix, place
        )))
    }
}
