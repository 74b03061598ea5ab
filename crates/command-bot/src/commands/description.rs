//! Description command - keeps a group description generated from a
//! template.

use crate::commands::CommandDeps;
use crate::scheduler::{RefreshScheduler, SurfaceRenderer};
use crate::storage::DESCRIPTIONS;
use async_trait::async_trait;
use command_engine::{
    Arguments, Capability, CommandSpec, ContextCapability, ExecutionContext, Handler,
    HandlerResult, InvocationResult, Overload, ParameterSpec, Scope,
};
use settings_store::SettingsStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

pub fn spec(deps: &CommandDeps) -> CommandSpec {
    CommandSpec::new("description")
        .alias("topic")
        .help("Regenerates the group description from a template; {{command}} segments are replaced by command output. `off` stops it")
        .overload(
            Overload::new(Arc::new(DescriptionHandler::new(deps)))
                .param(ParameterSpec::text("template").remainder())
                .scopes(&[Scope::GroupMessage])
                .require(Capability::ManageGroup)
                .needs(ContextCapability::GuildInfo),
        )
}

pub struct DescriptionHandler {
    schedules: SettingsStore,
    scheduler: Arc<RefreshScheduler>,
}

impl DescriptionHandler {
    pub fn new(deps: &CommandDeps) -> Self {
        Self {
            schedules: deps.stores.schedules.clone(),
            scheduler: deps.scheduler.clone(),
        }
    }
}

#[async_trait]
impl Handler for DescriptionHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let template = args.text("template")?;
        let group_id = ctx
            .guild()
            .ok_or_else(|| anyhow::anyhow!("context has no group"))?
            .id
            .clone();

        if template.eq_ignore_ascii_case("off") {
            let removed = self
                .schedules
                .update(DESCRIPTIONS, |templates: &mut HashMap<String, String>| {
                    templates.remove(&group_id).is_some()
                })
                .await?;
            self.schedules.save().await?;
            self.scheduler.stop_surface(&group_id).await;

            return Ok(if removed {
                InvocationResult::text("The group description will no longer be updated")
            } else {
                InvocationResult::error("This group has no description template")
            });
        }

        let commands = SurfaceRenderer::new(template).commands().count();
        self.schedules
            .update(DESCRIPTIONS, |templates: &mut HashMap<String, String>| {
                templates.insert(group_id.clone(), template.to_string())
            })
            .await?;
        self.schedules.save().await?;
        self.scheduler
            .start_surface(group_id.clone(), template.to_string())
            .await;

        info!(group = %group_id, commands, "Description template set");
        Ok(InvocationResult::text(format!(
            "The group description will be regenerated every {} ({} command{})",
            humantime::format_duration(self.scheduler.surface_cadence()),
            commands,
            if commands == 1 { "" } else { "s" }
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::DESCRIPTIONS;
    use crate::testing::{bot, direct, group, run};
    use command_engine::InvocationResult;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_set_and_clear_template() {
        let bot = bot();
        assert_eq!(
            run(&bot, group("+2000", "!topic Launch in {{countdown launch}}")).await,
            InvocationResult::text("The group description will be regenerated every 10m (1 command)")
        );
        assert_eq!(bot.scheduler().active().await, 1);

        let saved: HashMap<String, String> =
            bot.stores().schedules.get(DESCRIPTIONS).await.unwrap().unwrap();
        assert_eq!(saved["group-1"], "Launch in {{countdown launch}}");

        assert_eq!(
            run(&bot, group("+2000", "!description off")).await,
            InvocationResult::text("The group description will no longer be updated")
        );
        assert_eq!(bot.scheduler().active().await, 0);
        assert_eq!(
            run(&bot, group("+2000", "!description OFF")).await,
            InvocationResult::error("This group has no description template")
        );
    }

    #[tokio::test]
    async fn test_group_only() {
        let bot = bot();
        assert_eq!(
            run(&bot, direct("+2000", "!description hi")).await,
            InvocationResult::error_titled("Scope Error", "This command can only be used in: group chat")
        );
    }
}
