//! Remind command - replies again after a delay or at a time.

use crate::time::format_long;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use command_engine::{
    Arguments, CommandSpec, ContextCapability, ExecutionContext, Handler, HandlerResult,
    InvocationResult, Overload, ParameterSpec, Scope,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub fn spec() -> CommandSpec {
    let handler = Arc::new(RemindHandler);
    CommandSpec::new("remind")
        .alias("reminder")
        .help("Reminds you about something later")
        .overload(
            Overload::new(handler.clone())
                .param(ParameterSpec::duration("delay"))
                .param(ParameterSpec::text("message").remainder())
                .priority(1)
                .scopes(Scope::LIVE)
                .needs(ContextCapability::PrincipalInfo),
        )
        .overload(
            Overload::new(handler)
                .param(ParameterSpec::date_time("time"))
                .param(ParameterSpec::text("message").remainder())
                .priority(0)
                .scopes(Scope::LIVE)
                .needs(ContextCapability::PrincipalInfo),
        )
}

/// Holds on to the trigger's context and replies through it when the
/// reminder is due. Pending reminders live in memory only.
pub struct RemindHandler;

#[async_trait]
impl Handler for RemindHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let message = args.text("message")?.to_string();
        let now = Utc::now();

        let delay = match (args.opt_duration("delay")?, args.opt_date_time("time")?) {
            (Some(delay), _) => delay,
            (None, Some(at)) => match until(at, now) {
                Some(delay) => delay,
                None => return Ok(InvocationResult::error("That time has already passed")),
            },
            (None, None) => anyhow::bail!("neither a delay nor a time was bound"),
        };

        let who = ctx
            .principal()
            .map(|p| p.display_name.clone().unwrap_or_else(|| p.id.clone()))
            .unwrap_or_default();
        let reply_ctx = ctx.clone();
        let reminder = format!("⏰ Reminder for {}: {}", who, message);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match reply_ctx.say(reminder).await {
                Ok(()) => debug!("Reminder delivered"),
                Err(e) => warn!(error = %e, "Reminder delivery failed"),
            }
        });

        let wait = TimeDelta::from_std(delay).unwrap_or_else(|_| TimeDelta::zero());
        Ok(InvocationResult::text(format!(
            "I'll remind you in {}",
            format_long(wait)
        )))
    }
}

fn until(at: DateTime<FixedOffset>, now: DateTime<Utc>) -> Option<Duration> {
    (at.with_timezone(&Utc) - now).to_std().ok().filter(|d| !d.is_zero())
}
