//! Countdown command - named countdowns per group or conversation.

use crate::time::format_long;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use command_engine::{
    Arguments, CommandSpec, ContextCapability, ExecutionContext, Handler, HandlerResult,
    InvocationResult, Overload, ParameterSpec, Scope,
};
use settings_store::SettingsStore;
use std::collections::HashMap;
use std::sync::Arc;

type Countdowns = HashMap<String, DateTime<FixedOffset>>;

pub fn spec(countdowns: SettingsStore) -> CommandSpec {
    CommandSpec::new("countdown")
        .help("Creates, edits, deletes or shows a countdown")
        .overload(
            Overload::new(Arc::new(CountdownHandler::new(countdowns.clone())))
                .param(ParameterSpec::choice("action", ["create", "edit", "delete"]))
                .param(ParameterSpec::text("name"))
                .param(ParameterSpec::date_time("date").optional().remainder())
                .priority(1)
                .scopes(Scope::LIVE)
                .needs(ContextCapability::ChannelInfo),
        )
        .overload(
            Overload::new(Arc::new(CountdownStatusHandler::new(countdowns)))
                .param(ParameterSpec::text("name"))
                .priority(0)
                .needs(ContextCapability::ChannelInfo),
        )
}

/// Creates, edits and deletes countdowns.
pub struct CountdownHandler {
    countdowns: SettingsStore,
}

impl CountdownHandler {
    pub fn new(countdowns: SettingsStore) -> Self {
        Self { countdowns }
    }
}

enum Change {
    AlreadyExists,
    NotFound,
    Deleted,
    NeedsDate,
    Set(DateTime<FixedOffset>),
}

#[async_trait]
impl Handler for CountdownHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let key = storage_key(ctx)?;
        let action = args.choice("action")?;
        let name = args.text("name")?;
        let date = args.opt_date_time("date")?;

        let change = self
            .countdowns
            .update(key, |countdowns: &mut Countdowns| match action {
                "create" if countdowns.contains_key(name) => Change::AlreadyExists,
                "edit" | "delete" if !countdowns.contains_key(name) => Change::NotFound,
                "delete" => {
                    countdowns.remove(name);
                    Change::Deleted
                }
                _ => match date {
                    Some(date) => {
                        countdowns.insert(name.to_string(), date);
                        Change::Set(date)
                    }
                    None => Change::NeedsDate,
                },
            })
            .await?;

        let reply = match change {
            Change::AlreadyExists => InvocationResult::error(format!(
                "The countdown with the name {} already exists",
                name
            )),
            Change::NotFound => InvocationResult::error(format!(
                "The countdown with the name {} does not exist",
                name
            )),
            Change::NeedsDate => InvocationResult::error(
                "Please provide a date when creating or editing a countdown",
            ),
            Change::Deleted => {
                self.countdowns.save().await?;
                InvocationResult::text(format!("Successfully deleted countdown {}", name))
            }
            Change::Set(date) => {
                self.countdowns.save().await?;
                InvocationResult::text(describe(name, date, Utc::now()))
            }
        };
        Ok(reply)
    }
}

/// Shows the time left on a countdown.
pub struct CountdownStatusHandler {
    countdowns: SettingsStore,
}

impl CountdownStatusHandler {
    pub fn new(countdowns: SettingsStore) -> Self {
        Self { countdowns }
    }
}

#[async_trait]
impl Handler for CountdownStatusHandler {
    async fn call(&self, ctx: &ExecutionContext, args: Arguments) -> HandlerResult {
        let key = storage_key(ctx)?;
        let name = args.text("name")?;

        let countdowns: Countdowns = self.countdowns.get(key).await?.unwrap_or_default();
        match countdowns.get(name) {
            Some(date) => Ok(InvocationResult::text(describe(name, *date, Utc::now()))),
            None => Ok(InvocationResult::error(format!(
                "No countdown with the name {} was found. Try creating it.",
                name
            ))),
        }
    }
}

fn storage_key(ctx: &ExecutionContext) -> anyhow::Result<&str> {
    ctx.storage_key()
        .ok_or_else(|| anyhow::anyhow!("context has no channel"))
}

fn describe(name: &str, date: DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let left = date.with_timezone(&Utc) - now;
    if left < chrono::TimeDelta::zero() {
        format!("{} was {} ago", name, format_long(-left))
    } else {
        format!("{} until {}", format_long(left), name)
    }
}
