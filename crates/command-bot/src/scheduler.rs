//! Timers for dynamic messages and rendered group descriptions.
//!
//! Each dynamic message and each described group runs on its own interval
//! task. A cycle that fails is logged and the timer keeps going.

use crate::handle::DispatcherHandle;
use crate::storage::{DynamicMessage, DESCRIPTIONS, DYNAMIC_MESSAGES};
use crate::transport::render;
use command_engine::{
    ChannelInfo, ChannelKind, Dispatcher, ExecutionContext, GuildInfo, InvocationResult,
    MessageRef, RenderedSurface, Responder, ScheduledRefresh,
};
use settings_store::{SettingsError, SettingsStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const MIN_PERIOD: Duration = Duration::from_secs(1);

pub struct RefreshScheduler {
    dispatcher: DispatcherHandle,
    responder: Arc<dyn Responder>,
    schedules: SettingsStore,
    surface_cadence: Duration,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(
        dispatcher: DispatcherHandle,
        responder: Arc<dyn Responder>,
        schedules: SettingsStore,
        surface_cadence: Duration,
    ) -> Self {
        Self {
            dispatcher,
            responder,
            schedules,
            surface_cadence: surface_cadence.max(MIN_PERIOD),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start rewriting a dynamic message. The first refresh runs at once.
    pub async fn start_refresh(&self, record: DynamicMessage) {
        let period = Duration::from_secs(record.interval_minutes.saturating_mul(60)).max(MIN_PERIOD);
        let kind = if record.guild.is_some() {
            ChannelKind::Group
        } else {
            ChannelKind::Direct
        };
        let key = record.key();
        let command = record.command.clone();

        let ctx = ExecutionContext::scheduled(
            ScheduledRefresh {
                channel: ChannelInfo {
                    id: record.channel.clone(),
                    kind,
                },
                guild: record.guild.map(|id| GuildInfo { id, name: None }),
                target: MessageRef {
                    channel: record.channel,
                    timestamp: record.message_timestamp,
                },
                command: command.clone(),
                interval: period,
            },
            self.responder.clone(),
        );

        let dispatcher = self.dispatcher.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(dispatcher) = dispatcher.get() else {
                    debug!(key = %task_key, "Dispatcher not bound, skipping refresh");
                    continue;
                };

                let result = dispatcher.dispatch(&ctx, &command).await;
                if let InvocationResult::Error { title, description } = &result {
                    warn!(key = %task_key, %title, %description, "Dynamic message refresh failed");
                }
            }
        });

        self.insert(key, task).await;
    }

    /// Start regenerating a group's description from `template`.
    pub async fn start_surface(&self, group_id: String, template: String) {
        let key = surface_key(&group_id);
        let ctx = ExecutionContext::surface(
            RenderedSurface {
                channel: ChannelInfo {
                    id: group_id.clone(),
                    kind: ChannelKind::Group,
                },
                guild: GuildInfo {
                    id: group_id,
                    name: None,
                },
                cadence: self.surface_cadence,
            },
            self.responder.clone(),
        );

        let renderer = SurfaceRenderer::new(&template);
        let dispatcher = self.dispatcher.clone();
        let cadence = self.surface_cadence;
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(cadence);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut last: Option<String> = None;
            loop {
                ticker.tick().await;
                let Some(dispatcher) = dispatcher.get() else {
                    continue;
                };

                let text = renderer.render(dispatcher, &ctx).await;
                if last.as_deref() == Some(text.as_str()) {
                    continue;
                }
                match ctx.say(text.clone()).await {
                    Ok(()) => last = Some(text),
                    Err(e) => warn!(key = %task_key, error = %e, "Description update failed"),
                }
            }
        });

        self.insert(key, task).await;
    }

    /// Stop the timer of a dynamic message or described group.
    pub async fn stop(&self, key: &str) -> bool {
        match self.tasks.lock().await.remove(key) {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub async fn stop_surface(&self, group_id: &str) -> bool {
        self.stop(&surface_key(group_id)).await
    }

    /// Restart every timer from the schedules file. Returns how many run.
    pub async fn restore(&self) -> Result<usize, SettingsError> {
        let messages: Vec<DynamicMessage> =
            self.schedules.get(DYNAMIC_MESSAGES).await?.unwrap_or_default();
        let descriptions: HashMap<String, String> =
            self.schedules.get(DESCRIPTIONS).await?.unwrap_or_default();

        self.shutdown().await;

        for message in messages {
            if message.interval_minutes == 0 {
                warn!(key = %message.key(), "Skipping dynamic message with zero interval");
                continue;
            }
            self.start_refresh(message).await;
        }
        for (group_id, template) in descriptions {
            self.start_surface(group_id, template).await;
        }

        let active = self.active().await;
        info!(timers = active, "Schedules restored");
        Ok(active)
    }

    /// How often rendered descriptions are recomputed.
    pub fn surface_cadence(&self) -> Duration {
        self.surface_cadence
    }

    pub async fn active(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// Abort every timer.
    pub async fn shutdown(&self) {
        for (_, task) in self.tasks.lock().await.drain() {
            task.abort();
        }
    }

    async fn insert(&self, key: String, task: JoinHandle<()>) {
        debug!(key = %key, "Timer started");
        if let Some(previous) = self.tasks.lock().await.insert(key, task) {
            previous.abort();
        }
    }
}

fn surface_key(group_id: &str) -> String {
    format!("surface:{}", group_id)
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Command(String),
}

/// Composes a description from a template whose `{{command}}` segments
/// are replaced by the output of each command.
#[derive(Debug, Clone)]
pub struct SurfaceRenderer {
    segments: Vec<Segment>,
}

impl SurfaceRenderer {
    pub fn new(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            segments.push(Segment::Command(rest[start + 2..start + 2 + len].trim().to_string()));
            rest = &rest[start + 2 + len + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Self { segments }
    }

    /// Commands the template runs, in order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Command(c) => Some(c.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub async fn render(&self, dispatcher: &Dispatcher, ctx: &ExecutionContext) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Command(command) => {
                    let result = dispatcher.run(ctx, command).await;
                    match &result {
                        InvocationResult::Error { description, .. } => out.push_str(description),
                        InvocationResult::Success { .. } => {
                            out.push_str(&render(&result).unwrap_or_default())
                        }
                    }
                }
            }
        }
        out
    }
}
