//! Execution contexts: the closed set of callers the engine serves.
//!
//! Each variant only exposes the capabilities that make sense for it.
//! Handlers and the gate query availability instead of assuming it.

use crate::error::DeliveryError;
use crate::result::InvocationResult;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// The user who sent a live trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub display_name: Option<String>,
}

/// Kind of conversation a channel is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Group,
    Direct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: String,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildInfo {
    pub id: String,
    pub name: Option<String>,
}

/// Identifies one message previously sent by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    pub channel: String,
    pub timestamp: i64,
}

/// A message typed by a user.
#[derive(Debug, Clone)]
pub struct LiveTrigger {
    pub principal: Principal,
    pub text: String,
    pub channel: ChannelInfo,
    pub guild: Option<GuildInfo>,
    pub timestamp: i64,
}

/// A periodically regenerated surface such as a group description.
/// Runs with the bot's own authority.
#[derive(Debug, Clone)]
pub struct RenderedSurface {
    pub channel: ChannelInfo,
    pub guild: GuildInfo,
    pub cadence: Duration,
}

/// A bot message that is rewritten on a timer with the output of one
/// backing command.
#[derive(Debug, Clone)]
pub struct ScheduledRefresh {
    pub channel: ChannelInfo,
    pub guild: Option<GuildInfo>,
    pub target: MessageRef,
    pub command: String,
    pub interval: Duration,
}

/// Closed set of caller shapes.
#[derive(Debug, Clone)]
pub enum Origin {
    Live(LiveTrigger),
    Surface(RenderedSurface),
    Scheduled(ScheduledRefresh),
}

/// Where an overload is permitted to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    GroupMessage,
    DirectMessage,
    RenderedSurface,
    ScheduledRefresh,
}

impl Scope {
    pub const ALL: &'static [Scope] = &[
        Scope::GroupMessage,
        Scope::DirectMessage,
        Scope::RenderedSurface,
        Scope::ScheduledRefresh,
    ];

    pub const LIVE: &'static [Scope] = &[Scope::GroupMessage, Scope::DirectMessage];
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::GroupMessage => "group chat",
            Scope::DirectMessage => "direct message",
            Scope::RenderedSurface => "group description",
            Scope::ScheduledRefresh => "dynamic message",
        };
        f.write_str(name)
    }
}

/// Capabilities a context may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextCapability {
    Reply,
    ChannelInfo,
    GuildInfo,
    PrincipalInfo,
}

impl fmt::Display for ContextCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextCapability::Reply => "a reply channel",
            ContextCapability::ChannelInfo => "channel information",
            ContextCapability::GuildInfo => "a group",
            ContextCapability::PrincipalInfo => "an invoking user",
        };
        f.write_str(name)
    }
}

/// Delivers results for a context (the Reply capability).
#[async_trait]
pub trait Responder: Send + Sync {
    async fn deliver(&self, origin: &Origin, result: &InvocationResult)
        -> Result<(), DeliveryError>;
}

/// Per-trigger execution context.
#[derive(Clone)]
pub struct ExecutionContext {
    origin: Origin,
    responder: Arc<dyn Responder>,
}

impl ExecutionContext {
    pub fn new(origin: Origin, responder: Arc<dyn Responder>) -> Self {
        Self { origin, responder }
    }

    pub fn live(trigger: LiveTrigger, responder: Arc<dyn Responder>) -> Self {
        Self::new(Origin::Live(trigger), responder)
    }

    pub fn surface(surface: RenderedSurface, responder: Arc<dyn Responder>) -> Self {
        Self::new(Origin::Surface(surface), responder)
    }

    pub fn scheduled(refresh: ScheduledRefresh, responder: Arc<dyn Responder>) -> Self {
        Self::new(Origin::Scheduled(refresh), responder)
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn scope(&self) -> Scope {
        match &self.origin {
            Origin::Live(live) => match live.channel.kind {
                ChannelKind::Group => Scope::GroupMessage,
                ChannelKind::Direct => Scope::DirectMessage,
            },
            Origin::Surface(_) => Scope::RenderedSurface,
            Origin::Scheduled(_) => Scope::ScheduledRefresh,
        }
    }

    /// Only live triggers have a principal.
    pub fn principal(&self) -> Option<&Principal> {
        match &self.origin {
            Origin::Live(live) => Some(&live.principal),
            _ => None,
        }
    }

    pub fn channel(&self) -> Option<&ChannelInfo> {
        match &self.origin {
            Origin::Live(live) => Some(&live.channel),
            Origin::Surface(surface) => Some(&surface.channel),
            Origin::Scheduled(refresh) => Some(&refresh.channel),
        }
    }

    pub fn guild(&self) -> Option<&GuildInfo> {
        match &self.origin {
            Origin::Live(live) => live.guild.as_ref(),
            Origin::Surface(surface) => Some(&surface.guild),
            Origin::Scheduled(refresh) => refresh.guild.as_ref(),
        }
    }

    /// Raw text of a live trigger.
    pub fn raw_text(&self) -> Option<&str> {
        match &self.origin {
            Origin::Live(live) => Some(&live.text),
            _ => None,
        }
    }

    pub fn provides(&self, capability: ContextCapability) -> bool {
        match capability {
            ContextCapability::Reply => true,
            ContextCapability::ChannelInfo => self.channel().is_some(),
            ContextCapability::GuildInfo => self.guild().is_some(),
            ContextCapability::PrincipalInfo => self.principal().is_some(),
        }
    }

    /// Guild id if present, otherwise the channel id.
    pub fn storage_key(&self) -> Option<&str> {
        self.guild()
            .map(|g| g.id.as_str())
            .or_else(|| self.channel().map(|c| c.id.as_str()))
    }

    /// Deliver a result through this context's reply capability.
    pub async fn reply(&self, result: &InvocationResult) -> Result<(), DeliveryError> {
        if result.is_empty() {
            return Ok(());
        }
        self.responder.deliver(&self.origin, result).await
    }

    /// Deliver plain text.
    pub async fn say(&self, text: impl Into<String>) -> Result<(), DeliveryError> {
        self.reply(&InvocationResult::text(text)).await
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Responder that records every delivered result.
    #[derive(Default)]
    pub struct RecordingResponder {
        pub delivered: Mutex<Vec<InvocationResult>>,
    }

    #[async_trait]
    impl Responder for RecordingResponder {
        async fn deliver(
            &self,
            _origin: &Origin,
            result: &InvocationResult,
        ) -> Result<(), DeliveryError> {
            self.delivered.lock().await.push(result.clone());
            Ok(())
        }
    }

    pub fn group_context(text: &str, responder: Arc<RecordingResponder>) -> ExecutionContext {
        ExecutionContext::live(
            LiveTrigger {
                principal: Principal {
                    id: "+14155551234".into(),
                    display_name: Some("Test User".into()),
                },
                text: text.into(),
                channel: ChannelInfo {
                    id: "group-1".into(),
                    kind: ChannelKind::Group,
                },
                guild: Some(GuildInfo {
                    id: "group-1".into(),
                    name: None,
                }),
                timestamp: 1677652288000,
            },
            responder,
        )
    }

    pub fn direct_context(text: &str, responder: Arc<RecordingResponder>) -> ExecutionContext {
        ExecutionContext::live(
            LiveTrigger {
                principal: Principal {
                    id: "+14155551234".into(),
                    display_name: None,
                },
                text: text.into(),
                channel: ChannelInfo {
                    id: "+14155551234".into(),
                    kind: ChannelKind::Direct,
                },
                guild: None,
                timestamp: 1677652288000,
            },
            responder,
        )
    }

    pub fn scheduled_context(command: &str, responder: Arc<RecordingResponder>) -> ExecutionContext {
        ExecutionContext::scheduled(
            ScheduledRefresh {
                channel: ChannelInfo {
                    id: "group-1".into(),
                    kind: ChannelKind::Group,
                },
                guild: Some(GuildInfo {
                    id: "group-1".into(),
                    name: None,
                }),
                target: MessageRef {
                    channel: "group-1".into(),
                    timestamp: 1677652299000,
                },
                command: command.into(),
                interval: Duration::from_secs(60),
            },
            responder,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_live_group_capabilities() {
        let ctx = group_context("!hello", Arc::new(RecordingResponder::default()));
        assert_eq!(ctx.scope(), Scope::GroupMessage);
        assert!(ctx.provides(ContextCapability::PrincipalInfo));
        assert!(ctx.provides(ContextCapability::GuildInfo));
        assert_eq!(ctx.raw_text(), Some("!hello"));
    }

    #[test]
    fn test_direct_message_has_no_guild() {
        let ctx = direct_context("!hello", Arc::new(RecordingResponder::default()));
        assert_eq!(ctx.scope(), Scope::DirectMessage);
        assert!(!ctx.provides(ContextCapability::GuildInfo));
        assert_eq!(ctx.storage_key(), Some("+14155551234"));
    }

    #[test]
    fn test_scheduled_refresh_has_no_principal() {
        let ctx = scheduled_context("countdown launch", Arc::new(RecordingResponder::default()));
        assert_eq!(ctx.scope(), Scope::ScheduledRefresh);
        assert!(ctx.principal().is_none());
        assert!(!ctx.provides(ContextCapability::PrincipalInfo));
        assert!(ctx.provides(ContextCapability::Reply));
    }

    #[tokio::test]
    async fn test_empty_result_is_not_delivered() {
        let responder = Arc::new(RecordingResponder::default());
        let ctx = group_context("!hello", responder.clone());

        ctx.reply(&InvocationResult::empty()).await.unwrap();
        ctx.say("hi").await.unwrap();

        let delivered = responder.delivered.lock().await;
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text_content(), Some("hi"));
    }
}
