//! Signal adapter for the engine: builds contexts from inbound messages and
//! delivers results back through the REST API.

use async_trait::async_trait;
use command_engine::{
    ChannelInfo, ChannelKind, DeliveryError, ExecutionContext, GuildInfo, InvocationResult,
    LiveTrigger, Origin, Principal, Responder, RichPayload,
};
use signal_client::{BotMessage, SignalClient};
use std::sync::Arc;
use tracing::debug;

/// Delivers results according to where the trigger came from.
#[derive(Clone)]
pub struct SignalResponder {
    signal: SignalClient,
}

impl SignalResponder {
    pub fn new(signal: SignalClient) -> Self {
        Self { signal }
    }
}

#[async_trait]
impl Responder for SignalResponder {
    async fn deliver(
        &self,
        origin: &Origin,
        result: &InvocationResult,
    ) -> Result<(), DeliveryError> {
        let Some(text) = render(result) else {
            return Ok(());
        };

        let delivered = match origin {
            Origin::Live(trigger) => self.signal.send(&trigger.channel.id, &text).await.map(|_| ()),
            Origin::Surface(surface) => {
                self.signal
                    .update_group_description(&surface.guild.id, &text)
                    .await
            }
            Origin::Scheduled(refresh) => {
                self.signal
                    .edit(&refresh.target.channel, refresh.target.timestamp, &text)
                    .await
            }
        };

        delivered.map_err(|e| DeliveryError::Transport(e.to_string()))?;
        debug!(chars = text.chars().count(), "Result delivered");
        Ok(())
    }
}

/// Map an inbound message onto a live trigger context. Group messages use
/// the group as both channel and guild; direct messages use the sender as
/// the channel.
pub fn context_from_message(message: &BotMessage, responder: Arc<dyn Responder>) -> ExecutionContext {
    let guild = message.group_id.as_ref().map(|id| GuildInfo {
        id: id.clone(),
        name: message.group_name.clone(),
    });
    let channel = ChannelInfo {
        id: message.reply_target().to_string(),
        kind: if guild.is_some() {
            ChannelKind::Group
        } else {
            ChannelKind::Direct
        },
    };

    ExecutionContext::live(
        LiveTrigger {
            principal: Principal {
                id: message.source.clone(),
                display_name: message.source_name.clone(),
            },
            text: message.text.clone(),
            channel,
            guild,
            timestamp: message.timestamp,
        },
        responder,
    )
}

/// Plain-text rendering of a result. `None` when there is nothing to send.
pub fn render(result: &InvocationResult) -> Option<String> {
    match result {
        InvocationResult::Success { text, rich } => {
            let mut parts = Vec::new();
            if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
                parts.push(text.to_string());
            }
            if let Some(rich) = rich.as_ref().and_then(render_rich) {
                parts.push(rich);
            }
            (!parts.is_empty()).then(|| parts.join("\n\n"))
        }
        InvocationResult::Error { title, description } => {
            Some(format!("⚠️ {}: {}", title, description))
        }
    }
}

fn render_rich(payload: &RichPayload) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(title) = &payload.title {
        lines.push(format!("**{}**", title));
    }
    if let Some(description) = &payload.description {
        lines.push(description.clone());
    }
    for field in &payload.fields {
        lines.push(format!("{}: {}", field.name, field.value));
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use command_engine::{MessageRef, RenderedSurface, Scope, ScheduledRefresh};
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOT: &str = "+15555555555";

    fn message(group: Option<&str>) -> BotMessage {
        BotMessage {
            source: "+14155551234".into(),
            source_name: Some("Ada".into()),
            text: "!hello".into(),
            timestamp: 42,
            is_group: group.is_some(),
            group_id: group.map(Into::into),
            group_name: None,
            receiving_account: BOT.into(),
        }
    }

    fn responder(server: &MockServer) -> Arc<SignalResponder> {
        Arc::new(SignalResponder::new(SignalClient::new(server.uri(), BOT).unwrap()))
    }

    #[test]
    fn test_render_text_and_rich() {
        let rich = RichPayload::new()
            .title("Help")
            .description("Commands")
            .field("!echo <text...>", "Repeats text");
        let result = InvocationResult::Success {
            text: Some("intro".into()),
            rich: Some(rich),
        };
        assert_eq!(
            render(&result).unwrap(),
            "intro\n\n**Help**\nCommands\n!echo <text...>: Repeats text"
        );
    }

    #[test]
    fn test_render_error_and_empty() {
        let error = InvocationResult::error_titled("Syntax Error", "Usage: `!echo <text...>`");
        assert_eq!(render(&error).unwrap(), "⚠️ Syntax Error: Usage: `!echo <text...>`");
        assert_eq!(render(&InvocationResult::empty()), None);
        assert_eq!(render(&InvocationResult::text("")), None);
    }

    #[test]
    fn test_context_from_group_message() {
        let ctx = context_from_message(&message(Some("group-abc")), Arc::new(NullResponder));
        assert_eq!(ctx.scope(), Scope::GroupMessage);
        assert_eq!(ctx.channel().unwrap().id, "group-abc");
        assert_eq!(ctx.guild().unwrap().id, "group-abc");
        assert_eq!(ctx.principal().unwrap().display_name.as_deref(), Some("Ada"));
        assert_eq!(ctx.raw_text(), Some("!hello"));
    }

    #[test]
    fn test_context_from_direct_message() {
        let ctx = context_from_message(&message(None), Arc::new(NullResponder));
        assert_eq!(ctx.scope(), Scope::DirectMessage);
        assert_eq!(ctx.channel().unwrap().id, "+14155551234");
        assert!(ctx.guild().is_none());
        assert_eq!(ctx.storage_key(), Some("+14155551234"));
    }

    #[tokio::test]
    async fn test_live_reply_goes_to_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "hi",
                "number": BOT,
                "recipients": ["group-abc"]
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = context_from_message(&message(Some("group-abc")), responder(&server));
        ctx.say("hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_surface_updates_description() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/v1/groups/%2B15555555555/group-abc"))
            .and(body_json(serde_json::json!({ "description": "3 days until launch" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = ExecutionContext::surface(
            RenderedSurface {
                channel: ChannelInfo {
                    id: "group-abc".into(),
                    kind: ChannelKind::Group,
                },
                guild: GuildInfo {
                    id: "group-abc".into(),
                    name: None,
                },
                cadence: Duration::from_secs(60),
            },
            responder(&server),
        );
        ctx.say("3 days until launch").await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduled_edits_target_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "tick",
                "number": BOT,
                "recipients": ["group-abc"],
                "edit_timestamp": 1000
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = ExecutionContext::scheduled(
            ScheduledRefresh {
                channel: ChannelInfo {
                    id: "group-abc".into(),
                    kind: ChannelKind::Group,
                },
                guild: None,
                target: MessageRef {
                    channel: "group-abc".into(),
                    timestamp: 1000,
                },
                command: "echo tick".into(),
                interval: Duration::from_secs(60),
            },
            responder(&server),
        );
        ctx.say("tick").await.unwrap();
    }

    #[tokio::test]
    async fn test_transport_failure_is_delivery_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let ctx = context_from_message(&message(None), responder(&server));
        let err = ctx.say("hi").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
    }

    struct NullResponder;

    #[async_trait]
    impl Responder for NullResponder {
        async fn deliver(&self, _: &Origin, _: &InvocationResult) -> Result<(), DeliveryError> {
            Ok(())
        }
    }
}
