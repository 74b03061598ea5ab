//! Signal CLI REST API client.
//!
//! Covers what the command bot needs: polling for messages, sending,
//! editing earlier messages and updating group descriptions.

mod client;
mod error;
mod receiver;
mod types;

pub use client::SignalClient;
pub use error::SignalError;
pub use receiver::MessageReceiver;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_stream::StreamExt;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOT: &str = "+15555555555";

    fn create_test_client(mock_server: &MockServer) -> SignalClient {
        SignalClient::new(mock_server.uri(), BOT).unwrap()
    }

    fn incoming(text: Option<&str>, group: Option<&str>) -> IncomingMessage {
        IncomingMessage {
            envelope: Envelope {
                source: "+14155551234".into(),
                source_number: Some("+14155551234".into()),
                source_name: Some("Test User".into()),
                timestamp: 1677652288000,
                data_message: Some(DataMessage {
                    message: text.map(Into::into),
                    timestamp: 1677652288000,
                    group_info: group.map(|id| GroupInfo {
                        group_id: id.into(),
                        group_name: Some("Test Group".into()),
                    }),
                }),
            },
            account: BOT.into(),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        assert!(create_test_client(&mock_server).health_check().await);

        let down = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&down)
            .await;

        assert!(!create_test_client(&down).health_check().await);
    }

    #[tokio::test]
    async fn test_receive_messages() {
        let mock_server = MockServer::start().await;

        let messages = serde_json::json!([
            {
                "envelope": {
                    "source": "+14155551234",
                    "sourceNumber": "+14155551234",
                    "sourceName": "Test User",
                    "timestamp": 1677652288000i64,
                    "dataMessage": {
                        "message": "!hello",
                        "timestamp": 1677652288000i64,
                        "groupInfo": { "groupId": "group-abc" }
                    }
                },
                "account": BOT
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/v1/receive/%2B15555555555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&messages))
            .mount(&mock_server)
            .await;

        let msgs = create_test_client(&mock_server).receive().await.unwrap();
        assert_eq!(msgs.len(), 1);
        let msg = BotMessage::from_incoming(&msgs[0]).unwrap();
        assert_eq!(msg.group_id.as_deref(), Some("group-abc"));
        assert_eq!(msg.group_name, None);
    }

    #[tokio::test]
    async fn test_send_returns_timestamp() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "Hello!",
                "number": BOT,
                "recipients": ["+14155551234"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "timestamp": "1677652288000"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let sent = create_test_client(&mock_server)
            .send("+14155551234", "Hello!")
            .await
            .unwrap();
        assert_eq!(sent, Some(1677652288000));
    }

    #[tokio::test]
    async fn test_send_without_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let sent = create_test_client(&mock_server)
            .send("+14155551234", "Hello!")
            .await
            .unwrap();
        assert_eq!(sent, None);
    }

    #[tokio::test]
    async fn test_send_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .respond_with(ResponseTemplate::new(400).set_body_string("Invalid recipient"))
            .mount(&mock_server)
            .await;

        let result = create_test_client(&mock_server)
            .send("+14155551234", "Hello!")
            .await;
        assert!(matches!(result, Err(SignalError::SendFailed(msg)) if msg == "Invalid recipient"));
    }

    #[tokio::test]
    async fn test_edit_sends_edit_timestamp() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v2/send"))
            .and(body_json(serde_json::json!({
                "message": "3 days left",
                "number": BOT,
                "recipients": ["group-abc"],
                "edit_timestamp": 1677652288000i64
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "timestamp": 1677652299000i64
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        create_test_client(&mock_server)
            .edit("group-abc", 1677652288000, "3 days left")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_group_description() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/groups/%2B15555555555/group-abc"))
            .and(body_json(serde_json::json!({ "description": "Next meetup: Friday" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&mock_server)
            .await;

        create_test_client(&mock_server)
            .update_group_description("group-abc", "Next meetup: Friday")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_group_description_failure() {
        let mock_server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/v1/groups/%2B15555555555/group-abc"))
            .respond_with(ResponseTemplate::new(403).set_body_string("not an admin"))
            .mount(&mock_server)
            .await;

        let result = create_test_client(&mock_server)
            .update_group_description("group-abc", "x")
            .await;
        assert!(matches!(result, Err(SignalError::GroupUpdateFailed(_))));
    }

    #[tokio::test]
    async fn test_receiver_skips_envelopes_without_text() {
        let mock_server = MockServer::start().await;

        let messages = serde_json::json!([
            {
                "envelope": {
                    "source": "+14155551234",
                    "timestamp": 1i64,
                    "dataMessage": null
                },
                "account": BOT
            },
            {
                "envelope": {
                    "source": "+14155551234",
                    "timestamp": 2i64,
                    "dataMessage": { "message": "!coin", "timestamp": 2i64 }
                },
                "account": BOT
            }
        ]);

        Mock::given(method("GET"))
            .and(path("/v1/receive/%2B15555555555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&messages))
            .mount(&mock_server)
            .await;

        let receiver = MessageReceiver::new(
            create_test_client(&mock_server),
            Duration::from_millis(10),
        );
        let stream = receiver.stream();
        tokio::pin!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(first.text, "!coin");
        assert_eq!(first.timestamp, 2);
    }

    #[test]
    fn test_bot_message_from_direct() {
        let msg = BotMessage::from_incoming(&incoming(Some("Hello bot!"), None)).unwrap();
        assert_eq!(msg.source, "+14155551234");
        assert_eq!(msg.source_name.as_deref(), Some("Test User"));
        assert_eq!(msg.receiving_account, BOT);
        assert!(!msg.is_group);
        assert_eq!(msg.reply_target(), "+14155551234");
    }

    #[test]
    fn test_bot_message_from_group() {
        let msg = BotMessage::from_incoming(&incoming(Some("Hello group!"), Some("group-abc"))).unwrap();
        assert!(msg.is_group);
        assert_eq!(msg.reply_target(), "group-abc");
        assert_eq!(msg.group_name.as_deref(), Some("Test Group"));
    }

    #[test]
    fn test_bot_message_without_text() {
        assert!(BotMessage::from_incoming(&incoming(None, None)).is_none());
    }

    #[test]
    fn test_send_response_timestamp_forms() {
        let as_string: SendMessageResponse =
            serde_json::from_value(serde_json::json!({ "timestamp": "42" })).unwrap();
        let as_number: SendMessageResponse =
            serde_json::from_value(serde_json::json!({ "timestamp": 42 })).unwrap();
        let missing: SendMessageResponse = serde_json::from_value(serde_json::json!({})).unwrap();

        assert_eq!(as_string.sent_at(), Some(42));
        assert_eq!(as_number.sent_at(), Some(42));
        assert_eq!(missing.sent_at(), None);
    }
}
