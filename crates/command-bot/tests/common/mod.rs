//! Common test utilities for integration tests.

#![allow(dead_code)]

use command_bot::config::Config;
use command_bot::Bot;
use signal_client::{BotMessage, SignalClient};
use std::path::Path;
use std::time::Duration;
use wiremock::{MockServer, Request};

pub const BOT_NUMBER: &str = "+15550000000";
pub const OWNER: &str = "+1000";
pub const ADMIN: &str = "+2000";
pub const MEMBER: &str = "+3000";
pub const GROUP: &str = "group-abc";

/// Configuration pointing at a mock Signal server and a data directory.
pub fn test_config(signal: &MockServer, data_dir: &Path) -> Config {
    serde_json::from_value(serde_json::json!({
        "signal": { "service_url": signal.uri(), "phone_number": BOT_NUMBER },
        "bot": { "owners": OWNER, "admins": ADMIN },
        "storage": { "data_dir": data_dir },
        "scheduler": { "surface_cadence": "1h" }
    }))
    .unwrap()
}

/// Build a bot against a mock Signal server, with its settings files in
/// `data_dir`.
pub async fn test_bot(signal: &MockServer, data_dir: &Path) -> Bot {
    let config = test_config(signal, data_dir);
    let client = SignalClient::new(signal.uri(), BOT_NUMBER).unwrap();
    Bot::build(&config, client).await.unwrap()
}

pub fn group_message(source: &str, text: &str) -> BotMessage {
    BotMessage {
        source: source.to_string(),
        source_name: Some("Ada".to_string()),
        text: text.to_string(),
        timestamp: 1_700_000_000_000,
        is_group: true,
        group_id: Some(GROUP.to_string()),
        group_name: Some("Meetup".to_string()),
        receiving_account: BOT_NUMBER.to_string(),
    }
}

pub fn direct_message(source: &str, text: &str) -> BotMessage {
    BotMessage {
        source: source.to_string(),
        source_name: None,
        text: text.to_string(),
        timestamp: 1_700_000_000_000,
        is_group: false,
        group_id: None,
        group_name: None,
        receiving_account: BOT_NUMBER.to_string(),
    }
}

/// Wait until the mock server has seen a request matching `matches`.
pub async fn wait_for_request<F>(server: &MockServer, matches: F) -> Request
where
    F: Fn(&Request) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let requests = server.received_requests().await.unwrap_or_default();
            if let Some(found) = requests.into_iter().find(|r| matches(r)) {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("timed out waiting for request")
}

pub fn body(request: &Request) -> serde_json::Value {
    serde_json::from_slice(&request.body).unwrap()
}
