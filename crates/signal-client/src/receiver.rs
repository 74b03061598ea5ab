//! Polling message receiver.

use crate::client::SignalClient;
use crate::types::*;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Polls the REST API and yields text messages addressed to the bot.
pub struct MessageReceiver {
    client: SignalClient,
    poll_interval: Duration,
}

impl MessageReceiver {
    pub fn new(client: SignalClient, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Endless stream of received messages. Envelopes without text
    /// (receipts, typing indicators) are skipped.
    pub fn stream(self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            loop {
                match self.client.receive().await {
                    Ok(messages) => {
                        for msg in messages.iter().filter_map(BotMessage::from_incoming) {
                            debug!(
                                source = %msg.source,
                                group = msg.is_group,
                                chars = msg.text.chars().count(),
                                "Message received"
                            );
                            yield msg;
                        }
                    }
                    Err(e) => {
                        error!("Receive error: {}", e);
                        sleep(ERROR_BACKOFF).await;
                        continue;
                    }
                }

                sleep(self.poll_interval).await;
            }
        }
    }
}
