//! Signal command bot - main entry point.

use anyhow::Context;
use command_bot::config::{Config, LogFormat};
use command_bot::error::AppResult;
use command_bot::Bot;
use signal_client::{MessageReceiver, SignalClient};
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.bot.log_level, config.bot.log_format);

    info!("Starting Signal command bot...");

    let signal = SignalClient::new(&config.signal.service_url, &config.signal.phone_number)
        .context("Failed to create Signal client")?;

    if !signal.health_check().await {
        error!("Signal API not reachable at {}", config.signal.service_url);
        return Err(anyhow::anyhow!("Signal API not reachable").into());
    }
    info!("Signal API healthy");

    let bot = Bot::build(&config, signal.clone()).await?;
    let timers = bot.start_schedules().await?;
    info!(
        "Default prefix `{}`, {} timers restored from {}",
        config.bot.prefix,
        timers,
        config.storage.data_dir.display()
    );
    info!("Listening for messages...");

    let receiver = MessageReceiver::new(signal, config.signal.poll_interval);
    let mut stream = Box::pin(receiver.stream());

    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                let bot = bot.clone();
                tokio::spawn(async move {
                    if let Some(result) = bot.handle(&message).await {
                        debug!(source = %message.source, success = result.is_success(), "Command handled");
                    }
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    bot.scheduler().shutdown().await;
    Ok(())
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
