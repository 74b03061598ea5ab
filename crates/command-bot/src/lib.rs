//! Signal command bot.
//!
//! Wires the command engine to Signal: contexts built from inbound
//! messages, results delivered back through the REST API, capability and
//! prefix lookups from configuration and settings, plus the timers behind
//! dynamic messages and group descriptions.

pub mod capabilities;
pub mod commands;
pub mod config;
pub mod error;
pub mod handle;
pub mod prefix;
pub mod scheduler;
pub mod storage;
pub mod time;
pub mod transport;

use crate::capabilities::ConfiguredCapabilities;
use crate::commands::CommandDeps;
use crate::config::Config;
use crate::error::AppResult;
use crate::handle::DispatcherHandle;
use crate::prefix::SettingsPrefixes;
use crate::scheduler::RefreshScheduler;
use crate::storage::Stores;
use crate::time::{AbsoluteTime, RelativeTime};
use crate::transport::{context_from_message, SignalResponder};
use command_engine::{
    Binder, Dispatcher, ExecutionContext, InvocationResult, ParamKind, Responder,
};
use signal_client::{BotMessage, SignalClient};
use std::sync::Arc;
use tracing::info;

/// Everything needed to answer messages. Cheap to clone.
#[derive(Clone)]
pub struct Bot {
    dispatcher: Arc<Dispatcher>,
    responder: Arc<dyn Responder>,
    scheduler: Arc<RefreshScheduler>,
    stores: Stores,
}

impl Bot {
    /// Load the settings files and build the bot.
    pub async fn build(config: &Config, signal: SignalClient) -> AppResult<Self> {
        let stores = Stores::load(&config.storage.data_dir).await?;
        Self::with_stores(config, signal, stores)
    }

    pub fn with_stores(config: &Config, signal: SignalClient, stores: Stores) -> AppResult<Self> {
        let offset = config.bot.offset()?;
        let responder: Arc<dyn Responder> = Arc::new(SignalResponder::new(signal.clone()));
        let handle = DispatcherHandle::new();
        let scheduler = Arc::new(RefreshScheduler::new(
            handle.clone(),
            responder.clone(),
            stores.schedules.clone(),
            config.scheduler.surface_cadence,
        ));

        let deps = CommandDeps {
            signal,
            stores: stores.clone(),
            scheduler: scheduler.clone(),
            dispatcher: handle.clone(),
        };
        let registry = commands::build_registry(&deps)?;
        info!("Registered {} commands", registry.len());

        let binder = Binder::new()
            .with_coercer(ParamKind::DateTime, Arc::new(AbsoluteTime::new(offset)))
            .with_coercer(ParamKind::Duration, Arc::new(RelativeTime));
        let capabilities = Arc::new(ConfiguredCapabilities::new(
            config.bot.owners.clone(),
            config.bot.admins.clone(),
        ));
        let prefixes = Arc::new(SettingsPrefixes::new(
            stores.settings.clone(),
            config.bot.prefix.clone(),
        ));

        let dispatcher = Arc::new(
            Dispatcher::new(Arc::new(registry), capabilities)
                .with_binder(binder)
                .with_prefixes(prefixes)
                .with_diagnostics(config.bot.diagnostics),
        );
        handle.bind(dispatcher.clone());

        Ok(Self {
            dispatcher,
            responder,
            scheduler,
            stores,
        })
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn scheduler(&self) -> &Arc<RefreshScheduler> {
        &self.scheduler
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    pub fn context_for(&self, message: &BotMessage) -> ExecutionContext {
        context_from_message(message, self.responder.clone())
    }

    /// Handle one inbound message. `None` when it was not a command.
    pub async fn handle(&self, message: &BotMessage) -> Option<InvocationResult> {
        let ctx = self.context_for(message);
        self.dispatcher.handle_message(&ctx).await
    }

    /// Start the timers saved in the schedules file.
    pub async fn start_schedules(&self) -> AppResult<usize> {
        Ok(self.scheduler.restore().await?)
    }
}
