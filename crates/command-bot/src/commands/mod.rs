//! Bot commands.
//!
//! Each module contributes one or more [`CommandSpec`]s; [`build_registry`]
//! collects them into the registry the dispatcher serves.

mod countdown;
mod description;
mod dynamic;
mod general;
mod help;
mod reload;
mod remind;
mod setprefix;

pub use countdown::{CountdownHandler, CountdownStatusHandler};
pub use description::DescriptionHandler;
pub use dynamic::DynamicMessageHandler;
pub use help::HelpHandler;
pub use reload::ReloadHandler;
pub use remind::RemindHandler;
pub use setprefix::SetPrefixHandler;

use crate::handle::DispatcherHandle;
use crate::scheduler::RefreshScheduler;
use crate::storage::Stores;
use command_engine::{CommandSpec, Registry, RegistryError};
use signal_client::SignalClient;
use std::sync::Arc;

/// Shared services handed to command handlers.
#[derive(Clone)]
pub struct CommandDeps {
    pub signal: SignalClient,
    pub stores: Stores,
    pub scheduler: Arc<RefreshScheduler>,
    pub dispatcher: DispatcherHandle,
}

/// Every command the bot serves.
pub fn specs(deps: &CommandDeps) -> Vec<CommandSpec> {
    let mut specs = general::specs();
    specs.extend([
        help::spec(deps.dispatcher.clone()),
        setprefix::spec(deps.stores.settings.clone()),
        countdown::spec(deps.stores.countdowns.clone()),
        remind::spec(),
        dynamic::spec(deps),
        description::spec(deps),
        reload::spec(deps.clone()),
    ]);
    specs
}

pub fn build_registry(deps: &CommandDeps) -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    for spec in specs(deps) {
        registry.register(spec)?;
    }
    Ok(registry)
}
