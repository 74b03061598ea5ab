//! Capability lookup backed by configured principal lists.

use async_trait::async_trait;
use command_engine::{Capability, CapabilityService, ChannelKind, ExecutionContext, Principal};
use std::collections::HashSet;

/// Owners hold every capability. Admins may manage groups and messages.
/// In a direct conversation the sender manages that conversation.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredCapabilities {
    owners: HashSet<String>,
    admins: HashSet<String>,
}

impl ConfiguredCapabilities {
    pub fn new<O, A>(owners: O, admins: A) -> Self
    where
        O: IntoIterator<Item = String>,
        A: IntoIterator<Item = String>,
    {
        Self {
            owners: owners.into_iter().collect(),
            admins: admins.into_iter().collect(),
        }
    }

    pub fn is_owner(&self, principal: &str) -> bool {
        self.owners.contains(principal)
    }
}

#[async_trait]
impl CapabilityService for ConfiguredCapabilities {
    async fn holds(
        &self,
        principal: &Principal,
        capability: Capability,
        ctx: &ExecutionContext,
    ) -> bool {
        if self.is_owner(&principal.id) {
            return true;
        }

        match capability {
            Capability::Owner => false,
            Capability::ManageGroup | Capability::ManageMessages => {
                self.admins.contains(&principal.id)
                    || ctx.channel().is_some_and(|c| c.kind == ChannelKind::Direct)
            }
        }
    }
}
