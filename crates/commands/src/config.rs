//! Runtime configuration of a [`CommandClient`](crate::CommandClient).

use std::{collections::HashSet, fmt, sync::Arc};

use {regnum_common::types::UserId, regnum_config::CommandsConfig};

use crate::context::InvocationContext;

/// Builds the private message sent to a user who was denied a command.
pub type PermissionMessageFactory = Arc<dyn Fn(&InvocationContext) -> String + Send + Sync>;

/// Settings every dispatch reads. Immutable once the client is built.
#[derive(Clone)]
pub struct Configuration {
    pub default_prefix: String,
    pub always_default_prefix: bool,
    pub accept_mention_prefix: bool,
    pub owners: HashSet<UserId>,
    pub owner_bypass: bool,
    pub send_typing: bool,
    pub dispatch_edits: bool,
    pub max_concurrent_commands: usize,
    pub event_capacity: usize,
    permission_message: PermissionMessageFactory,
}

fn template_factory(template: String) -> PermissionMessageFactory {
    Arc::new(move |ctx: &InvocationContext| {
        template
            .replace("{command}", ctx.command().name())
            .replace("{user}", &ctx.author().name)
    })
}

impl Configuration {
    /// Convert the file-level settings.
    #[must_use]
    pub fn from_config(config: &CommandsConfig) -> Self {
        Self {
            default_prefix: config.default_prefix.clone(),
            always_default_prefix: config.always_default_prefix,
            accept_mention_prefix: config.accept_mention_prefix,
            owners: config.owners.iter().copied().map(UserId).collect(),
            owner_bypass: config.owner_bypass,
            send_typing: config.send_typing,
            dispatch_edits: config.dispatch_edits,
            max_concurrent_commands: config.max_concurrent_commands.max(1),
            event_capacity: config.event_capacity.max(1),
            permission_message: template_factory(config.permission_error_message.clone()),
        }
    }

    /// Replace the permission error text with a computed one.
    #[must_use]
    pub fn with_permission_error_message(mut self, factory: PermissionMessageFactory) -> Self {
        self.permission_message = factory;
        self
    }

    /// The message to send `ctx`'s author when they are denied.
    #[must_use]
    pub fn permission_error_message(&self, ctx: &InvocationContext) -> String {
        (self.permission_message)(ctx)
    }

    /// Whether `user` is one of the configured owners.
    #[must_use]
    pub fn is_owner(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::from_config(&CommandsConfig::default())
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("default_prefix", &self.default_prefix)
            .field("always_default_prefix", &self.always_default_prefix)
            .field("accept_mention_prefix", &self.accept_mention_prefix)
            .field("owners", &self.owners)
            .field("owner_bypass", &self.owner_bypass)
            .field("send_typing", &self.send_typing)
            .field("dispatch_edits", &self.dispatch_edits)
            .field("max_concurrent_commands", &self.max_concurrent_commands)
            .field("event_capacity", &self.event_capacity)
            .finish_non_exhaustive()
    }
}
