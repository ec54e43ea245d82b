use std::collections::HashMap;

use regnum_common::types::{ChannelId, GuildId, UserId};

/// Per-guild settings and owner lookups supplied by the host application.
///
/// Called synchronously on the dispatching thread, so implementations
/// should answer from memory (a cache or a preloaded map), never by
/// performing I/O.
pub trait InformationProvider: Send + Sync {
    /// The custom prefix for `guild`, or `None` to use the default prefix.
    fn prefix(&self, guild: GuildId) -> Option<String>;

    /// Whether `user` is a bot owner in addition to the configured owners.
    fn is_owner(&self, _user: UserId) -> bool {
        false
    }
}

/// Answers permission questions about a user from the platform's cache.
pub trait PermissionContext: Send + Sync {
    /// Whether `user` holds the named platform permission in `channel`.
    fn has_permission(&self, user: UserId, channel: ChannelId, permission: &str) -> bool;

    /// Whether `user` may manage `guild` (server owner or manage-server right).
    fn can_manage_guild(&self, user: UserId, guild: GuildId) -> bool;
}

/// Information provider backed by a fixed map of guild prefixes.
#[derive(Debug, Clone, Default)]
pub struct StaticInformationProvider {
    prefixes: HashMap<GuildId, String>,
    owners: Vec<UserId>,
}

impl StaticInformationProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_prefix(mut self, guild: GuildId, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(guild, prefix.into());
        self
    }

    #[must_use]
    pub fn with_owner(mut self, user: UserId) -> Self {
        self.owners.push(user);
        self
    }
}

impl InformationProvider for StaticInformationProvider {
    fn prefix(&self, guild: GuildId) -> Option<String> {
        self.prefixes.get(&guild).cloned()
    }

    fn is_owner(&self, user: UserId) -> bool {
        self.owners.contains(&user)
    }
}

/// Permission context that grants nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPermissions;

impl PermissionContext for NoPermissions {
    fn has_permission(&self, _user: UserId, _channel: ChannelId, _permission: &str) -> bool {
        false
    }

    fn can_manage_guild(&self, _user: UserId, _guild: GuildId) -> bool {
        false
    }
}

/// Permission context that grants everything. Useful for local consoles.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPermissions;

impl PermissionContext for AllPermissions {
    fn has_permission(&self, _user: UserId, _channel: ChannelId, _permission: &str) -> bool {
        true
    }

    fn can_manage_guild(&self, _user: UserId, _guild: GuildId) -> bool {
        true
    }
}
