//! Permission policies and the gate that evaluates them.

use std::fmt;

use {
    regnum_channels::PermissionContext,
    regnum_common::types::{ChannelId, GuildId, UserId},
};

use crate::context::InvocationContext;

/// Who may run a command. Fixed when the command is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionPolicy {
    /// Everyone.
    Public,
    /// Bot owners only.
    OwnerExclusive,
    /// Users that can manage the guild the command is used in.
    ServerOwnerExclusive,
    /// Users holding the named platform permission in the channel.
    DiscordPermissionNode(String),
    /// A policy string that names none of the above. Always denied.
    Unrecognized(String),
}

impl PermissionPolicy {
    /// Parse a policy from its configuration form.
    ///
    /// Accepts `public`, `owner`, `server_owner` and `discord:<PERMISSION>`.
    /// Anything else becomes [`PermissionPolicy::Unrecognized`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "public" => Self::Public,
            "owner" | "bot_owner" => Self::OwnerExclusive,
            "server_owner" => Self::ServerOwnerExclusive,
            lower => match lower.strip_prefix("discord:") {
                Some(node) if !node.trim().is_empty() => Self::DiscordPermissionNode(
                    trimmed["discord:".len()..].trim().to_ascii_uppercase(),
                ),
                _ => Self::Unrecognized(trimmed.to_string()),
            },
        }
    }

    /// Short node name used in help output and logs.
    #[must_use]
    pub fn node(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::OwnerExclusive => "botOwner",
            Self::ServerOwnerExclusive => "serverOwner",
            Self::DiscordPermissionNode(name) | Self::Unrecognized(name) => name,
        }
    }
}

impl fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiscordPermissionNode(name) => write!(f, "discord:{name}"),
            Self::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
            other => f.write_str(other.node()),
        }
    }
}

/// Everything a policy can be evaluated against.
pub struct PermissionCheck<'a> {
    pub user: UserId,
    pub guild: Option<GuildId>,
    pub channel: ChannelId,
    pub is_owner: bool,
    pub owner_bypass: bool,
    pub permissions: &'a dyn PermissionContext,
}

/// Evaluate `policy`. The first applicable rule decides:
///
/// 1. `Public` is always allowed.
/// 2. Owners are allowed when owner bypass is on, whatever the policy.
/// 3. `OwnerExclusive` requires an owner.
/// 4. `ServerOwnerExclusive` requires the guild-management capability.
/// 5. `DiscordPermissionNode` requires the named permission in the channel.
/// 6. `Unrecognized` is denied.
#[must_use]
pub fn check(policy: &PermissionPolicy, input: &PermissionCheck<'_>) -> bool {
    if matches!(policy, PermissionPolicy::Public) {
        return true;
    }

    if input.owner_bypass && input.is_owner {
        return true;
    }

    match policy {
        PermissionPolicy::Public => true,
        PermissionPolicy::OwnerExclusive => input.is_owner,
        PermissionPolicy::ServerOwnerExclusive => input
            .guild
            .is_some_and(|guild| input.permissions.can_manage_guild(input.user, guild)),
        PermissionPolicy::DiscordPermissionNode(name) => {
            input
                .permissions
                .has_permission(input.user, input.channel, name)
        },
        PermissionPolicy::Unrecognized(_) => false,
    }
}

/// Decides whether an invocation may run.
pub trait PermissionGate: Send + Sync {
    fn is_allowed(&self, ctx: &InvocationContext) -> bool;
}

/// Evaluates the command's [`PermissionPolicy`] with [`check`], using the
/// dispatching client's owners and permission context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPermissionGate;

impl PermissionGate for DefaultPermissionGate {
    fn is_allowed(&self, ctx: &InvocationContext) -> bool {
        // A context that outlived its client can't be checked.
        let Some(client) = ctx.client() else {
            return false;
        };
        let user = ctx.author().id;
        let input = PermissionCheck {
            user,
            guild: ctx.guild_id(),
            channel: ctx.channel_id(),
            is_owner: client.is_owner(user),
            owner_bypass: client.config().owner_bypass,
            permissions: client.permission_context(),
        };
        check(ctx.command().permission(), &input)
    }
}
