/// Config schema for the command client.
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegnumConfig {
    pub commands: CommandsConfig,
}

/// Command client settings shared read-only by every dispatch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandsConfig {
    /// Prefix that marks a message as a command invocation. Defaults to "!".
    pub default_prefix: String,
    /// Accept the default prefix even in guilds that configured their own.
    pub always_default_prefix: bool,
    /// Accept the bot's mention (`<@id>`) as a prefix.
    pub accept_mention_prefix: bool,
    /// User ids of the bot owners.
    pub owners: Vec<u64>,
    /// Owners pass every permission check regardless of the command's policy.
    pub owner_bypass: bool,
    /// Show a typing indicator in the channel before a command runs.
    pub send_typing: bool,
    /// Dispatch edited messages as well as newly created ones.
    pub dispatch_edits: bool,
    /// Upper bound on command bodies executing at the same time.
    pub max_concurrent_commands: usize,
    /// Buffered lifecycle events per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Private message sent to a user who lacks permission for a command.
    /// `{command}` and `{user}` are replaced with the command's display name
    /// and the user's name.
    pub permission_error_message: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            default_prefix: "!".into(),
            always_default_prefix: false,
            accept_mention_prefix: true,
            owners: Vec::new(),
            owner_bypass: true,
            send_typing: true,
            dispatch_edits: false,
            max_concurrent_commands: 64,
            event_capacity: 256,
            permission_error_message: "Sorry {user}, you are not allowed to run `{command}`."
                .into(),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = CommandsConfig::default();
        assert_eq!(cfg.default_prefix, "!");
        assert!(!cfg.always_default_prefix);
        assert!(cfg.accept_mention_prefix);
        assert!(cfg.owner_bypass);
        assert!(cfg.send_typing);
        assert!(!cfg.dispatch_edits);
        assert_eq!(cfg.max_concurrent_commands, 64);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let raw = r#"
            [commands]
            default_prefix = "?"
            owners = [1, 2]
        "#;
        let cfg: RegnumConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.commands.default_prefix, "?");
        assert_eq!(cfg.commands.owners, vec![1, 2]);
        assert!(cfg.commands.accept_mention_prefix);
        assert_eq!(cfg.commands.event_capacity, 256);
    }
}
