use {
    regnum_common::types::{ChannelId, GuildId, MessageId, UserId},
    serde::{Deserialize, Serialize},
};

/// The user who sent a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    /// Account is a bot user.
    #[serde(default)]
    pub bot: bool,
    /// Message was posted through a webhook.
    #[serde(default)]
    pub webhook: bool,
    /// Message was generated by the platform itself (join notices, pins, ...).
    #[serde(default)]
    pub system: bool,
}

impl Author {
    /// A regular human user.
    #[must_use]
    pub fn user(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            bot: false,
            webhook: false,
            system: false,
        }
    }

    /// Whether the author is something other than a human user.
    #[must_use]
    pub fn is_automated(&self) -> bool {
        self.bot || self.webhook || self.system
    }
}

/// Whether an inbound message was just created or is an edit of an older one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Created,
    Edited,
}

/// A message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub id: MessageId,
    pub content: String,
    pub author: Author,
    /// `None` for direct messages.
    pub guild_id: Option<GuildId>,
    pub channel_id: ChannelId,
    #[serde(default)]
    pub kind: MessageKind,
}

impl InboundMessage {
    #[must_use]
    pub fn new(
        id: MessageId,
        content: impl Into<String>,
        author: Author,
        guild_id: Option<GuildId>,
        channel_id: ChannelId,
    ) -> Self {
        Self {
            id,
            content: content.into(),
            author,
            guild_id,
            channel_id,
            kind: MessageKind::Created,
        }
    }

    /// Mark this message as an edit.
    #[must_use]
    pub fn edited(mut self) -> Self {
        self.kind = MessageKind::Edited;
        self
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automated_authors() {
        let mut author = Author::user(UserId(1), "alice");
        assert!(!author.is_automated());
        author.webhook = true;
        assert!(author.is_automated());
        author.webhook = false;
        author.system = true;
        assert!(author.is_automated());
    }

    #[test]
    fn deserialize_defaults_kind_and_flags() {
        let json = r#"{
            "id": 10,
            "content": "!ping",
            "author": {"id": 1, "name": "alice"},
            "guild_id": 2,
            "channel_id": 3
        }"#;
        let msg: InboundMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.kind, MessageKind::Created);
        assert!(!msg.author.bot);
        assert_eq!(msg.guild_id, Some(GuildId(2)));
        assert_eq!(msg.edited().kind, MessageKind::Edited);
    }
}
