use std::{
    fmt,
    sync::{Arc, Weak},
};

use {
    regnum_channels::{Author, InboundMessage},
    regnum_common::types::{ChannelId, GuildId},
};

use crate::{
    Result,
    arguments::Arguments,
    client::{ClientInner, CommandClient},
    command::Command,
    error::Context,
    format::format_command,
};

/// Everything about one invocation: the resolved command, its arguments,
/// the message that triggered it and a non-owning link to the client.
pub struct InvocationContext {
    command: Arc<Command>,
    args: Arguments,
    message: InboundMessage,
    prefix: String,
    client: Weak<ClientInner>,
}

impl InvocationContext {
    pub(crate) fn new(
        command: Arc<Command>,
        args: Arguments,
        message: InboundMessage,
        prefix: String,
        client: Weak<ClientInner>,
    ) -> Self {
        Self {
            command,
            args,
            message,
            prefix,
            client,
        }
    }

    #[must_use]
    pub fn command(&self) -> &Arc<Command> {
        &self.command
    }

    #[must_use]
    pub fn args(&self) -> &Arguments {
        &self.args
    }

    #[must_use]
    pub fn message(&self) -> &InboundMessage {
        &self.message
    }

    #[must_use]
    pub fn author(&self) -> &Author {
        &self.message.author
    }

    #[must_use]
    pub fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }

    #[must_use]
    pub fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }

    /// The prefix this invocation matched.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The dispatching client, if it is still alive.
    #[must_use]
    pub fn client(&self) -> Option<CommandClient> {
        self.client.upgrade().map(CommandClient::from_inner)
    }

    fn live_client(&self) -> Result<CommandClient> {
        self.client().context("command client has been dropped")
    }

    /// Reply in the channel the command was used in.
    pub async fn respond(&self, text: &str) -> Result<()> {
        let client = self.live_client()?;
        client.outbound().send_text(self.channel_id(), text).await?;
        Ok(())
    }

    /// Reply with the command's help text.
    pub async fn send_usage(&self) -> Result<()> {
        let client = self.live_client()?;
        let prefix = client.effective_prefix(self.guild_id());
        let text = format_command(&prefix, &self.command);
        client.outbound().send_text(self.channel_id(), &text).await?;
        Ok(())
    }

    /// Tell the author privately that they may not run this command.
    pub async fn notify_permission_error(&self) -> Result<()> {
        let client = self.live_client()?;
        let text = client.config().permission_error_message(self);
        client
            .outbound()
            .send_direct(self.author().id, &text)
            .await?;
        Ok(())
    }
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("command", &self.command.name())
            .field("args", &self.args)
            .field("message", &self.message.id)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
