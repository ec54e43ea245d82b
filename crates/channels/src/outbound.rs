use {
    async_trait::async_trait,
    regnum_common::types::{ChannelId, UserId},
};

use crate::Result;

/// Send messages to the platform.
#[async_trait]
pub trait ChannelOutbound: Send + Sync {
    /// Post `text` into a channel.
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<()>;

    /// Send `text` to a user privately.
    async fn send_direct(&self, user: UserId, text: &str) -> Result<()>;

    /// Send a "typing" indicator. No-op by default.
    async fn send_typing(&self, _channel: ChannelId) -> Result<()> {
        Ok(())
    }
}
