//! Console transport: stdin lines in, stdout replies out.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    regnum_channels::{Author, ChannelOutbound, InboundMessage},
    regnum_commands::{CommandClient, CommandEvent, CommandListener},
    regnum_common::types::{ChannelId, GuildId, MessageId, UserId},
    tokio::{
        io::{AsyncBufReadExt, BufReader},
        sync::Notify,
    },
    tracing::{debug, info, warn},
};

/// The single guild and channel every console line is posted in.
pub const CONSOLE_GUILD: GuildId = GuildId(1);
pub const CONSOLE_CHANNEL: ChannelId = ChannelId(1);

/// How long to wait for running commands after stdin closes.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Prints replies to stdout.
#[derive(Debug, Default)]
pub struct ConsoleOutbound;

#[async_trait]
impl ChannelOutbound for ConsoleOutbound {
    async fn send_text(&self, _channel: ChannelId, text: &str) -> regnum_channels::Result<()> {
        println!("{text}");
        Ok(())
    }

    async fn send_direct(&self, user: UserId, text: &str) -> regnum_channels::Result<()> {
        println!("[private to {user}] {text}");
        Ok(())
    }

    async fn send_typing(&self, channel: ChannelId) -> regnum_channels::Result<()> {
        debug!(channel = %channel, "typing");
        Ok(())
    }
}

/// Reports failed commands on stderr so the console user sees them.
#[derive(Debug, Default)]
pub struct ConsoleListener;

#[async_trait]
impl CommandListener for ConsoleListener {
    async fn on_command_failure(&self, event: &CommandEvent) {
        if let CommandEvent::CommandFailure { command, error, .. } = event {
            eprintln!("command `{}` failed: {error:#}", command.name());
        }
    }
}

/// Dispatch stdin lines as `author` until EOF or `shutdown` fires, then
/// wait for running commands to finish.
pub async fn run(
    client: CommandClient,
    author: Author,
    shutdown: Arc<Notify>,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id = 1_u64;

    info!(user = %author.id, prefix = %client.config().default_prefix, "console ready");

    loop {
        tokio::select! {
            () = shutdown.notified() => {
                info!("shutdown requested");
                break;
            },
            line = lines.next_line() => {
                let Some(line) = line? else {
                    debug!("stdin closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let message = InboundMessage::new(
                    MessageId(next_id),
                    line,
                    author.clone(),
                    Some(CONSOLE_GUILD),
                    CONSOLE_CHANNEL,
                );
                next_id += 1;
                let outcome = client.dispatch(message);
                debug!(?outcome, "line dispatched");
            },
        }
    }

    drain(&client).await;
    Ok(())
}

async fn drain(client: &CommandClient) {
    let waited = tokio::time::timeout(DRAIN_TIMEOUT, async {
        while client.pending_commands() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
    if waited.is_err() {
        warn!(
            pending = client.pending_commands(),
            "commands still running at exit"
        );
    }
}
