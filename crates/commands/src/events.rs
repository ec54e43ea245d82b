//! Lifecycle events published by the dispatcher.

use std::sync::Arc;

use {
    async_trait::async_trait,
    regnum_channels::Author,
    regnum_common::types::{ChannelId, GuildId},
    tokio::{
        sync::broadcast::{self, error::RecvError},
        task::JoinHandle,
    },
    tracing::{debug, info, warn},
};

use crate::{command::Command, context::InvocationContext};

/// Something that happened to a dispatched command that listeners may care
/// about. Successful runs publish nothing.
#[derive(Debug, Clone)]
pub enum CommandEvent {
    /// The permission gate refused the invocation.
    PermissionViolation {
        command: Arc<Command>,
        principal: Author,
        guild_id: Option<GuildId>,
        channel_id: ChannelId,
    },
    /// The command body returned an error or panicked.
    CommandFailure {
        command: Arc<Command>,
        context: Arc<InvocationContext>,
        error: Arc<anyhow::Error>,
    },
}

impl CommandEvent {
    #[must_use]
    pub fn command(&self) -> &Arc<Command> {
        match self {
            Self::PermissionViolation { command, .. } | Self::CommandFailure { command, .. } => {
                command
            },
        }
    }
}

/// Where the dispatcher publishes [`CommandEvent`]s. Must not block.
pub trait CommandEventSink: Send + Sync {
    fn emit(&self, event: CommandEvent);
}

/// Broadcast channel fanning events out to any number of subscribers.
///
/// A subscriber that falls more than `capacity` events behind skips the
/// oldest ones; publishing never waits on slow listeners.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CommandEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CommandEvent> {
        self.sender.subscribe()
    }

    /// Drive `listener` with every event published from now on. The task
    /// ends once every sender is dropped.
    pub fn spawn_listener<L>(&self, listener: L) -> JoinHandle<()>
    where
        L: CommandListener + 'static,
    {
        let mut rx = self.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => listener.on_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "command listener lagging; events dropped");
                    },
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

impl CommandEventSink for EventBus {
    fn emit(&self, event: CommandEvent) {
        // No subscribers is not an error.
        if self.sender.send(event).is_err() {
            debug!("command event published with no subscribers");
        }
    }
}

/// Receives events from an [`EventBus`]. Override the callbacks you need.
#[async_trait]
pub trait CommandListener: Send + Sync {
    async fn on_event(&self, event: &CommandEvent) {
        match event {
            CommandEvent::PermissionViolation { .. } => self.on_permission_violation(event).await,
            CommandEvent::CommandFailure { .. } => self.on_command_failure(event).await,
        }
    }

    async fn on_permission_violation(&self, _event: &CommandEvent) {}

    async fn on_command_failure(&self, _event: &CommandEvent) {}
}

/// Writes every event to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingListener;

#[async_trait]
impl CommandListener for LoggingListener {
    async fn on_permission_violation(&self, event: &CommandEvent) {
        if let CommandEvent::PermissionViolation {
            command,
            principal,
            guild_id,
            channel_id,
        } = event
        {
            info!(
                command = %command.name(),
                user = %principal.id,
                user_name = %principal.name,
                guild = ?guild_id.map(|g| g.get()),
                channel = %channel_id,
                "permission denied"
            );
        }
    }

    async fn on_command_failure(&self, event: &CommandEvent) {
        if let CommandEvent::CommandFailure {
            command,
            context,
            error,
        } = event
        {
            info!(
                command = %command.name(),
                user = %context.author().id,
                args = %context.args().join(),
                error = %error,
                "command failed"
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        regnum_common::types::UserId,
        std::sync::atomic::{AtomicUsize, Ordering},
    };

    fn violation() -> CommandEvent {
        CommandEvent::PermissionViolation {
            command: Command::builder("ban").build(),
            principal: Author::user(UserId(5), "mallory"),
            guild_id: Some(GuildId(1)),
            channel_id: ChannelId(2),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.emit(violation());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.command().name(), "ban");
    }

    #[test]
    fn emit_without_subscribers_is_silent() {
        let bus = EventBus::new(1);
        bus.emit(violation());
        assert_eq!(bus.sender.receiver_count(), 0);
    }

    #[derive(Default)]
    struct Counting {
        violations: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CommandListener for Counting {
        async fn on_permission_violation(&self, _event: &CommandEvent) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn spawned_listener_routes_and_stops_on_close() {
        let bus = EventBus::new(8);
        let listener = Counting::default();
        let seen = Arc::clone(&listener.violations);
        let handle = bus.spawn_listener(listener);

        bus.emit(violation());
        bus.emit(violation());
        drop(bus);

        handle.await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
