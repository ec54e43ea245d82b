//! The dispatcher: turns inbound messages into command executions.

use std::{
    any::Any,
    fmt,
    panic::AssertUnwindSafe,
    sync::{Arc, Weak},
};

use {
    futures::FutureExt,
    regnum_channels::{
        ChannelOutbound, InboundMessage, InformationProvider, MessageKind, PermissionContext,
    },
    regnum_common::types::{GuildId, UserId},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use regnum_metrics::{commands as cmd_metrics, counter, gauge, histogram, labels};

use crate::{
    arguments::Arguments,
    builder::CommandClientBuilder,
    command::Command,
    config::Configuration,
    context::InvocationContext,
    events::{CommandEvent, CommandEventSink, EventBus},
    permission::PermissionGate,
    pool::WorkerPool,
    prefix::resolve_prefix,
    registry::AliasRegistry,
    resolver::{Resolution, resolve},
    tokenizer::tokenize,
};

/// Why a message did not lead to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Sent by a bot, a webhook or the platform itself.
    AutomatedAuthor,
    /// An edit, and edits are not dispatched.
    EditedMessage,
    NoPrefix,
    /// Nothing but the prefix.
    NoTokens,
    UnknownCommand,
}

impl IgnoreReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutomatedAuthor => "automated_author",
            Self::EditedMessage => "edited_message",
            Self::NoPrefix => "no_prefix",
            Self::NoTokens => "no_tokens",
            Self::UnknownCommand => "unknown_command",
        }
    }
}

/// What [`CommandClient::dispatch`] did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    /// The permission gate refused; a `PermissionViolation` was published.
    Denied,
    /// The command body was handed to the worker pool.
    Submitted,
}

pub(crate) struct ClientInner {
    pub(crate) config: Configuration,
    pub(crate) registry: AliasRegistry,
    pub(crate) outbound: Arc<dyn ChannelOutbound>,
    pub(crate) info: Arc<dyn InformationProvider>,
    pub(crate) permissions: Arc<dyn PermissionContext>,
    pub(crate) gate: Arc<dyn PermissionGate>,
    pub(crate) events: Arc<dyn CommandEventSink>,
    pub(crate) bus: Option<EventBus>,
    pub(crate) pool: WorkerPool,
    pub(crate) mention: Option<String>,
}

/// Routes messages to registered commands. Cheap to clone; clones share
/// the registry and collaborators.
#[derive(Clone)]
pub struct CommandClient {
    inner: Arc<ClientInner>,
}

impl CommandClient {
    #[must_use]
    pub fn builder() -> CommandClientBuilder {
        CommandClientBuilder::new()
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<ClientInner> {
        Arc::downgrade(&self.inner)
    }

    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.inner.config
    }

    /// The root alias namespace.
    #[must_use]
    pub fn registry(&self) -> &AliasRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn outbound(&self) -> &dyn ChannelOutbound {
        self.inner.outbound.as_ref()
    }

    #[must_use]
    pub fn information_provider(&self) -> &dyn InformationProvider {
        self.inner.info.as_ref()
    }

    #[must_use]
    pub fn permission_context(&self) -> &dyn PermissionContext {
        self.inner.permissions.as_ref()
    }

    /// The bus events are published on, unless a custom sink replaced it.
    #[must_use]
    pub fn event_bus(&self) -> Option<&EventBus> {
        self.inner.bus.as_ref()
    }

    /// Command bodies submitted and not finished yet.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.inner.pool.pending()
    }

    /// The mention string accepted as a prefix, e.g. `<@123>`.
    #[must_use]
    pub fn mention(&self) -> Option<&str> {
        self.inner.mention.as_deref()
    }

    pub fn register_command(&self, command: Arc<Command>) {
        info!(
            command = %command.name(),
            aliases = ?command.aliases(),
            "command registered"
        );
        self.inner.registry.register(command);
        self.record_alias_count();
    }

    pub fn register_commands(&self, commands: impl IntoIterator<Item = Arc<Command>>) {
        for command in commands {
            self.register_command(command);
        }
    }

    /// Remove the aliases of `command` that still point at it. Returns how
    /// many alias entries were removed.
    pub fn unregister_command(&self, command: &Arc<Command>) -> usize {
        let removed = self.inner.registry.unregister(command);
        info!(command = %command.name(), removed, "command unregistered");
        self.record_alias_count();
        removed
    }

    pub fn unregister_alias(&self, alias: &str) -> Option<Arc<Command>> {
        let removed = self.inner.registry.unregister_alias(alias);
        if let Some(command) = &removed {
            info!(alias, command = %command.name(), "alias unregistered");
        }
        self.record_alias_count();
        removed
    }

    /// Each root command once, sorted by name.
    #[must_use]
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.inner.registry.commands()
    }

    /// The command at exactly `path` (alias, subcommand alias, ...).
    #[must_use]
    pub fn find_command<S: AsRef<str>>(&self, path: &[S]) -> Option<Arc<Command>> {
        resolve(path, &self.inner.registry)
            .filter(|res| res.args.is_empty())
            .map(|res| res.command)
    }

    /// The prefix help text should show in `guild`: its override if set,
    /// else the default.
    #[must_use]
    pub fn effective_prefix(&self, guild: Option<GuildId>) -> String {
        guild
            .and_then(|g| self.inner.info.prefix(g))
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.inner.config.default_prefix.clone())
    }

    /// Configured owners plus whoever the information provider vouches for.
    #[must_use]
    pub fn is_owner(&self, user: UserId) -> bool {
        self.inner.config.is_owner(user) || self.inner.info.is_owner(user)
    }

    #[cfg(feature = "metrics")]
    fn record_alias_count(&self) {
        gauge!(cmd_metrics::ALIASES_REGISTERED).set(self.inner.registry.len() as f64);
    }

    #[cfg(not(feature = "metrics"))]
    fn record_alias_count(&self) {}

    fn ignore(reason: IgnoreReason) -> DispatchOutcome {
        debug!(reason = reason.as_str(), "message ignored");
        #[cfg(feature = "metrics")]
        counter!(cmd_metrics::IGNORED_TOTAL, labels::REASON => reason.as_str()).increment(1);
        DispatchOutcome::Ignored(reason)
    }

    /// Route one inbound message.
    ///
    /// Resolution and the permission check run on the caller; the command
    /// body is submitted to the worker pool and not awaited. Must be called
    /// from within the runtime the client was built with, or from any
    /// thread if a runtime handle was passed to the builder.
    pub fn dispatch(&self, message: InboundMessage) -> DispatchOutcome {
        #[cfg(feature = "metrics")]
        counter!(cmd_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

        let config = &self.inner.config;

        if message.author.is_automated() {
            return Self::ignore(IgnoreReason::AutomatedAuthor);
        }
        if message.kind == MessageKind::Edited && !config.dispatch_edits {
            return Self::ignore(IgnoreReason::EditedMessage);
        }

        let guild_prefix = message.guild_id.and_then(|g| self.inner.info.prefix(g));
        let Some(prefix) = resolve_prefix(
            &message.content,
            guild_prefix.as_deref(),
            self.inner.mention.as_deref(),
            config,
        ) else {
            return Self::ignore(IgnoreReason::NoPrefix);
        };
        let prefix = prefix.to_string();

        let tokens = tokenize(&message.content, &prefix);
        if tokens.is_empty() {
            return Self::ignore(IgnoreReason::NoTokens);
        }

        let Some(Resolution { command, args }) = resolve(&tokens, &self.inner.registry) else {
            return Self::ignore(IgnoreReason::UnknownCommand);
        };

        if config.send_typing {
            let outbound = Arc::clone(&self.inner.outbound);
            let channel = message.channel_id;
            self.inner.pool.spawn_detached(async move {
                if let Err(e) = outbound.send_typing(channel).await {
                    debug!(error = %e, channel = %channel, "typing indicator failed");
                }
            });
        }

        let ctx = Arc::new(InvocationContext::new(
            Arc::clone(&command),
            Arguments::new(args),
            message,
            prefix,
            self.downgrade(),
        ));

        if !self.inner.gate.is_allowed(&ctx) {
            self.deny(ctx);
            return DispatchOutcome::Denied;
        }

        debug!(
            command = %command.name(),
            user = %ctx.author().id,
            args = ctx.args().len(),
            "dispatching command"
        );
        #[cfg(feature = "metrics")]
        counter!(cmd_metrics::DISPATCHED_TOTAL, labels::COMMAND => command.name().to_string())
            .increment(1);

        self.inner
            .pool
            .submit(run_command(Arc::clone(&self.inner.events), ctx));
        DispatchOutcome::Submitted
    }

    fn deny(&self, ctx: Arc<InvocationContext>) {
        let command = Arc::clone(ctx.command());
        let author = ctx.author().clone();
        warn!(
            command = %command.name(),
            user = %author.id,
            policy = %command.permission(),
            "permission denied"
        );
        #[cfg(feature = "metrics")]
        counter!(cmd_metrics::PERMISSION_DENIED_TOTAL, labels::COMMAND => command.name().to_string())
            .increment(1);

        self.inner.events.emit(CommandEvent::PermissionViolation {
            command,
            principal: author,
            guild_id: ctx.guild_id(),
            channel_id: ctx.channel_id(),
        });

        self.inner.pool.spawn_detached(async move {
            if let Err(e) = ctx.notify_permission_error().await {
                warn!(
                    error = %e,
                    user = %ctx.author().id,
                    "could not notify user about missing permission"
                );
            }
        });
    }
}

impl fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandClient")
            .field("config", &self.inner.config)
            .field("registry", &self.inner.registry)
            .field("mention", &self.inner.mention)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Run a command body and turn any error or panic into a `CommandFailure`.
async fn run_command(events: Arc<dyn CommandEventSink>, ctx: Arc<InvocationContext>) {
    let command = Arc::clone(ctx.command());
    let handler = command.handler();

    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();
    #[cfg(feature = "metrics")]
    gauge!(cmd_metrics::IN_FLIGHT).increment(1.0);

    let outcome = AssertUnwindSafe({
        let ctx = Arc::clone(&ctx);
        async move { handler.execute(ctx).await }
    })
    .catch_unwind()
    .await;

    #[cfg(feature = "metrics")]
    {
        gauge!(cmd_metrics::IN_FLIGHT).decrement(1.0);
        histogram!(cmd_metrics::EXECUTION_DURATION_SECONDS, labels::COMMAND => command.name().to_string())
            .record(started.elapsed().as_secs_f64());
    }

    let error = match outcome {
        Ok(Ok(())) => {
            debug!(command = %command.name(), "command completed");
            #[cfg(feature = "metrics")]
            counter!(cmd_metrics::EXECUTED_TOTAL, labels::COMMAND => command.name().to_string())
                .increment(1);
            return;
        },
        Ok(Err(e)) => e,
        Err(payload) => anyhow::anyhow!("command panicked: {}", panic_message(payload.as_ref())),
    };

    warn!(
        command = %command.name(),
        user = %ctx.author().id,
        error = %error,
        "command failed"
    );
    #[cfg(feature = "metrics")]
    counter!(cmd_metrics::FAILED_TOTAL, labels::COMMAND => command.name().to_string()).increment(1);

    events.emit(CommandEvent::CommandFailure {
        command,
        context: ctx,
        error: Arc::new(error),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "non-string panic payload");
    }

    #[test]
    fn ignore_reason_labels() {
        assert_eq!(IgnoreReason::NoPrefix.as_str(), "no_prefix");
        assert_eq!(IgnoreReason::UnknownCommand.as_str(), "unknown_command");
    }
}
