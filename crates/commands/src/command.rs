use std::{
    fmt,
    future::Future,
    sync::{Arc, OnceLock, Weak},
};

use {async_trait::async_trait, tracing::warn};

use crate::{context::InvocationContext, permission::PermissionPolicy, registry::AliasRegistry};

/// The body of a command.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Run the command. Errors (and panics) are reported as
    /// `CommandFailure` events; they never reach the dispatcher.
    async fn execute(&self, ctx: Arc<InvocationContext>) -> anyhow::Result<()>;
}

/// Adapts an async closure into a [`CommandHandler`].
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn execute(&self, ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        (self.0)(ctx).await
    }
}

/// Default body for commands that only group subcommands: reply with usage.
struct UsageHandler;

#[async_trait]
impl CommandHandler for UsageHandler {
    async fn execute(&self, ctx: Arc<InvocationContext>) -> anyhow::Result<()> {
        ctx.send_usage().await?;
        Ok(())
    }
}

/// An invocable command, possibly with its own subcommands.
///
/// Commands are shared as `Arc<Command>`; identity is pointer identity, so
/// the same command registered under several aliases is still one command.
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: String,
    example_usage: String,
    permission: PermissionPolicy,
    subcommands: AliasRegistry,
    parent: OnceLock<Weak<Command>>,
    handler: Arc<dyn CommandHandler>,
}

impl Command {
    /// Start building a command with the given display name.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Display name used in help output.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared aliases, as given at construction.
    #[must_use]
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The first declared alias, used when rendering invocations.
    #[must_use]
    pub fn primary_alias(&self) -> &str {
        self.aliases.first().map_or(self.name.as_str(), String::as_str)
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Argument synopsis, e.g. `<user> [reason]`.
    #[must_use]
    pub fn usage(&self) -> &str {
        &self.usage
    }

    #[must_use]
    pub fn example_usage(&self) -> &str {
        &self.example_usage
    }

    #[must_use]
    pub fn permission(&self) -> &PermissionPolicy {
        &self.permission
    }

    /// This command's own alias namespace.
    #[must_use]
    pub fn subcommands(&self) -> &AliasRegistry {
        &self.subcommands
    }

    #[must_use]
    pub fn has_subcommands(&self) -> bool {
        !self.subcommands.is_empty()
    }

    /// The command this one was registered under, if it is a subcommand
    /// and the parent is still alive.
    #[must_use]
    pub fn parent(&self) -> Option<Arc<Command>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    #[must_use]
    pub fn is_subcommand(&self) -> bool {
        self.parent.get().is_some()
    }

    pub(crate) fn handler(&self) -> Arc<dyn CommandHandler> {
        Arc::clone(&self.handler)
    }

    /// Register `child` in this command's namespace and link it back to
    /// this command.
    pub fn register_subcommand(self: &Arc<Self>, child: Arc<Command>) {
        if child.parent.set(Arc::downgrade(self)).is_err() {
            warn!(
                command = %child.name,
                parent = %self.name,
                "subcommand already has a parent; keeping the first link"
            );
        }
        self.subcommands.register(child);
    }

    pub fn register_subcommands(self: &Arc<Self>, children: impl IntoIterator<Item = Arc<Command>>) {
        for child in children {
            self.register_subcommand(child);
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .field("subcommands", &self.subcommands.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Command`].
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    description: String,
    usage: String,
    example_usage: String,
    permission: PermissionPolicy,
    handler: Option<Arc<dyn CommandHandler>>,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            description: String::new(),
            usage: String::new(),
            example_usage: String::new(),
            permission: PermissionPolicy::Public,
            handler: None,
        }
    }

    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    #[must_use]
    pub fn example_usage(mut self, example: impl Into<String>) -> Self {
        self.example_usage = example.into();
        self
    }

    #[must_use]
    pub fn permission(mut self, permission: PermissionPolicy) -> Self {
        self.permission = permission;
        self
    }

    #[must_use]
    pub fn handler(mut self, handler: Arc<dyn CommandHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Use an async closure as the command body.
    #[must_use]
    pub fn run<F, Fut>(self, f: F) -> Self
    where
        F: Fn(Arc<InvocationContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.handler(Arc::new(FnHandler(f)))
    }

    /// Finish the command. Without declared aliases the display name is the
    /// only alias; without a body the command replies with its usage.
    #[must_use]
    pub fn build(self) -> Arc<Command> {
        let aliases = if self.aliases.is_empty() {
            vec![self.name.clone()]
        } else {
            self.aliases
        };
        Arc::new(Command {
            name: self.name,
            aliases,
            description: self.description,
            usage: self.usage,
            example_usage: self.example_usage,
            permission: self.permission,
            subcommands: AliasRegistry::new(),
            parent: OnceLock::new(),
            handler: self.handler.unwrap_or_else(|| Arc::new(UsageHandler)),
        })
    }
}
