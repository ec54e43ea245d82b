use std::sync::Arc;

use {
    regnum_channels::{
        ChannelOutbound, InformationProvider, NoPermissions, PermissionContext,
        StaticInformationProvider,
    },
    regnum_common::types::UserId,
    regnum_config::CommandsConfig,
    tokio::runtime::Handle,
    tracing::debug,
};

use crate::{
    client::{ClientInner, CommandClient},
    command::Command,
    config::{Configuration, PermissionMessageFactory},
    error::{Error, Result},
    events::{CommandEventSink, EventBus},
    permission::{DefaultPermissionGate, PermissionGate},
    pool::WorkerPool,
    registry::AliasRegistry,
};

/// Assembles a [`CommandClient`].
///
/// Only the outbound channel is required. Defaults: no guild prefixes, no
/// platform permissions, the built-in permission gate, and a fresh
/// [`EventBus`] sized by `event_capacity`.
#[derive(Default)]
pub struct CommandClientBuilder {
    config: Option<Configuration>,
    outbound: Option<Arc<dyn ChannelOutbound>>,
    info: Option<Arc<dyn InformationProvider>>,
    permissions: Option<Arc<dyn PermissionContext>>,
    gate: Option<Arc<dyn PermissionGate>>,
    sink: Option<Arc<dyn CommandEventSink>>,
    bus: Option<EventBus>,
    runtime: Option<Handle>,
    mention: Option<String>,
    commands: Vec<Arc<Command>>,
    permission_message: Option<PermissionMessageFactory>,
}

impl CommandClientBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use settings loaded from a config file.
    #[must_use]
    pub fn config(self, config: &CommandsConfig) -> Self {
        self.configuration(Configuration::from_config(config))
    }

    #[must_use]
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn outbound(mut self, outbound: Arc<dyn ChannelOutbound>) -> Self {
        self.outbound = Some(outbound);
        self
    }

    #[must_use]
    pub fn information_provider(mut self, info: Arc<dyn InformationProvider>) -> Self {
        self.info = Some(info);
        self
    }

    #[must_use]
    pub fn permission_context(mut self, permissions: Arc<dyn PermissionContext>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// Replace the built-in policy evaluation.
    #[must_use]
    pub fn permission_gate(mut self, gate: Arc<dyn PermissionGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Publish events to `sink` instead of an [`EventBus`].
    #[must_use]
    pub fn event_sink(mut self, sink: Arc<dyn CommandEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Publish events on an existing bus.
    #[must_use]
    pub fn event_bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Run command bodies on this runtime instead of the current one.
    #[must_use]
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Accept this literal mention as a prefix.
    #[must_use]
    pub fn bot_mention(mut self, mention: impl Into<String>) -> Self {
        self.mention = Some(mention.into());
        self
    }

    /// Accept `<@id>` as a prefix.
    #[must_use]
    pub fn bot_user_id(self, id: UserId) -> Self {
        self.bot_mention(id.mention())
    }

    #[must_use]
    pub fn command(mut self, command: Arc<Command>) -> Self {
        self.commands.push(command);
        self
    }

    #[must_use]
    pub fn commands(mut self, commands: impl IntoIterator<Item = Arc<Command>>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Compute the permission error message instead of using the template.
    #[must_use]
    pub fn permission_error_message(mut self, factory: PermissionMessageFactory) -> Self {
        self.permission_message = Some(factory);
        self
    }

    pub fn build(self) -> Result<CommandClient> {
        let outbound = self.outbound.ok_or(Error::MissingOutbound)?;
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|_| Error::NoRuntime)?,
        };

        let mut config = self.config.unwrap_or_default();
        if let Some(factory) = self.permission_message {
            config = config.with_permission_error_message(factory);
        }

        let (events, bus): (Arc<dyn CommandEventSink>, Option<EventBus>) = match self.sink {
            Some(sink) => (sink, self.bus),
            None => {
                let bus = self
                    .bus
                    .unwrap_or_else(|| EventBus::new(config.event_capacity));
                (Arc::new(bus.clone()), Some(bus))
            },
        };

        let pool = WorkerPool::new(runtime, config.max_concurrent_commands);
        debug!(
            prefix = %config.default_prefix,
            max_concurrent = pool.max_concurrent(),
            mention = ?self.mention,
            "command client built"
        );

        let inner = ClientInner {
            config,
            registry: AliasRegistry::new(),
            outbound,
            info: self
                .info
                .unwrap_or_else(|| Arc::new(StaticInformationProvider::new())),
            permissions: self.permissions.unwrap_or_else(|| Arc::new(NoPermissions)),
            gate: self.gate.unwrap_or_else(|| Arc::new(DefaultPermissionGate)),
            events,
            bus,
            pool,
            mention: self.mention,
        };

        let client = CommandClient::from_inner(Arc::new(inner));
        client.register_commands(self.commands);
        Ok(client)
    }
}
