//! Prefix command dispatch for chat bots.
//!
//! Flow: inbound message → prefix match → tokenize → walk the alias tree to
//! the deepest matching (sub)command → permission gate → run the command body
//! on the worker pool. Permission denials and command failures are published
//! as [`CommandEvent`]s; everything else that does not look like a command is
//! ignored silently.

pub mod arguments;
pub mod builder;
pub mod client;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod format;
pub mod permission;
pub mod pool;
pub mod prefix;
pub mod registry;
pub mod resolver;
pub mod tokenizer;

pub use {
    arguments::Arguments,
    builder::CommandClientBuilder,
    client::{CommandClient, DispatchOutcome, IgnoreReason},
    command::{Command, CommandBuilder, CommandHandler},
    config::{Configuration, PermissionMessageFactory},
    context::InvocationContext,
    error::{Error, Result},
    events::{CommandEvent, CommandEventSink, CommandListener, EventBus, LoggingListener},
    permission::{DefaultPermissionGate, PermissionGate, PermissionPolicy},
    registry::AliasRegistry,
};
