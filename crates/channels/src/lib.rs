//! Interfaces to the chat platform.
//!
//! The command client never talks to a gateway connection directly. A
//! transport (Discord, a console, a test harness) converts its events into
//! [`InboundMessage`]s and supplies implementations of the traits here for
//! sending replies, looking up guild settings and answering permission
//! queries.

pub mod error;
pub mod message;
pub mod outbound;
pub mod provider;

pub use {
    error::{Error, Result},
    message::{Author, InboundMessage, MessageKind},
    outbound::ChannelOutbound,
    provider::{
        AllPermissions, InformationProvider, NoPermissions, PermissionContext,
        StaticInformationProvider,
    },
};
