//! Platform identity newtypes.
//!
//! Chat platforms hand out 64-bit snowflakes for users, guilds, channels and
//! messages. Wrapping them keeps a user id from being passed where a channel
//! id is expected.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map(Self)
                    .map_err(|_| Error::invalid_id($kind, s))
            }
        }
    };
}

snowflake!(
    /// Identifies a user account on the platform.
    UserId,
    "user"
);
snowflake!(
    /// Identifies a guild (server / tenant).
    GuildId,
    "guild"
);
snowflake!(
    /// Identifies a text channel inside a guild or a DM channel.
    ChannelId,
    "channel"
);
snowflake!(
    /// Identifies a single message.
    MessageId,
    "message"
);

impl UserId {
    /// The mention string the platform renders as a ping (`<@id>`).
    #[must_use]
    pub fn mention(self) -> String {
        format!("<@{}>", self.0)
    }
}
