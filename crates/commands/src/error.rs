use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The builder was not given a way to send messages.
    #[error("no outbound channel configured")]
    MissingOutbound,

    /// No tokio runtime was running when the client was built and none was
    /// passed in explicitly.
    #[error("no tokio runtime available; build inside a runtime or pass a handle")]
    NoRuntime,

    #[error(transparent)]
    Channel(#[from] regnum_channels::Error),

    #[error("{message}")]
    Message { message: String },
}

impl regnum_common::FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

regnum_common::impl_context!();
