//! Defines fundamental types used throughout the glowsync codebase.

use std::fmt;
use tokio::sync::{mpsc, oneshot, watch};

pub mod color;
pub mod entity;
pub mod update;

/// Enumerates all the errors that can be reported by glowsync.
/// Collaborator implementations (host adapters, dispatchers) should
/// map their errors into one of these values. Add a new value only if
/// it's generic enough to be useful to other collaborators; use the
/// associated description string to explain the details.
///
/// Errors raised inside a switch's sync cycle are never surfaced to
/// the host. They're logged and the cycle is skipped or degraded to
/// a fallback color.

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Returned whenever a resource cannot be found.
    NotFound,

    /// Reported when the peer of a communication channel has closed
    /// its handle.
    MissingPeer(String),

    /// An invalid value was provided.
    InvArgument(String),

    /// The bytes handed to the color extractor aren't an image format
    /// that could be decoded.
    DecodeError(String),

    /// The source entity has no current state, or a media player has
    /// no artwork to offer.
    UpstreamUnavailable(String),

    /// The requested operation couldn't complete. The description
    /// field will have more information for the user.
    OperationError(String),

    /// A bad parameter was given in a configuration or a
    /// configuration was missing a required parameter.
    ConfigError(String),

    /// There was a problem parsing a string. The associated string
    /// will describe how the parsing failed.
    ParseError(String),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(f, "item not found"),
            Error::MissingPeer(detail) => {
                write!(f, "{} is missing peer", detail)
            }
            Error::InvArgument(v) => write!(f, "{}", &v),
            Error::DecodeError(v) => write!(f, "decode error: {}", &v),
            Error::UpstreamUnavailable(v) => {
                write!(f, "upstream unavailable: {}", &v)
            }
            Error::OperationError(v) => {
                write!(f, "couldn't complete operation: {}", &v)
            }
            Error::ConfigError(v) => write!(f, "config error: {}", &v),
            Error::ParseError(v) => write!(f, "parse error: {}", &v),
        }
    }
}

// Defining these trait implementations allows any code that sends
// requests over a tokio channel and expects the reply in a `oneshot`
// to easily translate the channel errors into a glowsync error.

impl<T> From<mpsc::error::SendError<T>> for Error {
    fn from(_error: mpsc::error::SendError<T>) -> Self {
        Error::MissingPeer(String::from("request channel is closed"))
    }
}

impl From<oneshot::error::RecvError> for Error {
    fn from(_error: oneshot::error::RecvError) -> Self {
        Error::MissingPeer(String::from("request dropped"))
    }
}

impl<T> From<watch::error::SendError<T>> for Error {
    fn from(_error: watch::error::SendError<T>) -> Self {
        Error::MissingPeer(String::from("no options listeners remain"))
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Error::NotFound), "item not found");
        assert_eq!(
            format!("{}", Error::DecodeError("bad magic".into())),
            "decode error: bad magic"
        );
        assert_eq!(
            format!(
                "{}",
                Error::UpstreamUnavailable("weather.home has no state".into())
            ),
            "upstream unavailable: weather.home has no state"
        );
        assert_eq!(
            format!("{}", Error::ConfigError("missing light_ids".into())),
            "config error: missing light_ids"
        );
    }

    #[tokio::test]
    async fn test_channel_errors() {
        let (tx, rx) = mpsc::channel::<u32>(1);

        std::mem::drop(rx);

        let e: Error = tx.send(1).await.unwrap_err().into();

        assert!(matches!(e, Error::MissingPeer(_)));

        let (tx, rx) = oneshot::channel::<u32>();

        std::mem::drop(tx);

        let e: Error = rx.await.unwrap_err().into();

        assert!(matches!(e, Error::MissingPeer(_)));
    }
}
