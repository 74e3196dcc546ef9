//! Top-level error type aggregating the per-layer errors.

use raceline_protocol::ProtocolError;
use raceline_room::RoomError;
use raceline_transport::TransportError;

/// Any error the server can surface.
#[derive(Debug, thiserror::Error)]
pub enum RacelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use raceline_protocol::RoomCode;

    #[test]
    fn test_room_error_message_passes_through() {
        let err: RacelineError =
            RoomError::NotFound(RoomCode::new("AB12CD")).into();
        assert_eq!(err.to_string(), "room AB12CD not found");
    }

    #[test]
    fn test_io_error_is_prefixed() {
        let err: RacelineError = std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            "address in use",
        )
        .into();
        assert!(err.to_string().starts_with("i/o error:"));
    }
}
