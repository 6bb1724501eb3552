//! Error types for admitq
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::id::PlayerId;

/// All error types that can occur in the admission engine
#[derive(Debug, Error)]
pub enum QueueError {
    /// Join attempted for a player who already has a queue entry
    #[error("Player already queued: {0}")]
    AlreadyQueued(PlayerId),

    /// Operation needs a queue entry the player does not have
    #[error("Player not queued: {0}")]
    NotQueued(PlayerId),

    /// A display name did not resolve to an active session
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    /// Bonus values assigned with Set must be non-negative
    #[error("Bonus must be non-negative, got {0}")]
    NegativeBonus(i64),

    /// Ledger file exists but could not be parsed
    #[error("Ledger corrupt: {0}")]
    LedgerCorrupt(String),

    /// Ledger could not be written to disk
    #[error("Ledger persist failed: {0}")]
    LedgerPersist(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for admitq operations
pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> PlayerId {
        PlayerId::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef)
    }

    #[test]
    fn test_already_queued_error() {
        let err = QueueError::AlreadyQueued(player());
        assert_eq!(
            err.to_string(),
            "Player already queued: 01234567-89ab-cdef-0123-456789abcdef"
        );
    }

    #[test]
    fn test_not_queued_error() {
        let err = QueueError::NotQueued(player());
        assert!(err.to_string().starts_with("Player not queued: "));
    }

    #[test]
    fn test_unknown_player_error() {
        let err = QueueError::UnknownPlayer("Steve".to_string());
        assert_eq!(err.to_string(), "Unknown player: Steve");
    }

    #[test]
    fn test_negative_bonus_error() {
        let err = QueueError::NegativeBonus(-4);
        assert_eq!(err.to_string(), "Bonus must be non-negative, got -4");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: QueueError = io_err.into();
        assert!(matches!(err, QueueError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: QueueError = json_err.into();
        assert!(matches!(err, QueueError::Json(_)));
    }
}
