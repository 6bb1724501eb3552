//! Player identifiers
//!
//! Players are identified by an opaque 128-bit id supplied by the host. On disk
//! and on the command line the id is written in hyphenated UUID form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque unique player identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Build an id from its raw 128-bit value
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Generate a random id (used for synthetic players)
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Raw 128-bit value
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Short form for log lines: the first hyphen-separated group
    pub fn short(&self) -> String {
        let text = self.0.to_string();
        text.split('-').next().unwrap_or_default().to_string()
    }
}

impl From<Uuid> for PlayerId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for PlayerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_hyphenated() {
        let id = PlayerId::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn test_parse_round_trip() {
        let id: PlayerId = "01234567-89ab-cdef-0123-456789abcdef".parse().unwrap();
        assert_eq!(id.as_u128(), 0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: PlayerId = "  01234567-89ab-cdef-0123-456789abcdef\n".parse().unwrap();
        assert_eq!(id, PlayerId::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-player".parse::<PlayerId>().is_err());
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(PlayerId::random(), PlayerId::random());
    }

    #[test]
    fn test_short_form() {
        let id = PlayerId::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        assert_eq!(id.short(), "01234567");
    }

    #[test]
    fn test_serde_as_string() {
        let id = PlayerId::from_u128(1);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000001\"");
    }
}
