//! Unguessable artifact identifiers.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{self, Write};
use std::str::FromStr;

/// Random bytes drawn per identifier (128 bits).
pub const ID_BYTES: usize = 16;

/// Length of the hex rendering of an identifier.
pub const ID_LEN: usize = ID_BYTES * 2;

/// Identifier of a stored artifact: 32 lowercase hex characters drawn from a
/// cryptographically secure generator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Draw a fresh identifier.
    pub fn generate() -> Self {
        let mut raw = [0u8; ID_BYTES];
        rand::rng().fill_bytes(&mut raw);

        let mut hex = String::with_capacity(ID_LEN);
        for byte in raw {
            // Writing to a String cannot fail
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

/// Returned when a string is not a well-formed artifact identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("artifact id must be 32 lowercase hex characters")]
pub struct InvalidArtifactId;

impl FromStr for ArtifactId {
    type Err = InvalidArtifactId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let well_formed = s.len() == ID_LEN
            && s.bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        if well_formed {
            Ok(Self(s.to_string()))
        } else {
            Err(InvalidArtifactId)
        }
    }
}

impl TryFrom<String> for ArtifactId {
    type Error = InvalidArtifactId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ArtifactId> for String {
    fn from(id: ArtifactId) -> Self {
        id.0
    }
}

impl Borrow<str> for ArtifactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
