//! Content digests as they travel through relations and documents.
//!
//! A digest leaves memory only as lowercase hex: it is the object of a
//! `_has-hash` relation and the `hash` of a parent reference in a
//! serialized collection. [`Digest::parse_hex`] is the single way back in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// BLAKE3 content digest of an instance or collection.
///
/// Serializes as its hex form, so documents carry the same text that
/// appears in `_has-hash` relations.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest([u8; Digest::LEN]);

impl Digest {
    /// Length of a digest in bytes.
    pub const LEN: usize = 32;
    /// Length of the hex form.
    pub const HEX_LEN: usize = 2 * Self::LEN;

    pub const fn new(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Lowercase hex, as written into `_has-hash` relations.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters, for log fields.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a cached or persisted digest. Either hex case is accepted;
    /// [`Digest::to_hex`] always gives back lowercase.
    pub fn parse_hex(text: &str) -> Result<Self, TypeError> {
        let invalid = |reason: String| TypeError::InvalidDigest {
            value: text.to_string(),
            reason,
        };
        if text.len() != Self::HEX_LEN {
            return Err(invalid(format!(
                "expected {} hex characters, got {}",
                Self::HEX_LEN,
                text.len()
            )));
        }
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(text, &mut bytes).map_err(|e| invalid(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(text: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&text)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_hex()
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.short_hex())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
