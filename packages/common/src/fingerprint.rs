use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// SHA-256 digest of a piece of source code.
///
/// A run stores the fingerprint of the code it evaluated so that a later
/// submit can tell whether results exist for exactly that code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodeFingerprint([u8; 32]);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFingerprintError(String);

impl fmt::Display for ParseFingerprintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid code fingerprint: {}", self.0)
    }
}

impl std::error::Error for ParseFingerprintError {}

impl CodeFingerprint {
    pub fn compute(code: &str) -> Self {
        Self(Sha256::digest(code.as_bytes()).into())
    }

    /// Parse a hex-encoded fingerprint string.
    pub fn from_hex(s: &str) -> Result<Self, ParseFingerprintError> {
        if s.len() != 64 {
            return Err(ParseFingerprintError(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }

        let bytes = hex::decode(s).map_err(|e| ParseFingerprintError(format!("invalid hex: {e}")))?;

        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseFingerprintError("decoded to wrong length".into()))?;

        Ok(Self(arr))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }

    pub fn matches(&self, code: &str) -> bool {
        *self == Self::compute(code)
    }
}

impl fmt::Debug for CodeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CodeFingerprint({})", self.to_hex())
    }
}

impl fmt::Display for CodeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for CodeFingerprint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CodeFingerprint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
