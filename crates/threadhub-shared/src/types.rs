use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{
    THREAD_ID_RANDOM_LEN, THREAD_ID_V1, VARIANT_ACCESS_CONTROLLED, VARIANT_RAW,
};
use crate::error::ParseError;

/// The flavour of log a thread id was minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ThreadVariant {
    Raw = VARIANT_RAW,
    AccessControlled = VARIANT_ACCESS_CONTROLLED,
}

impl ThreadVariant {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            VARIANT_RAW => Some(Self::Raw),
            VARIANT_ACCESS_CONTROLLED => Some(Self::AccessControlled),
            _ => None,
        }
    }
}

/// Opaque thread identifier.
///
/// Layout of a v1 id: `[version, variant, random bytes...]`. The registry
/// only ever compares ids byte for byte; the layout matters to whoever mints
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadId(Vec<u8>);

impl ThreadId {
    /// Mint a fresh v1 id with `random_len` random bytes.
    pub fn new_v1(variant: ThreadVariant, random_len: usize) -> Self {
        let mut bytes = vec![0u8; 2 + random_len];
        bytes[0] = THREAD_ID_V1;
        bytes[1] = variant as u8;
        rand::thread_rng().fill_bytes(&mut bytes[2..]);
        Self(bytes)
    }

    /// Mint a raw-variant id with the default random length.
    pub fn random() -> Self {
        Self::new_v1(ThreadVariant::Raw, THREAD_ID_RANDOM_LEN)
    }

    /// Wrap bytes read back from storage without validating them.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// An id is defined when it carries at least one byte.
    pub fn is_defined(&self) -> bool {
        !self.0.is_empty()
    }

    pub fn variant(&self) -> Option<ThreadVariant> {
        self.0.get(1).copied().and_then(ThreadVariant::from_byte)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn short(&self) -> String {
        let hex = self.to_hex();
        hex[..hex.len().min(12)].to_string()
    }
}

impl FromStr for ThreadId {
    type Err = ParseError;

    /// Parse a hex-encoded v1 id, checking the version and variant bytes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        let bytes = hex::decode(s)?;
        if bytes.len() < 3 {
            return Err(ParseError::TooShort(bytes.len()));
        }
        if bytes[0] != THREAD_ID_V1 {
            return Err(ParseError::UnsupportedVersion(bytes[0]));
        }
        if ThreadVariant::from_byte(bytes[1]).is_none() {
            return Err(ParseError::UnknownVariant(bytes[1]));
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Owner identity = public key bytes, compared for equality only
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerKey(Vec<u8>);

impl OwnerKey {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn short(&self) -> String {
        let hex = self.to_hex();
        hex[..hex.len().min(8)].to_string()
    }
}

impl From<ed25519_dalek::VerifyingKey> for OwnerKey {
    fn from(key: ed25519_dalek::VerifyingKey) -> Self {
        Self(key.to_bytes().to_vec())
    }
}

impl FromStr for OwnerKey {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(Self(hex::decode(s)?))
    }
}

impl std::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Both id types travel as hex strings in JSON.
macro_rules! hex_serde {
    ($ty:ident) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
            }
        }
    };
}

hex_serde!(ThreadId);
hex_serde!(OwnerKey);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_v1_layout() {
        let id = ThreadId::new_v1(ThreadVariant::AccessControlled, 16);
        assert_eq!(id.as_bytes().len(), 18);
        assert_eq!(id.as_bytes()[0], THREAD_ID_V1);
        assert_eq!(id.variant(), Some(ThreadVariant::AccessControlled));
        assert!(id.is_defined());
    }

    #[test]
    fn test_random_ids_differ() {
        assert_ne!(ThreadId::random(), ThreadId::random());
    }

    #[test]
    fn test_parse_thread_id() {
        let id = ThreadId::random();
        let parsed: ThreadId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_bad_ids() {
        assert_eq!("".parse::<ThreadId>(), Err(ParseError::Empty));
        assert_eq!("0155".parse::<ThreadId>(), Err(ParseError::TooShort(2)));
        assert_eq!(
            "025500".parse::<ThreadId>(),
            Err(ParseError::UnsupportedVersion(0x02))
        );
        assert_eq!(
            "01ff00".parse::<ThreadId>(),
            Err(ParseError::UnknownVariant(0xff))
        );
        assert!(matches!("zz".parse::<ThreadId>(), Err(ParseError::Hex(_))));
    }

    #[test]
    fn test_owner_key_hex() {
        let owner = OwnerKey::from_bytes([0xab; 32]);
        assert_eq!(owner.to_hex(), "ab".repeat(32));
        assert_eq!(owner.short(), "abababab");
        assert_eq!(owner.to_hex().parse::<OwnerKey>().unwrap(), owner);
    }
}
