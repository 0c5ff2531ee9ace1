use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::constants::SECRET_KEY_SIZE;
use crate::error::IdentityError;
use crate::types::OwnerKey;

/// An owner's cryptographic identity based on Ed25519.
/// The public key is the owner key recorded against every thread it creates.
#[derive(Clone)]
pub struct Identity {
    signing_key: SigningKey,
}

impl Identity {
    /// Generate a new random identity
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Restore identity from secret key bytes
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        Self { signing_key }
    }

    /// Restore identity from a hex-encoded secret key
    pub fn from_secret_hex(hex_secret: &str) -> Result<Self, IdentityError> {
        let bytes = hex::decode(hex_secret.trim())
            .map_err(|e| IdentityError::KeyFile(e.to_string()))?;
        let secret: [u8; SECRET_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| IdentityError::InvalidKeyBytes)?;
        Ok(Self::from_secret_bytes(&secret))
    }

    /// Get the owner key (public key)
    pub fn owner_key(&self) -> OwnerKey {
        OwnerKey::from(self.verifying_key())
    }

    /// Get the raw secret key bytes
    pub fn secret_bytes(&self) -> &[u8; 32] {
        self.signing_key.as_bytes()
    }

    /// Get the verifying (public) key
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}
