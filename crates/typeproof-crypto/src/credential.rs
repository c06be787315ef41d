//! # Attester Credentials
//!
//! A credential is a random bearer token handed to an attester exactly once,
//! at registration. The registry keeps only its SHA-256 hash.
//!
//! ## Security Invariant
//!
//! - The plaintext zeroizes on drop and is redacted from `Debug`.
//! - Hash comparison is constant time (`subtle`), so lookup timing does not
//!   leak how many leading bytes of a guess were right.

use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use typeproof_core::{hex, sha256_bytes, ContentDigest};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// Prefix of every attester credential.
pub const CREDENTIAL_PREFIX: &str = "tpa_";

/// Plaintext bearer credential.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credential(String);

impl Credential {
    /// Generate 32 random bytes, rendered as `tpa_<hex>`.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut raw = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| CryptoError::Randomness(e.to_string()))?;
        let token = format!("{CREDENTIAL_PREFIX}{}", hex::encode(&raw));
        raw.zeroize();
        Ok(Self(token))
    }

    /// Wrap a credential presented by a caller.
    pub fn from_plaintext(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    /// The plaintext. Handle with care.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// The irreversible hash the registry stores.
    pub fn hash(&self) -> CredentialHash {
        CredentialHash(sha256_bytes(self.0.as_bytes()))
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// SHA-256 of a credential.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialHash(ContentDigest);

impl CredentialHash {
    /// Constant-time equality.
    pub fn ct_matches(&self, other: &CredentialHash) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    /// Hex rendering for storage.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_credentials_are_unique_and_prefixed() {
        let a = Credential::generate().unwrap();
        let b = Credential::generate().unwrap();
        assert!(a.expose().starts_with(CREDENTIAL_PREFIX));
        assert_eq!(a.expose().len(), CREDENTIAL_PREFIX.len() + 64);
        assert_ne!(a.expose(), b.expose());
    }

    #[test]
    fn hash_matches_only_same_plaintext() {
        let a = Credential::generate().unwrap();
        let same = Credential::from_plaintext(a.expose());
        let other = Credential::generate().unwrap();
        assert!(a.hash().ct_matches(&same.hash()));
        assert!(!a.hash().ct_matches(&other.hash()));
    }

    #[test]
    fn debug_is_redacted() {
        let a = Credential::generate().unwrap();
        let dbg = format!("{a:?}");
        assert!(!dbg.contains(a.expose()));
    }
}
