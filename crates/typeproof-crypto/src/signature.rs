//! # Attester Signatures
//!
//! Attesters sign `hash(entity_commitment, type_code)` with a key held by the
//! registry. The scheme is a capability: production deployments plug in the
//! signature gadget their circuit verifies (EdDSA over Baby Jubjub is
//! typical), behind [`SignatureScheme`].
//!
//! ## Key Layout
//!
//! A public key is two field elements `(x, y)`; the attester's Merkle leaf is
//! `hash(x, y)`. [`Ed25519Scheme`] splits its 32-byte compressed point into
//! two 16-byte halves so the same layout holds.
//!
//! ## Security Invariant
//!
//! - `SecretKey` zeroizes on drop and never appears in `Debug` output.
//! - `SecretKey` does not implement `Serialize`. Stores that persist it must
//!   do so through [`SecretKey::as_bytes`] explicitly.

use ed25519_dalek::{Signer, Verifier};
use rand_core::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use typeproof_core::{hex, FieldElement};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::hash::FieldHasher;

/// A public key as two field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// First coordinate.
    pub x: FieldElement,
    /// Second coordinate.
    pub y: FieldElement,
}

impl PublicKey {
    /// The Merkle leaf for this key: `hash(x, y)`.
    pub fn leaf(&self, hasher: &dyn FieldHasher) -> FieldElement {
        hasher.hash2(&self.x, &self.y)
    }
}

/// Secret signing material. Opaque to everything but the scheme that made it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey(Vec<u8>);

impl SecretKey {
    /// Wrap raw secret bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

/// A scheme-specific signature, serialized as hex.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Signature(Vec<u8>);

impl Signature {
    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}...)", hex::prefix(&self.0))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map(Self).map_err(serde::de::Error::custom)
    }
}

/// A freshly generated key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    /// Public half.
    pub public: PublicKey,
    /// Secret half.
    pub secret: SecretKey,
}

/// Signing capability.
pub trait SignatureScheme: Send + Sync + std::fmt::Debug {
    /// Short scheme name recorded with attestations.
    fn name(&self) -> &'static str;

    /// Generate a new key pair.
    fn generate(&self) -> Result<KeyPair, CryptoError>;

    /// Sign a single field element.
    fn sign(&self, secret: &SecretKey, message: &FieldElement) -> Result<Signature, CryptoError>;

    /// Check a signature. Malformed keys or signatures verify as `false`.
    fn verify(&self, public: &PublicKey, message: &FieldElement, signature: &Signature) -> bool;
}

// ---------------------------------------------------------------------------
// Ed25519 reference scheme
// ---------------------------------------------------------------------------

/// Ed25519 over the big-endian encoding of the message element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    fn split_point(bytes: &[u8; 32]) -> PublicKey {
        PublicKey {
            x: FieldElement::from_be_bytes_mod_order(&bytes[..16]),
            y: FieldElement::from_be_bytes_mod_order(&bytes[16..]),
        }
    }

    fn join_point(public: &PublicKey) -> Option<[u8; 32]> {
        let x = public.x.to_be_bytes();
        let y = public.y.to_be_bytes();
        // Each half must fit in 16 bytes.
        if x[..16].iter().chain(y[..16].iter()).any(|b| *b != 0) {
            return None;
        }
        let mut out = [0u8; 32];
        out[..16].copy_from_slice(&x[16..]);
        out[16..].copy_from_slice(&y[16..]);
        Some(out)
    }

    fn signing_key(secret: &SecretKey) -> Result<ed25519_dalek::SigningKey, CryptoError> {
        let seed: Zeroizing<[u8; 32]> = Zeroizing::new(
            secret
                .as_bytes()
                .try_into()
                .map_err(|_| CryptoError::KeyError(format!(
                    "ed25519 secret must be 32 bytes, got {}",
                    secret.as_bytes().len()
                )))?,
        );
        Ok(ed25519_dalek::SigningKey::from_bytes(&seed))
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn name(&self) -> &'static str {
        "ed25519"
    }

    fn generate(&self) -> Result<KeyPair, CryptoError> {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut OsRng);
        let public = Self::split_point(&signing_key.verifying_key().to_bytes());
        let seed = Zeroizing::new(signing_key.to_bytes());
        let secret = SecretKey(seed.to_vec());
        Ok(KeyPair { public, secret })
    }

    fn sign(&self, secret: &SecretKey, message: &FieldElement) -> Result<Signature, CryptoError> {
        let signing_key = Self::signing_key(secret)?;
        let sig = signing_key.sign(&message.to_be_bytes());
        Ok(Signature(sig.to_bytes().to_vec()))
    }

    fn verify(&self, public: &PublicKey, message: &FieldElement, signature: &Signature) -> bool {
        let Some(point) = Self::join_point(public) else {
            return false;
        };
        let Ok(vk) = ed25519_dalek::VerifyingKey::from_bytes(&point) else {
            return false;
        };
        let Ok(sig_bytes) = <[u8; 64]>::try_from(signature.as_bytes()) else {
            return false;
        };
        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
        vk.verify(&message.to_be_bytes(), &sig).is_ok()
    }
}
