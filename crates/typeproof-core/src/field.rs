//! # Field Elements over the BN254 Scalar Field
//!
//! `FieldElement` wraps `ark_bn254::Fr`, the scalar field of the BN254
//! curve. It is the field the external circuits are written over, so every
//! value that crosses the proof boundary (commitments, nullifiers, Merkle
//! roots, type codes, context ids) is one of these.
//!
//! ## Encoding
//!
//! - Canonical text form: `0x` followed by 64 lowercase hex digits,
//!   big-endian. This is what `Display` and `Serialize` produce.
//! - Parsing also accepts decimal strings, the form proof tooling emits
//!   for public signals.
//! - Parsing is strict: values `>= modulus` are rejected. Reduction mod the
//!   prime only happens through [`FieldElement::from_be_bytes_mod_order`],
//!   which hash outputs use explicitly.

use std::str::FromStr;

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FieldError;
use crate::hex;

/// An element of the BN254 scalar field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FieldElement(Fr);

impl FieldElement {
    /// The additive identity. Also the empty-leaf value of every Merkle tree.
    pub fn zero() -> Self {
        Self(Fr::zero())
    }

    /// Embed a small integer.
    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    /// Interpret big-endian bytes as an integer and reduce it mod the prime.
    ///
    /// Used to map hash outputs into the field. Never use this for parsing
    /// externally supplied values; use [`FieldElement::from_canonical_bytes`].
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Decode a canonical 32-byte big-endian encoding.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NonCanonical`] if the encoded integer is not
    /// below the modulus.
    pub fn from_canonical_bytes(bytes: &[u8; 32]) -> Result<Self, FieldError> {
        let reduced = Self::from_be_bytes_mod_order(bytes);
        if &reduced.to_be_bytes() != bytes {
            return Err(FieldError::NonCanonical);
        }
        Ok(reduced)
    }

    /// The 32-byte big-endian encoding.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let raw = self.0.into_bigint().to_bytes_be();
        let mut out = [0u8; 32];
        // `to_bytes_be` yields exactly 32 bytes for a 4-limb integer; align
        // right anyway so the encoding stays correct if that ever changes.
        let start = 32usize.saturating_sub(raw.len());
        let skip = raw.len().saturating_sub(32);
        out[start..].copy_from_slice(&raw[skip..]);
        out
    }

    /// Canonical `0x`-prefixed hex rendering.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.to_be_bytes()))
    }

    /// The value as a `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        let bytes = self.to_be_bytes();
        if bytes[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&bytes[24..]);
        Some(u64::from_be_bytes(tail))
    }

    /// Whether this is the zero element.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Parse from `0x`-hex or decimal text.
    ///
    /// # Errors
    ///
    /// [`FieldError::InvalidEncoding`] for malformed text,
    /// [`FieldError::NonCanonical`] for values `>= modulus`.
    pub fn parse(s: &str) -> Result<Self, FieldError> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return Self::parse_hex_digits(digits);
        }
        Self::parse_decimal(s)
    }

    /// Access the underlying arkworks element.
    pub fn inner(&self) -> &Fr {
        &self.0
    }

    fn parse_hex_digits(digits: &str) -> Result<Self, FieldError> {
        if digits.is_empty() || digits.len() > 64 {
            return Err(FieldError::InvalidEncoding(format!(
                "hex field element must have 1..=64 digits, got {}",
                digits.len()
            )));
        }
        let padded = format!("{digits:0>64}");
        let bytes = hex::decode(&padded).map_err(FieldError::InvalidEncoding)?;
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Self::from_canonical_bytes(&arr)
    }

    fn parse_decimal(s: &str) -> Result<Self, FieldError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::InvalidEncoding(format!(
                "expected 0x-hex or decimal digits, got {s:?}"
            )));
        }
        // `Fr::from_str` reduces mod the prime; reject anything it changed.
        let fr = Fr::from_str(s).map_err(|()| FieldError::NonCanonical)?;
        let digits = s.trim_start_matches('0');
        let canonical = fr.into_bigint().to_string();
        if canonical.trim_start_matches('0') != digits {
            return Err(FieldError::NonCanonical);
        }
        Ok(Self(fr))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
