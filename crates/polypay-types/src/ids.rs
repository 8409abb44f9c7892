//! Identifiers used throughout PolyPay.
//!
//! Accounts and tokens are 20-byte addresses, payments are keyed by a
//! caller-chosen 32-byte id, and batches get a UUIDv7 so they sort by time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{PolyPayError, constants};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account or contract identity, displayed as `0x`-prefixed hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address(pub [u8; 20]);

/// Tokens are identified by their contract address.
pub type TokenId = Address;

impl Address {
    /// The all-zero address. Never a valid owner, merchant or fee collector.
    pub const ZERO: Self = Self([0u8; 20]);

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed 40-digit hex literal at compile time.
    ///
    /// Intended for `const` items, where a malformed literal fails the
    /// build. Parse untrusted input with [`str::parse`] (the [`FromStr`]
    /// impl) instead.
    ///
    /// # Panics
    /// Panics if `s` is not `0x` followed by exactly 40 hex digits. Only
    /// reachable when called outside a `const` context.
    #[must_use]
    pub const fn from_hex_const(s: &str) -> Self {
        let raw = s.as_bytes();
        assert!(
            raw.len() == 42 && raw[0] == b'0' && (raw[1] == b'x' || raw[1] == b'X'),
            "address literal must be 0x followed by 40 hex digits"
        );
        let mut out = [0u8; 20];
        let mut i = 0;
        while i < 20 {
            let hi = hex_nibble(raw[2 + i * 2]);
            let lo = hex_nibble(raw[3 + i * 2]);
            out[i] = (hi << 4) | lo;
            i += 1;
        }
        Self(out)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Shortened form for logs and receipts, e.g. `0x1234…5678`.
    #[must_use]
    pub fn short(&self) -> String {
        format!("0x{}…{}", hex::encode(&self.0[..2]), hex::encode(&self.0[18..]))
    }
}

const fn hex_nibble(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => panic!("invalid hex digit in address literal"),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = PolyPayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| PolyPayError::InvalidAddress {
                reason: format!("'{s}' is missing the 0x prefix"),
            })?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| PolyPayError::InvalidAddress {
            reason: format!("'{s}': {e}"),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// PaymentId
// ---------------------------------------------------------------------------

/// Caller-chosen 32-byte payment identifier. Never reused once settled.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct PaymentId(pub [u8; 32]);

impl PaymentId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a payment id from a human-readable label (invoice number,
    /// QR payload reference, ...).
    ///
    /// The same label always yields the same id, so resubmitting an invoice
    /// is caught by the idempotency index.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(constants::PAYMENT_ID_DOMAIN);
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentId(0x{})", self.short())
    }
}

impl FromStr for PaymentId {
    type Err = PolyPayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|e| {
            PolyPayError::Serialization(format!("invalid payment id '{s}': {e}"))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for PaymentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PaymentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// Identifier assigned to each settled batch. UUIDv7 for time ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BatchId(pub Uuid);

impl BatchId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// Random address for tests.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl PaymentId {
    /// Random payment id for tests.
    #[must_use]
    pub fn random() -> Self {
        Self(rand::random())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: Address = Address::from_hex_const("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

    #[test]
    fn const_and_runtime_parse_agree() {
        let parsed: Address = "0x2791bca1f2de4661ed88a30c99a7a9449aa84174".parse().unwrap();
        assert_eq!(parsed, USDC);
        assert_eq!(USDC.to_string(), "0x2791bca1f2de4661ed88a30c99a7a9449aa84174");
    }

    #[test]
    fn address_parse_rejects_garbage() {
        assert!("2791bca1f2de4661ed88a30c99a7a9449aa84174".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xzz91bca1f2de4661ed88a30c99a7a9449aa84174".parse::<Address>().is_err());
    }

    #[test]
    #[should_panic(expected = "address literal must be 0x followed by 40 hex digits")]
    fn hex_const_panics_on_bad_literal_at_runtime() {
        let literal = String::from("0x1234");
        let _ = Address::from_hex_const(&literal);
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!USDC.is_zero());
    }

    #[test]
    fn short_address() {
        assert_eq!(USDC.short(), "0x2791…4174");
    }

    #[test]
    fn payment_id_from_label_is_deterministic() {
        let a = PaymentId::from_label("payment-1");
        let b = PaymentId::from_label("payment-1");
        let c = PaymentId::from_label("payment-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(PaymentId::random(), PaymentId::random());
        assert_ne!(Address::random(), Address::random());
    }

    #[test]
    fn batch_id_ordering() {
        let a = BatchId::new();
        let b = BatchId::new();
        assert!(a < b);
    }

    #[test]
    fn serde_as_hex_strings() {
        let json = serde_json::to_string(&USDC).unwrap();
        assert_eq!(json, "\"0x2791bca1f2de4661ed88a30c99a7a9449aa84174\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, USDC);

        let pid = PaymentId::from_label("invoice-7");
        let json = serde_json::to_string(&pid).unwrap();
        let back: PaymentId = serde_json::from_str(&json).unwrap();
        assert_eq!(pid, back);
    }
}
