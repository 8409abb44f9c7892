//! Fee rate and fee split types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PolyPayError, Result, constants};

/// A fee rate in basis points, guaranteed to lie in `0..=10000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct BasisPoints(u16);

impl BasisPoints {
    pub const ZERO: Self = Self(0);

    /// The platform default, 40 bps (0.4%).
    pub const PLATFORM_DEFAULT: Self = Self(constants::DEFAULT_FEE_RATE_BPS);

    pub const MAX: Self = Self(constants::MAX_FEE_RATE_BPS);

    /// Validate a raw basis-point value.
    ///
    /// # Errors
    /// Returns [`PolyPayError::InvalidFeeRate`] above 10000.
    pub fn new(bps: u32) -> Result<Self> {
        match u16::try_from(bps) {
            Ok(v) if v <= constants::MAX_FEE_RATE_BPS => Ok(Self(v)),
            _ => Err(PolyPayError::InvalidFeeRate(bps)),
        }
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl Default for BasisPoints {
    fn default() -> Self {
        Self::PLATFORM_DEFAULT
    }
}

impl TryFrom<u32> for BasisPoints {
    type Error = PolyPayError;

    fn try_from(bps: u32) -> Result<Self> {
        Self::new(bps)
    }
}

impl From<BasisPoints> for u32 {
    fn from(bps: BasisPoints) -> Self {
        u32::from(bps.0)
    }
}

impl fmt::Display for BasisPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.0)
    }
}

/// Result of splitting a gross amount into platform fee and merchant net.
///
/// `fee + net` always equals the gross amount it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub fee: u128,
    pub net: u128,
}

impl FeeSplit {
    /// The gross amount this split was computed from.
    #[must_use]
    pub fn gross(&self) -> u128 {
        self.fee + self.net
    }
}
