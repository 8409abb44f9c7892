//! Token metadata and exact conversion between display amounts and
//! smallest-unit integers.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PolyPayError, Result, TokenId, constants};

/// A settlement token: contract id plus decimal precision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    #[must_use]
    pub fn new(id: TokenId, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Check the metadata is usable for settlement.
    ///
    /// # Errors
    /// Returns [`PolyPayError::InvalidToken`] for a zero id, an empty symbol,
    /// or a precision above [`constants::MAX_TOKEN_DECIMALS`].
    pub fn validate(&self) -> Result<()> {
        if self.id.is_zero() {
            return Err(PolyPayError::InvalidToken {
                reason: "token id is the zero address".into(),
            });
        }
        if self.symbol.trim().is_empty() {
            return Err(PolyPayError::InvalidToken {
                reason: format!("token {} has an empty symbol", self.id),
            });
        }
        if self.decimals > constants::MAX_TOKEN_DECIMALS {
            return Err(PolyPayError::InvalidToken {
                reason: format!(
                    "{} has {} decimals, max {}",
                    self.symbol,
                    self.decimals,
                    constants::MAX_TOKEN_DECIMALS
                ),
            });
        }
        Ok(())
    }

    /// Smallest units per whole token (`10^decimals`).
    #[must_use]
    pub fn unit(&self) -> u128 {
        10u128.pow(u32::from(self.decimals))
    }

    /// Parse a human amount such as `"50.50"` into smallest units.
    ///
    /// Conversion is exact: inputs with more fractional digits than the
    /// token carries are rejected rather than truncated.
    ///
    /// # Errors
    /// [`PolyPayError::InvalidAmount`] for unparseable, negative or
    /// over-precise input; [`PolyPayError::Overflow`] past `u128`.
    pub fn parse_units(&self, input: &str) -> Result<u128> {
        let trimmed = input.trim();
        let value = Decimal::from_str(trimmed).map_err(|e| PolyPayError::InvalidAmount {
            reason: format!("'{trimmed}' is not a decimal amount: {e}"),
        })?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(PolyPayError::InvalidAmount {
                reason: format!("'{trimmed}' is negative"),
            });
        }

        let value = value.normalize();
        let decimals = u32::from(self.decimals);
        if value.scale() > decimals {
            return Err(PolyPayError::InvalidAmount {
                reason: format!(
                    "'{trimmed}' has more than {decimals} fractional digits for {}",
                    self.symbol
                ),
            });
        }

        value
            .mantissa()
            .unsigned_abs()
            .checked_mul(10u128.pow(decimals - value.scale()))
            .ok_or(PolyPayError::Overflow { operation: "parse_units" })
    }

    /// Exact decimal value of `amount` smallest units, trailing zeros trimmed.
    ///
    /// # Errors
    /// [`PolyPayError::Overflow`] when the amount exceeds the 96-bit
    /// mantissa of `rust_decimal`.
    pub fn format_units(&self, amount: u128) -> Result<Decimal> {
        let mantissa = i128::try_from(amount).map_err(|_| PolyPayError::Overflow {
            operation: "format_units",
        })?;
        Decimal::try_from_i128_with_scale(mantissa, u32::from(self.decimals))
            .map(|d| d.normalize())
            .map_err(|_| PolyPayError::Overflow { operation: "format_units" })
    }
}
