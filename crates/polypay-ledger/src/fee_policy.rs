//! Platform fee computation.
//!
//! `fee = floor(gross * rate / 10000)`, `net = gross - fee`.
//!
//! The product `gross * rate` does not fit in `u128` for large amounts, so
//! the gross is split into `q * 10000 + r` first:
//! ```text
//! floor(gross * rate / 10000) = q * rate + floor(r * rate / 10000)
//! ```
//! With `rate <= 10000`, `q * rate <= gross` and `r * rate < 10^8`, so no
//! intermediate can overflow.

use polypay_types::{BasisPoints, FeeSplit, constants};

/// Split a gross amount into platform fee and merchant net.
#[must_use]
pub fn split(gross: u128, rate: BasisPoints) -> FeeSplit {
    let denom = u128::from(constants::BPS_DENOMINATOR);
    let rate = u128::from(rate.get());
    let fee = (gross / denom) * rate + (gross % denom) * rate / denom;
    FeeSplit {
        fee,
        net: gross - fee,
    }
}
