//! Merchant identity: who is being paid, and whether the platform vouches
//! for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, MerchantStats, PolyPayError, Result, TokenId, constants};

/// What a merchant submits when onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantDetails {
    pub business_name: String,
    /// Tax registration number; may be empty.
    pub vat_number: String,
    /// Polygon ID decentralised identifier; may be empty.
    pub polygon_id_did: String,
}

impl MerchantDetails {
    #[must_use]
    pub fn new(
        business_name: impl Into<String>,
        vat_number: impl Into<String>,
        polygon_id_did: impl Into<String>,
    ) -> Self {
        Self {
            business_name: business_name.into(),
            vat_number: vat_number.into(),
            polygon_id_did: polygon_id_did.into(),
        }
    }

    /// # Errors
    /// `InvalidMerchant` if the business name is blank or any field exceeds
    /// [`constants::MAX_MERCHANT_FIELD_LEN`] bytes.
    pub fn validate(&self) -> Result<()> {
        if self.business_name.trim().is_empty() {
            return Err(PolyPayError::InvalidMerchant {
                reason: "business name cannot be empty".into(),
            });
        }
        for (field, value) in [
            ("business name", &self.business_name),
            ("VAT number", &self.vat_number),
            ("Polygon ID DID", &self.polygon_id_did),
        ] {
            if value.len() > constants::MAX_MERCHANT_FIELD_LEN {
                return Err(PolyPayError::InvalidMerchant {
                    reason: format!(
                        "{field} is {} bytes, max {}",
                        value.len(),
                        constants::MAX_MERCHANT_FIELD_LEN
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A registered merchant.
///
/// Registration is self-service; `is_verified` and `is_active` are only
/// changed by the platform owner. A deactivated merchant cannot receive
/// payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantProfile {
    pub wallet: Address,
    pub details: MerchantDetails,
    pub is_verified: bool,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
}

impl MerchantProfile {
    /// A fresh, unverified, active profile.
    #[must_use]
    pub fn new(wallet: Address, details: MerchantDetails, registered_at: DateTime<Utc>) -> Self {
        Self {
            wallet,
            details,
            is_verified: false,
            is_active: true,
            registered_at,
        }
    }
}

/// A merchant's profile together with their settlement totals, as shown on
/// the merchant dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchant {
    pub profile: MerchantProfile,
    pub stats: MerchantStats,
}

impl Merchant {
    #[must_use]
    pub fn total_transactions(&self) -> u64 {
        self.stats.transactions
    }

    /// Gross volume received in `token`.
    #[must_use]
    pub fn total_volume(&self, token: &TokenId) -> u128 {
        self.stats.volume_of(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_validation() {
        assert!(MerchantDetails::new("Acme Coffee", "IT01234567890", "").validate().is_ok());
        assert!(matches!(
            MerchantDetails::new("   ", "", "").validate(),
            Err(PolyPayError::InvalidMerchant { .. })
        ));
        let long = "x".repeat(constants::MAX_MERCHANT_FIELD_LEN + 1);
        assert!(MerchantDetails::new("Acme", long, "").validate().is_err());
    }

    #[test]
    fn new_profile_is_active_and_unverified() {
        let profile = MerchantProfile::new(
            Address::random(),
            MerchantDetails::new("Acme", "", "did:polygonid:polygon:mumbai:2qDx"),
            Utc::now(),
        );
        assert!(profile.is_active);
        assert!(!profile.is_verified);
    }
}
