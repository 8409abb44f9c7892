//! Merchant profiles keyed by wallet.
//!
//! A wallet registers itself once. The registry never removes a profile:
//! deactivation only flips `is_active`, so the history of payments to that
//! wallet keeps pointing at a known merchant.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use polypay_types::{Address, MerchantDetails, MerchantProfile, PolyPayError, Result};

#[derive(Debug, Default)]
pub struct MerchantRegistry {
    merchants: HashMap<Address, MerchantProfile>,
    order: Vec<Address>,
}

impl MerchantRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a profile for `wallet`.
    ///
    /// # Errors
    /// - `InvalidAddress` for the zero wallet
    /// - `InvalidMerchant` if the details fail validation
    /// - `MerchantAlreadyRegistered` if the wallet has a profile
    pub fn register(
        &mut self,
        wallet: Address,
        details: MerchantDetails,
        at: DateTime<Utc>,
    ) -> Result<&MerchantProfile> {
        if wallet.is_zero() {
            return Err(PolyPayError::InvalidAddress {
                reason: "merchant wallet cannot be the zero address".into(),
            });
        }
        details.validate()?;
        if self.merchants.contains_key(&wallet) {
            return Err(PolyPayError::MerchantAlreadyRegistered(wallet));
        }
        tracing::debug!(merchant = %wallet, name = %details.business_name, "merchant registered");
        self.order.push(wallet);
        Ok(self
            .merchants
            .entry(wallet)
            .or_insert(MerchantProfile::new(wallet, details, at)))
    }

    /// # Errors
    /// `UnknownMerchant` if the wallet has no profile.
    pub fn get(&self, wallet: &Address) -> Result<&MerchantProfile> {
        self.merchants
            .get(wallet)
            .ok_or(PolyPayError::UnknownMerchant(*wallet))
    }

    #[must_use]
    pub fn is_registered(&self, wallet: &Address) -> bool {
        self.merchants.contains_key(wallet)
    }

    /// Set the verified flag. Returns whether it changed.
    ///
    /// # Errors
    /// `UnknownMerchant` if the wallet has no profile.
    pub fn set_verified(&mut self, wallet: &Address, verified: bool) -> Result<bool> {
        let profile = self.get_mut(wallet)?;
        let changed = profile.is_verified != verified;
        profile.is_verified = verified;
        Ok(changed)
    }

    /// Set the active flag. Returns whether it changed.
    ///
    /// # Errors
    /// `UnknownMerchant` if the wallet has no profile.
    pub fn set_active(&mut self, wallet: &Address, active: bool) -> Result<bool> {
        let profile = self.get_mut(wallet)?;
        let changed = profile.is_active != active;
        profile.is_active = active;
        Ok(changed)
    }

    fn get_mut(&mut self, wallet: &Address) -> Result<&mut MerchantProfile> {
        self.merchants
            .get_mut(wallet)
            .ok_or(PolyPayError::UnknownMerchant(*wallet))
    }

    /// Profiles in registration order.
    pub fn merchants(&self) -> impl Iterator<Item = &MerchantProfile> {
        self.order.iter().filter_map(|w| self.merchants.get(w))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.merchants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.merchants.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme() -> MerchantDetails {
        MerchantDetails::new("Acme Coffee", "IT01234567890", "did:polygonid:polygon:main:2q")
    }

    #[test]
    fn register_and_get() {
        let mut reg = MerchantRegistry::new();
        let wallet = Address::random();
        let at = Utc::now();
        let profile = reg.register(wallet, acme(), at).unwrap();
        assert_eq!(profile.wallet, wallet);
        assert_eq!(profile.registered_at, at);
        assert!(profile.is_active && !profile.is_verified);

        assert_eq!(reg.get(&wallet).unwrap().details.business_name, "Acme Coffee");
        assert!(reg.is_registered(&wallet));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn registration_is_once_per_wallet() {
        let mut reg = MerchantRegistry::new();
        let wallet = Address::random();
        reg.register(wallet, acme(), Utc::now()).unwrap();
        let err = reg
            .register(wallet, MerchantDetails::new("Other", "", ""), Utc::now())
            .unwrap_err();
        assert!(matches!(err, PolyPayError::MerchantAlreadyRegistered(w) if w == wallet));
        assert_eq!(reg.get(&wallet).unwrap().details, acme());
    }

    #[test]
    fn invalid_registrations() {
        let mut reg = MerchantRegistry::new();
        assert!(matches!(
            reg.register(Address::ZERO, acme(), Utc::now()),
            Err(PolyPayError::InvalidAddress { .. })
        ));
        assert!(matches!(
            reg.register(Address::random(), MerchantDetails::new("", "", ""), Utc::now()),
            Err(PolyPayError::InvalidMerchant { .. })
        ));
        assert!(reg.is_empty());
    }

    #[test]
    fn flags_report_changes() {
        let mut reg = MerchantRegistry::new();
        let wallet = Address::random();
        reg.register(wallet, acme(), Utc::now()).unwrap();

        assert!(reg.set_verified(&wallet, true).unwrap());
        assert!(!reg.set_verified(&wallet, true).unwrap());
        assert!(reg.set_active(&wallet, false).unwrap());
        assert!(!reg.get(&wallet).unwrap().is_active);
        assert!(reg.set_active(&wallet, true).unwrap());

        let stranger = Address::random();
        assert!(matches!(
            reg.set_active(&stranger, false),
            Err(PolyPayError::UnknownMerchant(_))
        ));
    }

    #[test]
    fn iteration_in_registration_order() {
        let mut reg = MerchantRegistry::new();
        let wallets: Vec<Address> = (0..5).map(|_| Address::random()).collect();
        for w in &wallets {
            reg.register(*w, acme(), Utc::now()).unwrap();
        }
        let seen: Vec<Address> = reg.merchants().map(|p| p.wallet).collect();
        assert_eq!(seen, wallets);
    }
}
