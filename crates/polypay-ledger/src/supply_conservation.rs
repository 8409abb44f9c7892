//! Supply conservation invariant checker.
//!
//! Mathematical invariant enforced by the ledger:
//! ```text
//! ∀ token: Σ(balances) == Σ(deposits) - Σ(withdrawals)
//! ```
//!
//! Settlement only moves funds between accounts, so it never changes the
//! right-hand side. If the two sides ever disagree, money was created or
//! destroyed and the ledger must not be trusted.

use std::collections::{HashMap, HashSet};

use polypay_types::{PolyPayError, Result, TokenId};

/// Tracks per-token funding totals since genesis.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    deposits: HashMap<TokenId, u128>,
    withdrawals: HashMap<TokenId, u128>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record funds entering the ledger.
    ///
    /// # Errors
    /// [`PolyPayError::Overflow`] if the running total would wrap; nothing
    /// is recorded in that case.
    pub fn record_deposit(&mut self, token: TokenId, amount: u128) -> Result<()> {
        let total = self.deposits.entry(token).or_insert(0);
        *total = total
            .checked_add(amount)
            .ok_or(PolyPayError::Overflow { operation: "record_deposit" })?;
        Ok(())
    }

    /// Record funds leaving the ledger.
    ///
    /// # Errors
    /// [`PolyPayError::SupplyInvariantViolation`] if more would leave than
    /// ever entered.
    pub fn record_withdrawal(&mut self, token: TokenId, amount: u128) -> Result<()> {
        let headroom = self.expected_supply(&token);
        if amount > headroom {
            return Err(PolyPayError::SupplyInvariantViolation {
                reason: format!(
                    "token {token}: withdrawal {amount} exceeds outstanding supply {headroom}"
                ),
            });
        }
        *self.withdrawals.entry(token).or_insert(0) += amount;
        Ok(())
    }

    /// Expected total supply for a token: deposits - withdrawals.
    #[must_use]
    pub fn expected_supply(&self, token: &TokenId) -> u128 {
        self.total_deposits(token) - self.total_withdrawals(token)
    }

    /// Verify the actual supply (sum of all balances) against the expected
    /// supply for a token.
    ///
    /// # Errors
    /// Returns [`PolyPayError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, token: &TokenId, actual_supply: u128) -> Result<()> {
        let expected = self.expected_supply(token);
        if actual_supply != expected {
            return Err(PolyPayError::SupplyInvariantViolation {
                reason: format!(
                    "token {token}: actual supply {actual_supply} != expected {expected} \
                     (deposits={}, withdrawals={})",
                    self.total_deposits(token),
                    self.total_withdrawals(token),
                ),
            });
        }
        Ok(())
    }

    /// All tokens that ever saw a deposit or withdrawal.
    #[must_use]
    pub fn tracked_tokens(&self) -> Vec<TokenId> {
        let mut tokens: HashSet<TokenId> = self.deposits.keys().copied().collect();
        tokens.extend(self.withdrawals.keys().copied());
        let mut tokens: Vec<TokenId> = tokens.into_iter().collect();
        tokens.sort();
        tokens
    }

    #[must_use]
    pub fn total_deposits(&self, token: &TokenId) -> u128 {
        self.deposits.get(token).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_withdrawals(&self, token: &TokenId) -> u128 {
        self.withdrawals.get(token).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polypay_types::Address;

    #[test]
    fn empty_supply_is_zero() {
        let sc = SupplyConservation::new();
        let usdc = Address::random();
        assert_eq!(sc.expected_supply(&usdc), 0);
        assert!(sc.verify(&usdc, 0).is_ok());
    }

    #[test]
    fn deposits_and_withdrawals() {
        let mut sc = SupplyConservation::new();
        let usdc = Address::random();
        sc.record_deposit(usdc, 1_000).unwrap();
        sc.record_deposit(usdc, 500).unwrap();
        sc.record_withdrawal(usdc, 300).unwrap();
        assert_eq!(sc.expected_supply(&usdc), 1_200);
        assert!(sc.verify(&usdc, 1_200).is_ok());
    }

    #[test]
    fn verify_fails_when_imbalanced() {
        let mut sc = SupplyConservation::new();
        let usdc = Address::random();
        sc.record_deposit(usdc, 10).unwrap();
        let err = sc.verify(&usdc, 11).unwrap_err();
        assert!(matches!(err, PolyPayError::SupplyInvariantViolation { .. }));
    }

    #[test]
    fn overdrawn_withdrawal_rejected() {
        let mut sc = SupplyConservation::new();
        let usdc = Address::random();
        sc.record_deposit(usdc, 10).unwrap();
        assert!(sc.record_withdrawal(usdc, 11).is_err());
        assert_eq!(sc.total_withdrawals(&usdc), 0);
    }

    #[test]
    fn deposit_overflow_leaves_total_unchanged() {
        let mut sc = SupplyConservation::new();
        let usdc = Address::random();
        sc.record_deposit(usdc, u128::MAX).unwrap();
        let err = sc.record_deposit(usdc, 1).unwrap_err();
        assert!(matches!(err, PolyPayError::Overflow { .. }));
        assert_eq!(sc.total_deposits(&usdc), u128::MAX);
    }

    #[test]
    fn tokens_independent() {
        let mut sc = SupplyConservation::new();
        let usdc = Address::random();
        let usdt = Address::random();
        sc.record_deposit(usdc, 5).unwrap();
        sc.record_deposit(usdt, 50_000).unwrap();
        assert_eq!(sc.expected_supply(&usdc), 5);
        assert_eq!(sc.expected_supply(&usdt), 50_000);
        assert_eq!(sc.tracked_tokens().len(), 2);
    }
}
