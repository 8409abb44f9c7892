//! Authoritative per-(owner, token) balances and allowances.
//!
//! Balances are unsigned smallest-unit integers: they never go negative and
//! never wrap. Funds only enter and leave through [`BalanceLedger::deposit`]
//! and [`BalanceLedger::withdraw`], which feed [`SupplyConservation`].
//! Everything else (a settlement's debit and two credits, or a whole batch)
//! goes through a [`LedgerTxn`], which stages every write and applies them
//! together on [`LedgerTxn::commit`]. A transaction whose debits and credits
//! do not cancel out per token is refused at commit. Dropping a transaction
//! without committing discards it, so a failed step leaves no trace.

use std::collections::HashMap;

use polypay_types::{Address, PolyPayError, Result, TokenId};

use crate::supply_conservation::SupplyConservation;

type Key = (Address, TokenId);

/// Per-(owner, token) balances, payer allowances and supply totals.
#[derive(Debug, Default)]
pub struct BalanceLedger {
    balances: HashMap<Key, u128>,
    /// Amount each owner has authorised the processor to draw, per token.
    allowances: HashMap<Key, u128>,
    supply: SupplyConservation,
}

impl BalanceLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fund an account from outside the ledger (mint / bridge-in).
    ///
    /// # Errors
    /// `Overflow` if the balance or the token's total supply would wrap.
    pub fn deposit(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        let updated = self
            .balance_of(owner, token)
            .checked_add(amount)
            .ok_or(PolyPayError::Overflow { operation: "deposit" })?;
        self.supply.record_deposit(token, amount)?;
        self.balances.insert((owner, token), updated);
        Ok(())
    }

    /// Move funds out of the ledger.
    ///
    /// # Errors
    /// `InsufficientBalance` if the account holds less than `amount`.
    pub fn withdraw(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        let available = self.balance_of(owner, token);
        if available < amount {
            return Err(PolyPayError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.supply.record_withdrawal(token, amount)?;
        set_or_clear(&mut self.balances, (owner, token), available - amount);
        Ok(())
    }

    /// Set the amount `owner` authorises the processor to draw. Replaces any
    /// previous allowance.
    pub fn approve(&mut self, owner: Address, token: TokenId, amount: u128) {
        set_or_clear(&mut self.allowances, (owner, token), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: Address, token: TokenId) -> u128 {
        self.allowances.get(&(owner, token)).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, token: TokenId) -> u128 {
        self.balances.get(&(owner, token)).copied().unwrap_or(0)
    }

    /// Open a staged transaction over this ledger.
    pub fn begin(&mut self) -> LedgerTxn<'_> {
        LedgerTxn {
            ledger: self,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    /// Sum of every account's balance in `token`.
    #[must_use]
    pub fn total_supply(&self, token: TokenId) -> u128 {
        self.balances
            .iter()
            .filter(|((_, t), _)| *t == token)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }

    /// Check `Σ balances == Σ deposits - Σ withdrawals` for `token`.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if the two sides differ.
    pub fn verify_supply(&self, token: TokenId) -> Result<()> {
        self.supply.verify(&token, self.total_supply(token))
    }

    /// Check supply conservation for every token that was ever funded.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_tokens()
            .into_iter()
            .try_for_each(|token| self.verify_supply(token))
    }

    #[must_use]
    pub fn supply(&self) -> &SupplyConservation {
        &self.supply
    }
}

fn set_or_clear(map: &mut HashMap<Key, u128>, key: Key, amount: u128) {
    if amount == 0 {
        map.remove(&key);
    } else {
        map.insert(key, amount);
    }
}

/// A set of staged balance and allowance writes.
///
/// Reads go through the staged values, so later steps see the effect of
/// earlier ones. Nothing reaches the ledger until [`commit`](Self::commit).
#[must_use = "a ledger transaction does nothing unless committed"]
pub struct LedgerTxn<'a> {
    ledger: &'a mut BalanceLedger,
    balances: HashMap<Key, u128>,
    allowances: HashMap<Key, u128>,
}

impl LedgerTxn<'_> {
    #[must_use]
    pub fn balance_of(&self, owner: Address, token: TokenId) -> u128 {
        self.balances
            .get(&(owner, token))
            .copied()
            .unwrap_or_else(|| self.ledger.balance_of(owner, token))
    }

    #[must_use]
    pub fn allowance(&self, owner: Address, token: TokenId) -> u128 {
        self.allowances
            .get(&(owner, token))
            .copied()
            .unwrap_or_else(|| self.ledger.allowance(owner, token))
    }

    /// Stage a balance decrease.
    ///
    /// # Errors
    /// `InsufficientBalance` if the (staged) balance is below `amount`.
    pub fn debit(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        let available = self.balance_of(owner, token);
        if available < amount {
            return Err(PolyPayError::InsufficientBalance {
                needed: amount,
                available,
            });
        }
        self.balances.insert((owner, token), available - amount);
        Ok(())
    }

    /// Stage a balance increase.
    ///
    /// # Errors
    /// `Overflow` if the (staged) balance would wrap.
    pub fn credit(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        let updated = self
            .balance_of(owner, token)
            .checked_add(amount)
            .ok_or(PolyPayError::Overflow { operation: "credit" })?;
        self.balances.insert((owner, token), updated);
        Ok(())
    }

    /// Draw `amount` from a payer against their allowance, as a token
    /// `transferFrom` would: the allowance is checked first, then the
    /// balance, and both are reduced.
    ///
    /// # Errors
    /// `InsufficientAllowance` or `InsufficientBalance`; nothing is staged
    /// on failure.
    pub fn draw(&mut self, payer: Address, token: TokenId, amount: u128) -> Result<()> {
        let allowed = self.allowance(payer, token);
        if allowed < amount {
            return Err(PolyPayError::InsufficientAllowance {
                needed: amount,
                allowed,
            });
        }
        self.debit(payer, token, amount)?;
        self.allowances.insert((payer, token), allowed - amount);
        Ok(())
    }

    /// Number of distinct entries written so far.
    #[must_use]
    pub fn pending_writes(&self) -> usize {
        self.balances.len() + self.allowances.len()
    }

    /// Apply every staged write to the ledger.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` if the staged writes would change the total
    /// supply of any token; nothing is applied in that case.
    pub fn commit(self) -> Result<()> {
        self.check_balanced()?;
        let Self {
            ledger,
            balances,
            allowances,
        } = self;
        for (key, amount) in balances {
            set_or_clear(&mut ledger.balances, key, amount);
        }
        for (key, amount) in allowances {
            set_or_clear(&mut ledger.allowances, key, amount);
        }
        Ok(())
    }

    /// Per token, the staged balances must sum to what the same accounts
    /// hold now.
    fn check_balanced(&self) -> Result<()> {
        let mut totals: HashMap<TokenId, (Option<u128>, Option<u128>)> = HashMap::new();
        for (&(owner, token), &staged) in &self.balances {
            let (before, after) = totals.entry(token).or_insert((Some(0), Some(0)));
            let held = self.ledger.balance_of(owner, token);
            *before = before.and_then(|b| b.checked_add(held));
            *after = after.and_then(|a| a.checked_add(staged));
        }
        for (token, (before, after)) in totals {
            if before.is_none() || before != after {
                return Err(PolyPayError::SupplyInvariantViolation {
                    reason: format!(
                        "unbalanced transaction for {token}: \
                         accounts held {before:?}, staged {after:?}"
                    ),
                });
            }
        }
        Ok(())
    }
}
