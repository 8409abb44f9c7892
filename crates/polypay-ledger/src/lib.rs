//! # polypay-ledger
//!
//! **Ledger plane**: the state the settlement core reads and moves.
//!
//! ## Components
//!
//! 1. **TokenRegistry**: allow-list of settlement tokens and their precision
//! 2. **fee_policy**: pure `gross → (fee, net)` split in basis points
//! 3. **BalanceLedger**: per-(owner, token) balances and allowances, with
//!    staged [`LedgerTxn`] transactions for all-or-nothing updates
//! 4. **SupplyConservation**: `Σ balances == Σ deposits - Σ withdrawals`
//! 5. **MerchantRegistry**: merchant profiles with verified / active flags
//!
//! ## Settlement Flow
//!
//! ```text
//! fee_policy::split() → ledger.begin() → txn.draw(payer)
//!     → txn.credit(merchant) → txn.credit(fee_collector) → txn.commit()?
//! ```

pub mod balance_ledger;
pub mod fee_policy;
pub mod merchant_registry;
pub mod supply_conservation;
pub mod token_registry;

pub use balance_ledger::{BalanceLedger, LedgerTxn};
pub use merchant_registry::MerchantRegistry;
pub use supply_conservation::SupplyConservation;
pub use token_registry::TokenRegistry;
