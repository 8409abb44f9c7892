//! # polypay-types
//!
//! Shared types, errors, and configuration for the **PolyPay** settlement core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`TokenId`], [`PaymentId`], [`BatchId`]
//! - **Token model**: [`Token`] with exact unit parsing / formatting
//! - **Payment model**: [`PaymentRequest`], [`SettlementRecord`], [`MerchantStats`]
//! - **Merchants**: [`MerchantDetails`], [`MerchantProfile`], [`Merchant`]
//! - **Fees**: [`BasisPoints`], [`FeeSplit`]
//! - **Access model**: [`AccessState`]
//! - **Events**: [`ProcessorEvent`], [`Emitted`]
//! - **Time**: [`Clock`], [`SystemClock`], [`FixedClock`]
//! - **Configuration**: [`ProcessorConfig`], [`TokenConfig`], [`Network`]
//! - **Errors**: [`PolyPayError`] with `PP_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod access;
pub mod amount;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod fee;
pub mod ids;
pub mod merchant;
pub mod payment;
pub mod token;

// Re-export all primary types at crate root for ergonomic imports:
//   use polypay_types::{Address, PaymentRequest, SettlementRecord, ...};

pub use access::*;
pub use clock::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use fee::*;
pub use ids::*;
pub use merchant::*;
pub use payment::*;
pub use token::*;

// Constants are accessed via `polypay_types::constants::FOO` and the amount
// codec via `polypay_types::amount` (not re-exported to avoid name collisions).
