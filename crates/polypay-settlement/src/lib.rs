//! # polypay-settlement
//!
//! **Settlement plane**: takes payment requests and moves stablecoin from
//! payers to merchants, skimming the platform fee on the way.
//!
//! ## Architecture
//!
//! [`PaymentProcessor`] owns the ledger plane and, for each request:
//! 1. Rejects while paused ([`AccessController`])
//! 2. Checks the token allow-list
//! 3. Validates idempotency (no double-settlement, [`IdempotencyIndex`])
//! 4. Splits the gross amount into fee and merchant net
//! 5. Draws from the payer's allowance and credits merchant + fee collector
//! 6. Appends the settlement record and emits `PaymentReceived`
//!
//! Batches run the same pipeline over a shared ledger transaction and
//! either settle completely or leave no trace.
//!
//! ## Concurrency
//!
//! The processor itself is single-writer (`&mut self`).
//! [`SharedProcessor`] wraps it in `Arc<RwLock<_>>` for multi-threaded use.

pub mod access;
pub mod idempotency;
pub mod processor;
pub mod shared;

pub use access::AccessController;
pub use idempotency::IdempotencyIndex;
pub use processor::PaymentProcessor;
pub use shared::SharedProcessor;
