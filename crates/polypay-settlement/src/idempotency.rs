//! Settlement idempotency index: prevents double-settlement.
//!
//! Each payment id settles at most once over the lifetime of the processor.
//! The index maps every settled id to the position of its record in the
//! append-only record log, so membership and record lookup are both O(1).
//! Entries are never evicted.

use std::collections::HashMap;

use polypay_types::{PaymentId, PolyPayError, Result};

/// The set of payment ids that have produced a settlement record.
#[derive(Debug, Default)]
pub struct IdempotencyIndex {
    settled: HashMap<PaymentId, usize>,
}

impl IdempotencyIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if `payment_id` was already settled.
    ///
    /// # Errors
    /// Returns [`PolyPayError::DuplicatePayment`].
    pub fn check(&self, payment_id: &PaymentId) -> Result<()> {
        if self.settled.contains_key(payment_id) {
            return Err(PolyPayError::DuplicatePayment(*payment_id));
        }
        Ok(())
    }

    /// Index a settled payment at `position` in the record log.
    ///
    /// Callers must have passed [`check`](Self::check) for this id under the
    /// same exclusive borrow.
    pub(crate) fn record(&mut self, payment_id: PaymentId, position: usize) {
        let previous = self.settled.insert(payment_id, position);
        debug_assert!(previous.is_none(), "payment {payment_id} indexed twice");
    }

    #[must_use]
    pub fn is_settled(&self, payment_id: &PaymentId) -> bool {
        self.settled.contains_key(payment_id)
    }

    /// Position of the payment's record in the record log.
    #[must_use]
    pub fn position(&self, payment_id: &PaymentId) -> Option<usize> {
        self.settled.get(payment_id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.settled.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.settled.is_empty()
    }
}
