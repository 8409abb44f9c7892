//! Payment requests, settlement records and per-merchant aggregates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, BatchId, PaymentId, TokenId};

/// A payment instruction submitted by the payer.
///
/// The payer must have approved the processor for at least `gross_amount`
/// of `token` before submitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub payer: Address,
    pub merchant: Address,
    pub token: TokenId,
    /// Amount in the token's smallest unit, fee included.
    pub gross_amount: u128,
    pub payment_id: PaymentId,
}

impl PaymentRequest {
    #[must_use]
    pub fn new(
        payer: Address,
        merchant: Address,
        token: TokenId,
        gross_amount: u128,
        payment_id: PaymentId,
    ) -> Self {
        Self {
            payer,
            merchant,
            token,
            gross_amount,
            payment_id,
        }
    }
}

/// Proof that a payment was settled. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRecord {
    pub payment_id: PaymentId,
    pub merchant: Address,
    pub payer: Address,
    pub token: TokenId,
    pub gross_amount: u128,
    /// Platform fee routed to the fee collector.
    pub fee: u128,
    /// Net amount credited to the merchant (`gross_amount - fee`).
    pub merchant_amount: u128,
    pub timestamp: DateTime<Utc>,
    /// Set when the payment was settled as part of a batch.
    pub batch_id: Option<BatchId>,
}

/// Running totals for one merchant, updated on every settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantStats {
    pub transactions: u64,
    /// Gross volume received, per token.
    pub volume: BTreeMap<TokenId, u128>,
    /// Platform fees paid out of that volume, per token.
    pub fees: BTreeMap<TokenId, u128>,
    pub last_payment_at: Option<DateTime<Utc>>,
}

impl MerchantStats {
    /// Fold a settlement into the totals.
    ///
    /// These are reporting counters and saturate instead of failing.
    pub fn record(&mut self, record: &SettlementRecord) {
        self.transactions = self.transactions.saturating_add(1);
        let volume = self.volume.entry(record.token).or_insert(0);
        *volume = volume.saturating_add(record.gross_amount);
        let fees = self.fees.entry(record.token).or_insert(0);
        *fees = fees.saturating_add(record.fee);
        self.last_payment_at = Some(
            self.last_payment_at
                .map_or(record.timestamp, |t| t.max(record.timestamp)),
        );
    }

    #[must_use]
    pub fn volume_of(&self, token: &TokenId) -> u128 {
        self.volume.get(token).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn fees_of(&self, token: &TokenId) -> u128 {
        self.fees.get(token).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(token: TokenId, gross: u128, fee: u128) -> SettlementRecord {
        SettlementRecord {
            payment_id: PaymentId::random(),
            merchant: Address::random(),
            payer: Address::random(),
            token,
            gross_amount: gross,
            fee,
            merchant_amount: gross - fee,
            timestamp: Utc::now(),
            batch_id: None,
        }
    }

    #[test]
    fn stats_accumulate_per_token() {
        let usdc = Address::random();
        let usdt = Address::random();
        let mut stats = MerchantStats::default();
        stats.record(&record(usdc, 100_000_000, 400_000));
        stats.record(&record(usdc, 50_000_000, 200_000));
        stats.record(&record(usdt, 10_000_000, 40_000));

        assert_eq!(stats.transactions, 3);
        assert_eq!(stats.volume_of(&usdc), 150_000_000);
        assert_eq!(stats.fees_of(&usdc), 600_000);
        assert_eq!(stats.volume_of(&usdt), 10_000_000);
        assert_eq!(stats.volume_of(&Address::random()), 0);
        assert!(stats.last_payment_at.is_some());
    }

    #[test]
    fn record_serde_roundtrip() {
        let rec = record(Address::random(), 1_000, 4);
        let json = serde_json::to_string(&rec).unwrap();
        let back: SettlementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(rec, back);
    }
}
