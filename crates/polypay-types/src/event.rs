//! Change notifications emitted by the processor.
//!
//! Events are returned synchronously alongside the value of the operation
//! that produced them (see [`Emitted`]) and appended to the processor's
//! event log, so observers see exactly what happened and in which order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Address, BasisPoints, BatchId, PaymentId, SettlementRecord, TokenId};

/// A notification about a settlement or an administrative change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProcessorEvent {
    /// A payment settled: merchant and fee collector were credited.
    PaymentReceived {
        payment_id: PaymentId,
        merchant: Address,
        payer: Address,
        token: TokenId,
        #[serde(with = "crate::amount")]
        gross_amount: u128,
        #[serde(with = "crate::amount")]
        fee: u128,
        timestamp: DateTime<Utc>,
    },
    /// A batch settled; follows the `PaymentReceived` event of each member.
    BatchSettled {
        batch_id: BatchId,
        count: usize,
        timestamp: DateTime<Utc>,
    },
    FeeCollectorUpdated {
        old: Address,
        new: Address,
    },
    FeeRateUpdated {
        old: BasisPoints,
        new: BasisPoints,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    Paused {
        account: Address,
    },
    Unpaused {
        account: Address,
    },
    TokenRegistered {
        token: TokenId,
        symbol: String,
        decimals: u8,
    },
    TokenDelisted {
        token: TokenId,
    },
    MerchantRegistered {
        merchant: Address,
        business_name: String,
    },
    /// The owner granted or revoked a merchant's verified badge.
    MerchantVerificationChanged {
        merchant: Address,
        verified: bool,
    },
    /// The owner deactivated or reactivated a merchant.
    MerchantStatusChanged {
        merchant: Address,
        active: bool,
    },
}

impl ProcessorEvent {
    #[must_use]
    pub fn payment_received(record: &SettlementRecord) -> Self {
        Self::PaymentReceived {
            payment_id: record.payment_id,
            merchant: record.merchant,
            payer: record.payer,
            token: record.token,
            gross_amount: record.gross_amount,
            fee: record.fee,
            timestamp: record.timestamp,
        }
    }
}

impl std::fmt::Display for ProcessorEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PaymentReceived { .. } => write!(f, "PAYMENT_RECEIVED"),
            Self::BatchSettled { .. } => write!(f, "BATCH_SETTLED"),
            Self::FeeCollectorUpdated { .. } => write!(f, "FEE_COLLECTOR_UPDATED"),
            Self::FeeRateUpdated { .. } => write!(f, "FEE_RATE_UPDATED"),
            Self::OwnershipTransferred { .. } => write!(f, "OWNERSHIP_TRANSFERRED"),
            Self::Paused { .. } => write!(f, "PAUSED"),
            Self::Unpaused { .. } => write!(f, "UNPAUSED"),
            Self::TokenRegistered { .. } => write!(f, "TOKEN_REGISTERED"),
            Self::TokenDelisted { .. } => write!(f, "TOKEN_DELISTED"),
            Self::MerchantRegistered { .. } => write!(f, "MERCHANT_REGISTERED"),
            Self::MerchantVerificationChanged { .. } => write!(f, "MERCHANT_VERIFICATION_CHANGED"),
            Self::MerchantStatusChanged { .. } => write!(f, "MERCHANT_STATUS_CHANGED"),
        }
    }
}

/// The value of an operation together with the events it emitted, in
/// emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted<T> {
    pub value: T,
    pub events: Vec<ProcessorEvent>,
}

impl<T> Emitted<T> {
    #[must_use]
    pub fn new(value: T, events: Vec<ProcessorEvent>) -> Self {
        Self { value, events }
    }

    /// A result that changed nothing observable.
    #[must_use]
    pub fn silent(value: T) -> Self {
        Self {
            value,
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }
}
