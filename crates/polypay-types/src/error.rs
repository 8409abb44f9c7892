//! Error types for the PolyPay settlement core.
//!
//! All errors use the `PP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Access control errors
//! - 2xx: Token registry errors
//! - 3xx: Payment / batch errors
//! - 4xx: Ledger errors
//! - 5xx: Merchant registry errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, PaymentId, TokenId};

/// Central error enum for all PolyPay operations.
#[derive(Debug, Error)]
pub enum PolyPayError {
    // =================================================================
    // Access Control Errors (1xx)
    // =================================================================
    /// Settlement attempted while the processor is paused.
    #[error("PP_ERR_100: Settlement paused")]
    Paused,

    /// Administrative call by an account that is not the owner.
    #[error("PP_ERR_101: Caller {caller} is not the owner")]
    NotOwner { caller: Address },

    /// An address argument is malformed or the zero address.
    #[error("PP_ERR_102: Invalid address: {reason}")]
    InvalidAddress { reason: String },

    /// Fee rate outside `0..=10000` basis points.
    #[error("PP_ERR_103: Invalid fee rate: {0} bps exceeds 10000")]
    InvalidFeeRate(u32),

    // =================================================================
    // Token Registry Errors (2xx)
    // =================================================================
    /// The token is not eligible for settlement.
    #[error("PP_ERR_200: Token not supported: {0}")]
    UnsupportedToken(TokenId),

    /// Lookup of a token that was never registered.
    #[error("PP_ERR_201: Unknown token: {0}")]
    UnknownToken(TokenId),

    /// The token id is already in the registry.
    #[error("PP_ERR_202: Token already registered: {0}")]
    TokenAlreadyRegistered(TokenId),

    /// Token metadata failed validation.
    #[error("PP_ERR_203: Invalid token: {reason}")]
    InvalidToken { reason: String },

    // =================================================================
    // Payment / Batch Errors (3xx)
    // =================================================================
    /// The payment id was already settled, or repeats within a batch.
    #[error("PP_ERR_300: Payment already processed: {0}")]
    DuplicatePayment(PaymentId),

    /// Amount is zero, negative, unparseable or over-precise.
    #[error("PP_ERR_301: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A batch with no requests.
    #[error("PP_ERR_302: Empty batch")]
    EmptyBatch,

    /// A batch larger than the configured maximum.
    #[error("PP_ERR_303: Batch too large: {size} requests, max {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// One request of a batch failed; the whole batch was rejected.
    #[error("PP_ERR_304: Batch rejected at request {index}: {source}")]
    BatchRejected {
        index: usize,
        source: Box<PolyPayError>,
    },

    // =================================================================
    // Ledger Errors (4xx)
    // =================================================================
    /// The payer's balance does not cover the amount.
    #[error("PP_ERR_400: Insufficient balance: need {needed}, have {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    /// The payer has not authorised the processor to draw the amount.
    #[error("PP_ERR_401: Insufficient allowance: need {needed}, allowed {allowed}")]
    InsufficientAllowance { needed: u128, allowed: u128 },

    /// Arithmetic would leave the representable range.
    #[error("PP_ERR_402: Arithmetic overflow in {operation}")]
    Overflow { operation: &'static str },

    /// Supply conservation invariant violated. Critical integrity alert.
    #[error("PP_ERR_403: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // Merchant Registry Errors (5xx)
    // =================================================================
    /// The wallet already has a merchant profile.
    #[error("PP_ERR_500: Merchant already registered: {0}")]
    MerchantAlreadyRegistered(Address),

    /// Lookup of a wallet with no merchant profile.
    #[error("PP_ERR_501: Unknown merchant: {0}")]
    UnknownMerchant(Address),

    /// Merchant details failed validation.
    #[error("PP_ERR_502: Invalid merchant: {reason}")]
    InvalidMerchant { reason: String },

    /// Payment to a merchant the owner has deactivated.
    #[error("PP_ERR_503: Merchant inactive: {0}")]
    MerchantInactive(Address),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("PP_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("PP_ERR_903: I/O error: {0}")]
    Io(String),
}

impl PolyPayError {
    /// Whether the same request may succeed later without changing it.
    ///
    /// Pauses lift and payers can top up or re-approve. Everything else is
    /// permanent for the given input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Paused
            | Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. } => true,
            Self::BatchRejected { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// The innermost cause, looking through batch wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::BatchRejected { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PolyPayError>;

impl From<std::io::Error> for PolyPayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PolyPayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
