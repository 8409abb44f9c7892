//! System-wide constants for the PolyPay settlement core.

/// Basis points in 100%.
pub const BPS_DENOMINATOR: u16 = 10_000;

/// Default platform fee: 40 bps (0.4%) of the gross amount.
pub const DEFAULT_FEE_RATE_BPS: u16 = 40;

/// Highest fee rate the processor accepts (the whole gross amount).
pub const MAX_FEE_RATE_BPS: u16 = BPS_DENOMINATOR;

/// Decimal precision of the supported stablecoins (USDC, USDT).
pub const STABLECOIN_DECIMALS: u8 = 6;

/// Largest token precision the registry accepts. Matches the 28-digit
/// scale limit of `rust_decimal`, so every amount can be formatted exactly.
pub const MAX_TOKEN_DECIMALS: u8 = 28;

/// Default maximum number of requests in one batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 256;

/// Domain separator for label-derived payment ids.
pub const PAYMENT_ID_DOMAIN: &[u8] = b"polypay:payment_id:v1:";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "PolyPay";

/// Longest merchant business name, VAT number or DID accepted, in bytes.
pub const MAX_MERCHANT_FIELD_LEN: usize = 256;
