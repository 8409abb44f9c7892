//! Configuration types for a PolyPay processor deployment.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, BasisPoints, PolyPayError, Result, Token, constants};

/// Polygon network a deployment settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Mumbai,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "polygon-mainnet"),
            Self::Mumbai => write!(f, "polygon-mumbai"),
        }
    }
}

/// Bridged USDC on Polygon PoS.
pub const USDC_MAINNET: Address =
    Address::from_hex_const("0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174");
/// USDC on the Mumbai testnet.
pub const USDC_MUMBAI: Address =
    Address::from_hex_const("0x9999f7Fea5938fD3b1E26A12c3f2fb024e194f97");
/// USDT on Polygon PoS.
pub const USDT_MAINNET: Address =
    Address::from_hex_const("0xc2132D05D31c914a87C6611C10748AEb04B58e8F");
/// USDT on the Mumbai testnet.
pub const USDT_MUMBAI: Address =
    Address::from_hex_const("0xA02f6adc7926efeBBd59Fd43A84f4E0c0c91e832");

/// A token to register at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenConfig {
    /// USD Coin for the given network.
    #[must_use]
    pub fn usdc(network: Network) -> Self {
        Self {
            address: match network {
                Network::Mainnet => USDC_MAINNET,
                Network::Mumbai => USDC_MUMBAI,
            },
            symbol: "USDC".to_string(),
            decimals: constants::STABLECOIN_DECIMALS,
        }
    }

    /// Tether USD for the given network.
    #[must_use]
    pub fn usdt(network: Network) -> Self {
        Self {
            address: match network {
                Network::Mainnet => USDT_MAINNET,
                Network::Mumbai => USDT_MUMBAI,
            },
            symbol: "USDT".to_string(),
            decimals: constants::STABLECOIN_DECIMALS,
        }
    }

    #[must_use]
    pub fn to_token(&self) -> Token {
        Token::new(self.address, self.symbol.clone(), self.decimals)
    }
}

fn default_max_batch_size() -> usize {
    constants::DEFAULT_MAX_BATCH_SIZE
}

/// Configuration for a single processor instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Initial owner; the only account allowed to administer the processor.
    pub owner: Address,
    /// Receives the platform fee of every settlement.
    pub fee_collector: Address,
    /// Platform fee rate, 40 bps unless overridden.
    #[serde(default, rename = "fee_rate_bps")]
    pub fee_rate: BasisPoints,
    /// Tokens eligible for settlement at startup.
    #[serde(default)]
    pub tokens: Vec<TokenConfig>,
    /// Maximum number of requests accepted in one batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    /// Accept zero-amount payments (fee 0, net 0). Off by default.
    #[serde(default)]
    pub allow_zero_amount: bool,
    /// Only settle to wallets with an active merchant profile. Off by
    /// default; deactivated merchants are refused either way.
    #[serde(default)]
    pub require_registered_merchant: bool,
}

impl ProcessorConfig {
    /// A config with no tokens and default limits.
    #[must_use]
    pub fn new(owner: Address, fee_collector: Address) -> Self {
        Self {
            owner,
            fee_collector,
            fee_rate: BasisPoints::PLATFORM_DEFAULT,
            tokens: Vec::new(),
            max_batch_size: constants::DEFAULT_MAX_BATCH_SIZE,
            allow_zero_amount: false,
            require_registered_merchant: false,
        }
    }

    /// The reference deployment: USDC and USDT on the given network.
    #[must_use]
    pub fn polygon(network: Network, owner: Address, fee_collector: Address) -> Self {
        Self::new(owner, fee_collector)
            .with_token(TokenConfig::usdc(network))
            .with_token(TokenConfig::usdt(network))
    }

    #[must_use]
    pub fn with_token(mut self, token: TokenConfig) -> Self {
        self.tokens.push(token);
        self
    }

    /// Check the config is internally consistent.
    ///
    /// # Errors
    /// Returns [`PolyPayError::Configuration`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.owner.is_zero() {
            return Err(PolyPayError::Configuration("owner is the zero address".into()));
        }
        if self.fee_collector.is_zero() {
            return Err(PolyPayError::Configuration(
                "fee_collector is the zero address".into(),
            ));
        }
        if self.max_batch_size == 0 {
            return Err(PolyPayError::Configuration("max_batch_size must be > 0".into()));
        }
        for (i, token) in self.tokens.iter().enumerate() {
            token
                .to_token()
                .validate()
                .map_err(|e| PolyPayError::Configuration(format!("tokens[{i}]: {e}")))?;
            if self.tokens[..i].iter().any(|t| t.address == token.address) {
                return Err(PolyPayError::Configuration(format!(
                    "tokens[{i}]: {} listed twice",
                    token.address
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| PolyPayError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
