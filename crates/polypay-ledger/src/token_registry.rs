//! Allow-list of tokens eligible for settlement.
//!
//! Delisting only removes a token from the eligible set. Balances held in it
//! and settlement records that reference it are left untouched, and the
//! token may be registered again later.

use std::collections::HashMap;

use polypay_types::{PolyPayError, Result, Token, TokenId};

/// Registered tokens, iterable in registration order.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: HashMap<TokenId, Token>,
    order: Vec<TokenId>,
}

impl TokenRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token to the allow-list.
    ///
    /// # Errors
    /// - `InvalidToken` if the metadata fails validation
    /// - `TokenAlreadyRegistered` if the id is already listed
    pub fn register(&mut self, token: Token) -> Result<()> {
        token.validate()?;
        if self.tokens.contains_key(&token.id) {
            return Err(PolyPayError::TokenAlreadyRegistered(token.id));
        }
        tracing::debug!(
            token = %token.id,
            symbol = %token.symbol,
            decimals = token.decimals,
            "token registered"
        );
        self.order.push(token.id);
        self.tokens.insert(token.id, token);
        Ok(())
    }

    /// Remove a token from the allow-list, returning its metadata.
    ///
    /// # Errors
    /// Returns `UnknownToken` if the token is not listed.
    pub fn delist(&mut self, id: &TokenId) -> Result<Token> {
        let token = self
            .tokens
            .remove(id)
            .ok_or(PolyPayError::UnknownToken(*id))?;
        self.order.retain(|t| t != id);
        tracing::debug!(token = %id, "token delisted");
        Ok(token)
    }

    #[must_use]
    pub fn is_supported(&self, id: &TokenId) -> bool {
        self.tokens.contains_key(id)
    }

    /// Look up a registered token.
    ///
    /// # Errors
    /// Returns `UnknownToken` if the token is not listed.
    pub fn get(&self, id: &TokenId) -> Result<&Token> {
        self.tokens.get(id).ok_or(PolyPayError::UnknownToken(*id))
    }

    /// Decimal precision of a registered token.
    ///
    /// # Errors
    /// Returns `UnknownToken` if the token is not listed.
    pub fn decimals_of(&self, id: &TokenId) -> Result<u8> {
        self.get(id).map(|t| t.decimals)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.order.iter().filter_map(|id| self.tokens.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
