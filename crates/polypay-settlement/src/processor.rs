//! Payment settlement core.
//!
//! A settlement moves `gross` from the payer (drawn against their allowance)
//! to the merchant (`net`) and the fee collector (`fee`):
//! 1. Reject while paused
//! 2. Token must be on the allow-list
//! 3. Payment id must be new (globally and within the batch)
//! 4. Amount must be positive; the merchant non-zero and not deactivated
//! 5. Split the gross amount into fee and net
//! 6. Draw the gross amount from the payer
//! 7. Credit the merchant with the net amount
//! 8. Credit the fee collector with the fee
//! 9. Index the id, append the record, update merchant stats, emit events
//!
//! Steps 6–8 are staged in one [`LedgerTxn`]; a batch stages every member in
//! the same transaction. The transaction only commits once every request
//! has passed every step, so a failure anywhere leaves balances, allowances
//! and the idempotency index exactly as they were.

use std::collections::{HashMap, HashSet};

use polypay_ledger::{BalanceLedger, LedgerTxn, MerchantRegistry, TokenRegistry, fee_policy};
use polypay_types::{
    AccessState, Address, BasisPoints, BatchId, Clock, Emitted, FeeSplit, Merchant,
    MerchantDetails, MerchantProfile, MerchantStats, PaymentId, PaymentRequest, PolyPayError,
    ProcessorConfig, ProcessorEvent, Result, SettlementRecord, SystemClock, Token, TokenId,
};

use crate::access::AccessController;
use crate::idempotency::IdempotencyIndex;

/// Single-writer settlement engine.
///
/// All mutation goes through `&mut self`, which makes every operation
/// linearizable. Share across threads with
/// [`SharedProcessor`](crate::SharedProcessor).
pub struct PaymentProcessor {
    access: AccessController,
    registry: TokenRegistry,
    merchants: MerchantRegistry,
    ledger: BalanceLedger,
    index: IdempotencyIndex,
    /// Append-only settlement log; `index` points into it.
    records: Vec<SettlementRecord>,
    merchant_stats: HashMap<Address, MerchantStats>,
    /// Append-only log of every emitted event.
    events: Vec<ProcessorEvent>,
    max_batch_size: usize,
    allow_zero_amount: bool,
    require_registered_merchant: bool,
    clock: Box<dyn Clock>,
}

/// Read-only view of the state a settlement step is validated against.
struct Gate<'a> {
    registry: &'a TokenRegistry,
    merchants: &'a MerchantRegistry,
    index: &'a IdempotencyIndex,
    fee_rate: BasisPoints,
    fee_collector: Address,
    allow_zero_amount: bool,
    require_registered_merchant: bool,
}

impl Gate<'_> {
    /// Run steps 2–8 for one request, staging its ledger writes in `txn`.
    fn stage(
        &self,
        txn: &mut LedgerTxn<'_>,
        request: &PaymentRequest,
        accepted: &HashSet<PaymentId>,
    ) -> Result<FeeSplit> {
        if !self.registry.is_supported(&request.token) {
            return Err(PolyPayError::UnsupportedToken(request.token));
        }
        self.index.check(&request.payment_id)?;
        if accepted.contains(&request.payment_id) {
            return Err(PolyPayError::DuplicatePayment(request.payment_id));
        }
        if request.gross_amount == 0 && !self.allow_zero_amount {
            return Err(PolyPayError::InvalidAmount {
                reason: "amount must be greater than zero".into(),
            });
        }
        if request.merchant.is_zero() {
            return Err(PolyPayError::InvalidAddress {
                reason: "merchant cannot be the zero address".into(),
            });
        }
        match self.merchants.get(&request.merchant) {
            Ok(profile) if !profile.is_active => {
                return Err(PolyPayError::MerchantInactive(request.merchant));
            }
            Err(err) if self.require_registered_merchant => return Err(err),
            _ => {}
        }

        let split = fee_policy::split(request.gross_amount, self.fee_rate);
        txn.draw(request.payer, request.token, request.gross_amount)?;
        txn.credit(request.merchant, request.token, split.net)?;
        txn.credit(self.fee_collector, request.token, split.fee)?;
        Ok(split)
    }
}

impl PaymentProcessor {
    /// Build a processor from a validated config, registering its tokens.
    ///
    /// # Errors
    /// `Configuration` if the config is invalid.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let mut access = AccessController::new(config.owner, config.fee_collector)?;
        if config.fee_rate != access.fee_rate() {
            access.set_fee_rate(config.owner, u32::from(config.fee_rate))?;
        }

        let mut registry = TokenRegistry::new();
        let mut events = Vec::with_capacity(config.tokens.len());
        for token in &config.tokens {
            let token = token.to_token();
            events.push(ProcessorEvent::TokenRegistered {
                token: token.id,
                symbol: token.symbol.clone(),
                decimals: token.decimals,
            });
            registry.register(token)?;
        }

        tracing::info!(
            owner = %config.owner,
            fee_collector = %config.fee_collector,
            fee_rate = %access.fee_rate(),
            tokens = registry.len(),
            "payment processor initialised"
        );

        Ok(Self {
            access,
            registry,
            merchants: MerchantRegistry::new(),
            ledger: BalanceLedger::new(),
            index: IdempotencyIndex::new(),
            records: Vec::new(),
            merchant_stats: HashMap::new(),
            events,
            max_batch_size: config.max_batch_size,
            allow_zero_amount: config.allow_zero_amount,
            require_registered_merchant: config.require_registered_merchant,
            clock: Box::new(SystemClock),
        })
    }

    /// Replace the time source used to stamp settlement records.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    // -----------------------------------------------------------------
    // Funding (token side)
    // -----------------------------------------------------------------

    /// Credit `owner` with funds entering the ledger.
    pub fn deposit(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        self.ledger.deposit(owner, token, amount)
    }

    /// Remove funds from the ledger.
    pub fn withdraw(&mut self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        self.ledger.withdraw(owner, token, amount)
    }

    /// Authorise the processor to draw up to `amount` of `token` from `owner`.
    pub fn approve(&mut self, owner: Address, token: TokenId, amount: u128) {
        self.ledger.approve(owner, token, amount);
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Settle one payment.
    ///
    /// # Errors
    /// `Paused`, `UnsupportedToken`, `DuplicatePayment`, `InvalidAddress`,
    /// `InvalidAmount`, `InsufficientAllowance`, `InsufficientBalance` or
    /// `Overflow`. State is unchanged on error.
    pub fn process_payment(
        &mut self,
        request: &PaymentRequest,
    ) -> Result<Emitted<SettlementRecord>> {
        self.access.require_not_paused().inspect_err(|_| {
            tracing::warn!(payment_id = %request.payment_id, "payment rejected: paused");
        })?;

        let records = self
            .stage_all(std::slice::from_ref(request), None)
            .map_err(|(_, err)| {
                tracing::warn!(
                    payment_id = %request.payment_id,
                    merchant = %request.merchant,
                    token = %request.token,
                    gross = request.gross_amount,
                    error = %err,
                    "payment rejected"
                );
                err
            })?;

        let events = self.commit(&records);
        let [record]: [SettlementRecord; 1] = records.try_into().map_err(|_| {
            PolyPayError::Internal("single settlement did not yield one record".into())
        })?;

        tracing::info!(
            payment_id = %record.payment_id,
            merchant = %record.merchant,
            token = %record.token,
            gross = record.gross_amount,
            fee = record.fee,
            "payment settled"
        );
        Ok(Emitted::new(record, events))
    }

    /// Settle every request or none of them.
    ///
    /// Requests are applied in order against the state left by the earlier
    /// ones, so a payer's balance and allowance are consumed cumulatively and
    /// a payment id repeated inside the batch is a duplicate.
    ///
    /// # Errors
    /// `Paused`, `EmptyBatch`, `BatchTooLarge`, or `BatchRejected` naming the
    /// first failing request and its cause. State is unchanged on error.
    pub fn batch_process_payments(
        &mut self,
        requests: &[PaymentRequest],
    ) -> Result<Emitted<Vec<SettlementRecord>>> {
        self.access.require_not_paused()?;
        if requests.is_empty() {
            return Err(PolyPayError::EmptyBatch);
        }
        if requests.len() > self.max_batch_size {
            return Err(PolyPayError::BatchTooLarge {
                size: requests.len(),
                max: self.max_batch_size,
            });
        }

        let batch_id = BatchId::new();
        let records = self
            .stage_all(requests, Some(batch_id))
            .map_err(|(index, source)| {
                tracing::warn!(
                    %batch_id,
                    size = requests.len(),
                    ?index,
                    error = %source,
                    "batch rejected"
                );
                match index {
                    Some(index) => PolyPayError::BatchRejected {
                        index,
                        source: Box::new(source),
                    },
                    None => source,
                }
            })?;

        let mut events = self.commit(&records);
        let settled = ProcessorEvent::BatchSettled {
            batch_id,
            count: records.len(),
            timestamp: records[0].timestamp,
        };
        self.events.push(settled.clone());
        events.push(settled);

        tracing::info!(%batch_id, count = records.len(), "batch settled");
        Ok(Emitted::new(records, events))
    }

    /// Validate and stage every request in one ledger transaction, committing
    /// the ledger writes only if all of them pass. On failure returns the
    /// index of the failing request, or `None` if the commit itself failed.
    fn stage_all(
        &mut self,
        requests: &[PaymentRequest],
        batch_id: Option<BatchId>,
    ) -> std::result::Result<Vec<SettlementRecord>, (Option<usize>, PolyPayError)> {
        let gate = Gate {
            registry: &self.registry,
            merchants: &self.merchants,
            index: &self.index,
            fee_rate: self.access.fee_rate(),
            fee_collector: self.access.fee_collector(),
            allow_zero_amount: self.allow_zero_amount,
            require_registered_merchant: self.require_registered_merchant,
        };
        let timestamp = self.clock.now();
        let mut txn = self.ledger.begin();
        let mut accepted = HashSet::with_capacity(requests.len());
        let mut records = Vec::with_capacity(requests.len());

        for (i, request) in requests.iter().enumerate() {
            let split = gate
                .stage(&mut txn, request, &accepted)
                .map_err(|e| (Some(i), e))?;
            tracing::debug!(
                payment_id = %request.payment_id,
                fee = split.fee,
                net = split.net,
                "payment staged"
            );
            accepted.insert(request.payment_id);
            records.push(SettlementRecord {
                payment_id: request.payment_id,
                merchant: request.merchant,
                payer: request.payer,
                token: request.token,
                gross_amount: request.gross_amount,
                fee: split.fee,
                merchant_amount: split.net,
                timestamp,
                batch_id,
            });
        }

        txn.commit().map_err(|e| (None, e))?;
        Ok(records)
    }

    /// Index, append and announce records whose ledger writes are committed.
    fn commit(&mut self, records: &[SettlementRecord]) -> Vec<ProcessorEvent> {
        let mut events = Vec::with_capacity(records.len() + 1);
        for record in records {
            self.index.record(record.payment_id, self.records.len());
            self.merchant_stats
                .entry(record.merchant)
                .or_default()
                .record(record);
            self.records.push(record.clone());
            events.push(ProcessorEvent::payment_received(record));
        }
        self.events.extend(events.iter().cloned());
        events
    }

    // -----------------------------------------------------------------
    // Administration (owner only)
    // -----------------------------------------------------------------

    /// Stop all settlement until [`unpause`](Self::unpause).
    ///
    /// # Errors
    /// `NotOwner` unless `caller` is the owner.
    pub fn pause(&mut self, caller: Address) -> Result<Emitted<()>> {
        let event = self.access.pause(caller)?;
        Ok(self.emit(event))
    }

    pub fn unpause(&mut self, caller: Address) -> Result<Emitted<()>> {
        let event = self.access.unpause(caller)?;
        Ok(self.emit(event))
    }

    pub fn set_fee_collector(
        &mut self,
        caller: Address,
        new_collector: Address,
    ) -> Result<Emitted<()>> {
        let event = self.access.set_fee_collector(caller, new_collector)?;
        Ok(self.emit(event))
    }

    /// # Errors
    /// `NotOwner`, or `InvalidFeeRate` above 10 000 bps.
    pub fn set_fee_rate(&mut self, caller: Address, bps: u32) -> Result<Emitted<()>> {
        let event = self.access.set_fee_rate(caller, bps)?;
        Ok(self.emit(event))
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Emitted<()>> {
        let event = self.access.transfer_ownership(caller, new_owner)?;
        Ok(self.emit(event))
    }

    /// Add a token to the settlement allow-list.
    pub fn register_token(&mut self, caller: Address, token: Token) -> Result<Emitted<()>> {
        self.access.require_owner(caller)?;
        let event = ProcessorEvent::TokenRegistered {
            token: token.id,
            symbol: token.symbol.clone(),
            decimals: token.decimals,
        };
        let (id, decimals) = (token.id, token.decimals);
        self.registry.register(token)?;
        tracing::info!(token = %id, decimals, "token registered");
        Ok(self.emit(Some(event)))
    }

    /// Remove a token from the allow-list. Balances and past records in the
    /// token stay as they are; new payments in it fail `UnsupportedToken`.
    pub fn delist_token(&mut self, caller: Address, token: TokenId) -> Result<Emitted<Token>> {
        self.access.require_owner(caller)?;
        let removed = self.registry.delist(&token)?;
        tracing::info!(%token, symbol = %removed.symbol, "token delisted");
        let Emitted { events, .. } = self.emit(Some(ProcessorEvent::TokenDelisted { token }));
        Ok(Emitted::new(removed, events))
    }

    // -----------------------------------------------------------------
    // Merchants
    // -----------------------------------------------------------------

    /// Onboard `caller` as a merchant. Self-service; not owner-gated.
    ///
    /// # Errors
    /// `InvalidAddress`, `InvalidMerchant` or `MerchantAlreadyRegistered`.
    pub fn register_merchant(
        &mut self,
        caller: Address,
        details: MerchantDetails,
    ) -> Result<Emitted<MerchantProfile>> {
        let at = self.clock.now();
        let profile = self.merchants.register(caller, details, at)?.clone();
        tracing::info!(
            merchant = %caller,
            name = %profile.details.business_name,
            "merchant registered"
        );
        let Emitted { events, .. } = self.emit(Some(ProcessorEvent::MerchantRegistered {
            merchant: caller,
            business_name: profile.details.business_name.clone(),
        }));
        Ok(Emitted::new(profile, events))
    }

    /// Grant or revoke a merchant's verified badge.
    ///
    /// # Errors
    /// `NotOwner` or `UnknownMerchant`.
    pub fn set_merchant_verified(
        &mut self,
        caller: Address,
        merchant: Address,
        verified: bool,
    ) -> Result<Emitted<()>> {
        self.access.require_owner(caller)?;
        if !self.merchants.set_verified(&merchant, verified)? {
            return Ok(Emitted::silent(()));
        }
        tracing::info!(%merchant, verified, "merchant verification changed");
        Ok(self.emit(Some(ProcessorEvent::MerchantVerificationChanged {
            merchant,
            verified,
        })))
    }

    /// Stop settling payments to `merchant`. Their balance and history stay.
    ///
    /// # Errors
    /// `NotOwner` or `UnknownMerchant`.
    pub fn deactivate_merchant(
        &mut self,
        caller: Address,
        merchant: Address,
    ) -> Result<Emitted<()>> {
        self.set_merchant_active(caller, merchant, false)
    }

    /// # Errors
    /// `NotOwner` or `UnknownMerchant`.
    pub fn reactivate_merchant(
        &mut self,
        caller: Address,
        merchant: Address,
    ) -> Result<Emitted<()>> {
        self.set_merchant_active(caller, merchant, true)
    }

    fn set_merchant_active(
        &mut self,
        caller: Address,
        merchant: Address,
        active: bool,
    ) -> Result<Emitted<()>> {
        self.access.require_owner(caller)?;
        if !self.merchants.set_active(&merchant, active)? {
            return Ok(Emitted::silent(()));
        }
        tracing::info!(%merchant, active, "merchant status changed");
        Ok(self.emit(Some(ProcessorEvent::MerchantStatusChanged { merchant, active })))
    }

    fn emit(&mut self, event: Option<ProcessorEvent>) -> Emitted<()> {
        match event {
            Some(event) => {
                self.events.push(event.clone());
                Emitted::new((), vec![event])
            }
            None => Emitted::silent(()),
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    #[must_use]
    pub fn is_processed(&self, payment_id: &PaymentId) -> bool {
        self.index.is_settled(payment_id)
    }

    #[must_use]
    pub fn record(&self, payment_id: &PaymentId) -> Option<&SettlementRecord> {
        self.index
            .position(payment_id)
            .and_then(|pos| self.records.get(pos))
    }

    #[must_use]
    pub fn records(&self) -> &[SettlementRecord] {
        &self.records
    }

    pub fn records_for_merchant(
        &self,
        merchant: Address,
    ) -> impl Iterator<Item = &SettlementRecord> {
        self.records.iter().filter(move |r| r.merchant == merchant)
    }

    /// Totals for a merchant; empty if they were never paid.
    #[must_use]
    pub fn merchant_stats(&self, merchant: Address) -> MerchantStats {
        self.merchant_stats.get(&merchant).cloned().unwrap_or_default()
    }

    /// A registered merchant's profile with their settlement totals.
    ///
    /// # Errors
    /// `UnknownMerchant` if the wallet never registered.
    pub fn merchant(&self, wallet: Address) -> Result<Merchant> {
        let profile = self.merchants.get(&wallet)?.clone();
        Ok(Merchant {
            profile,
            stats: self.merchant_stats(wallet),
        })
    }

    pub fn merchants(&self) -> impl Iterator<Item = &MerchantProfile> {
        self.merchants.merchants()
    }

    #[must_use]
    pub fn balance_of(&self, owner: Address, token: TokenId) -> u128 {
        self.ledger.balance_of(owner, token)
    }

    #[must_use]
    pub fn allowance(&self, owner: Address, token: TokenId) -> u128 {
        self.ledger.allowance(owner, token)
    }

    /// Fee and merchant net a payment of `gross` would settle at right now.
    #[must_use]
    pub fn quote(&self, gross: u128) -> FeeSplit {
        fee_policy::split(gross, self.access.fee_rate())
    }

    /// Parse a display amount (`"50.50"`) in a registered token's units.
    pub fn parse_amount(&self, token: TokenId, input: &str) -> Result<u128> {
        self.registry.get(&token)?.parse_units(input)
    }

    pub fn token(&self, token: TokenId) -> Result<&Token> {
        self.registry.get(&token)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.registry.tokens()
    }

    #[must_use]
    pub fn is_supported(&self, token: TokenId) -> bool {
        self.registry.is_supported(&token)
    }

    #[must_use]
    pub fn access_state(&self) -> &AccessState {
        self.access.state()
    }

    #[must_use]
    pub fn events(&self) -> &[ProcessorEvent] {
        &self.events
    }

    /// Check supply conservation for `token`.
    pub fn verify_supply(&self, token: TokenId) -> Result<()> {
        self.ledger.verify_supply(token)
    }

    #[must_use]
    pub fn ledger(&self) -> &BalanceLedger {
        &self.ledger
    }
}
