//! Thread-safe handle over a [`PaymentProcessor`].
//!
//! Every mutating call takes the write lock for its whole duration, so
//! settlements, batches and admin changes are totally ordered and the
//! duplicate check and the index insert can never interleave with another
//! writer. Queries share the read lock.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use polypay_types::{
    AccessState, Address, Emitted, FeeSplit, Merchant, MerchantDetails, MerchantProfile,
    MerchantStats, PaymentId, PaymentRequest, PolyPayError, Result, SettlementRecord, TokenId,
};

use crate::PaymentProcessor;

/// Cloneable, `Send + Sync` handle; clones share one processor.
#[derive(Clone)]
pub struct SharedProcessor {
    inner: Arc<RwLock<PaymentProcessor>>,
}

impl SharedProcessor {
    #[must_use]
    pub fn new(processor: PaymentProcessor) -> Self {
        Self {
            inner: Arc::new(RwLock::new(processor)),
        }
    }

    /// Run `f` under the read lock.
    ///
    /// # Errors
    /// `Internal` if a writer panicked while holding the lock.
    pub fn read<T>(&self, f: impl FnOnce(&PaymentProcessor) -> T) -> Result<T> {
        let guard = self.read_guard()?;
        Ok(f(&*guard))
    }

    /// Run `f` under the write lock.
    ///
    /// # Errors
    /// `Internal` if a writer panicked while holding the lock, otherwise
    /// whatever `f` returns.
    pub fn write<T>(&self, f: impl FnOnce(&mut PaymentProcessor) -> Result<T>) -> Result<T> {
        let mut guard = self.write_guard()?;
        f(&mut *guard)
    }

    fn read_guard(&self) -> Result<RwLockReadGuard<'_, PaymentProcessor>> {
        self.inner
            .read()
            .map_err(|_| PolyPayError::Internal("processor lock poisoned".into()))
    }

    fn write_guard(&self) -> Result<RwLockWriteGuard<'_, PaymentProcessor>> {
        self.inner
            .write()
            .map_err(|_| PolyPayError::Internal("processor lock poisoned".into()))
    }

    pub fn process_payment(&self, request: &PaymentRequest) -> Result<Emitted<SettlementRecord>> {
        self.write(|p| p.process_payment(request))
    }

    pub fn batch_process_payments(
        &self,
        requests: &[PaymentRequest],
    ) -> Result<Emitted<Vec<SettlementRecord>>> {
        self.write(|p| p.batch_process_payments(requests))
    }

    pub fn deposit(&self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        self.write(|p| p.deposit(owner, token, amount))
    }

    pub fn approve(&self, owner: Address, token: TokenId, amount: u128) -> Result<()> {
        self.write(|p| {
            p.approve(owner, token, amount);
            Ok(())
        })
    }

    pub fn register_merchant(
        &self,
        caller: Address,
        details: MerchantDetails,
    ) -> Result<Emitted<MerchantProfile>> {
        self.write(|p| p.register_merchant(caller, details))
    }

    pub fn merchant(&self, wallet: Address) -> Result<Merchant> {
        self.read(|p| p.merchant(wallet))?
    }

    pub fn is_processed(&self, payment_id: &PaymentId) -> Result<bool> {
        self.read(|p| p.is_processed(payment_id))
    }

    pub fn record(&self, payment_id: &PaymentId) -> Result<Option<SettlementRecord>> {
        self.read(|p| p.record(payment_id).cloned())
    }

    pub fn balance_of(&self, owner: Address, token: TokenId) -> Result<u128> {
        self.read(|p| p.balance_of(owner, token))
    }

    pub fn merchant_stats(&self, merchant: Address) -> Result<MerchantStats> {
        self.read(|p| p.merchant_stats(merchant))
    }

    pub fn quote(&self, gross: u128) -> Result<FeeSplit> {
        self.read(|p| p.quote(gross))
    }

    pub fn access_state(&self) -> Result<AccessState> {
        self.read(|p| p.access_state().clone())
    }
}

impl From<PaymentProcessor> for SharedProcessor {
    fn from(processor: PaymentProcessor) -> Self {
        Self::new(processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polypay_types::{Network, ProcessorConfig, TokenConfig};
    use std::thread;

    fn shared() -> (SharedProcessor, Address, Address, TokenId) {
        let owner = Address::random();
        let collector = Address::random();
        let processor =
            PaymentProcessor::new(ProcessorConfig::polygon(Network::Mainnet, owner, collector))
                .unwrap();
        (
            SharedProcessor::new(processor),
            owner,
            collector,
            TokenConfig::usdc(Network::Mainnet).address,
        )
    }

    #[test]
    fn concurrent_duplicates_settle_once() {
        let (shared, _, collector, usdc) = shared();
        let payer = Address::random();
        let merchant = Address::random();
        shared.deposit(payer, usdc, 1_000_000_000).unwrap();
        shared.approve(payer, usdc, 1_000_000_000).unwrap();
        let request = PaymentRequest::new(
            payer,
            merchant,
            usdc,
            100_000_000,
            PaymentId::from_label("race"),
        );

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                let request = request.clone();
                thread::spawn(move || shared.process_payment(&request))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(PolyPayError::DuplicatePayment(_))))
            .count();
        assert_eq!((ok, dup), (1, 7));
        assert_eq!(shared.balance_of(merchant, usdc).unwrap(), 99_600_000);
        assert_eq!(shared.balance_of(collector, usdc).unwrap(), 400_000);
    }

    #[test]
    fn concurrent_distinct_payments_all_settle() {
        let (shared, _, collector, usdc) = shared();
        let merchant = Address::random();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let payer = Address::random();
                    shared.deposit(payer, usdc, 10_000)?;
                    shared.approve(payer, usdc, 10_000)?;
                    let id = PaymentId::from_label(&format!("order-{i}"));
                    shared.process_payment(&PaymentRequest::new(payer, merchant, usdc, 10_000, id))
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }

        let stats = shared.merchant_stats(merchant).unwrap();
        assert_eq!(stats.transactions, 16);
        assert_eq!(shared.balance_of(collector, usdc).unwrap(), 16 * 40);
        shared.read(|p| p.verify_supply(usdc)).unwrap().unwrap();
    }

    #[test]
    fn admin_through_write() {
        let (shared, owner, _, _) = shared();
        shared.write(|p| p.pause(owner)).unwrap();
        assert!(shared.access_state().unwrap().paused);
    }
}
