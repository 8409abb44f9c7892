//! Owner gate, pause switch and fee routing.
//!
//! Every mutator checks the caller first, then its argument. Redundant calls
//! (pausing while paused, setting the current collector again, ...) succeed
//! without emitting an event.

use polypay_types::{AccessState, Address, BasisPoints, PolyPayError, ProcessorEvent, Result};

/// Holds the [`AccessState`] of a processor and funnels all changes to it
/// through owner-gated setters.
#[derive(Debug, Clone)]
pub struct AccessController {
    state: AccessState,
}

impl AccessController {
    /// Controller for `owner`, routing fees to `fee_collector` at the
    /// platform default rate.
    ///
    /// # Errors
    /// `InvalidAddress` if either address is zero.
    pub fn new(owner: Address, fee_collector: Address) -> Result<Self> {
        Self::from_state(AccessState::new(owner, fee_collector))
    }

    /// Restore a controller from a saved state.
    ///
    /// # Errors
    /// `InvalidAddress` if the owner or fee collector is zero.
    pub fn from_state(state: AccessState) -> Result<Self> {
        non_zero(state.owner, "owner")?;
        non_zero(state.fee_collector, "fee collector")?;
        Ok(Self { state })
    }

    #[must_use]
    pub fn state(&self) -> &AccessState {
        &self.state
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.state.owner
    }

    #[must_use]
    pub fn fee_collector(&self) -> Address {
        self.state.fee_collector
    }

    #[must_use]
    pub fn fee_rate(&self) -> BasisPoints {
        self.state.fee_rate
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// # Errors
    /// `Paused` while the processor is paused.
    pub fn require_not_paused(&self) -> Result<()> {
        if self.state.paused {
            Err(PolyPayError::Paused)
        } else {
            Ok(())
        }
    }

    /// # Errors
    /// `NotOwner` unless `caller` is the owner.
    pub fn require_owner(&self, caller: Address) -> Result<()> {
        if caller == self.state.owner {
            Ok(())
        } else {
            Err(PolyPayError::NotOwner { caller })
        }
    }

    pub fn pause(&mut self, caller: Address) -> Result<Option<ProcessorEvent>> {
        self.require_owner(caller)?;
        if self.state.paused {
            return Ok(None);
        }
        self.state.paused = true;
        tracing::info!(by = %caller, "processor paused");
        Ok(Some(ProcessorEvent::Paused { account: caller }))
    }

    pub fn unpause(&mut self, caller: Address) -> Result<Option<ProcessorEvent>> {
        self.require_owner(caller)?;
        if !self.state.paused {
            return Ok(None);
        }
        self.state.paused = false;
        tracing::info!(by = %caller, "processor unpaused");
        Ok(Some(ProcessorEvent::Unpaused { account: caller }))
    }

    pub fn set_fee_collector(
        &mut self,
        caller: Address,
        new_collector: Address,
    ) -> Result<Option<ProcessorEvent>> {
        self.require_owner(caller)?;
        non_zero(new_collector, "fee collector")?;
        let old = self.state.fee_collector;
        if old == new_collector {
            return Ok(None);
        }
        self.state.fee_collector = new_collector;
        tracing::info!(%old, new = %new_collector, "fee collector updated");
        Ok(Some(ProcessorEvent::FeeCollectorUpdated {
            old,
            new: new_collector,
        }))
    }

    /// Change the platform fee. Takes the raw basis-point value so an
    /// out-of-range request is reported as `InvalidFeeRate`.
    pub fn set_fee_rate(&mut self, caller: Address, bps: u32) -> Result<Option<ProcessorEvent>> {
        self.require_owner(caller)?;
        let new = BasisPoints::new(bps)?;
        let old = self.state.fee_rate;
        if old == new {
            return Ok(None);
        }
        self.state.fee_rate = new;
        tracing::info!(%old, %new, "fee rate updated");
        Ok(Some(ProcessorEvent::FeeRateUpdated { old, new }))
    }

    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        new_owner: Address,
    ) -> Result<Option<ProcessorEvent>> {
        self.require_owner(caller)?;
        non_zero(new_owner, "new owner")?;
        if new_owner == caller {
            return Ok(None);
        }
        self.state.owner = new_owner;
        tracing::info!(previous = %caller, new = %new_owner, "ownership transferred");
        Ok(Some(ProcessorEvent::OwnershipTransferred {
            previous_owner: caller,
            new_owner,
        }))
    }
}

fn non_zero(address: Address, role: &str) -> Result<()> {
    if address.is_zero() {
        return Err(PolyPayError::InvalidAddress {
            reason: format!("{role} cannot be the zero address"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> (AccessController, Address, Address) {
        let owner = Address::random();
        let collector = Address::random();
        (AccessController::new(owner, collector).unwrap(), owner, collector)
    }

    #[test]
    fn zero_addresses_rejected_at_construction() {
        assert!(AccessController::new(Address::ZERO, Address::random()).is_err());
        assert!(AccessController::new(Address::random(), Address::ZERO).is_err());
    }

    #[test]
    fn pause_and_unpause() {
        let (mut ac, owner, _) = controller();
        assert!(ac.require_not_paused().is_ok());

        let ev = ac.pause(owner).unwrap();
        assert_eq!(ev, Some(ProcessorEvent::Paused { account: owner }));
        assert!(matches!(ac.require_not_paused(), Err(PolyPayError::Paused)));

        // Redundant pause is a silent success.
        assert_eq!(ac.pause(owner).unwrap(), None);
        assert!(ac.is_paused());

        let ev = ac.unpause(owner).unwrap();
        assert_eq!(ev, Some(ProcessorEvent::Unpaused { account: owner }));
        assert_eq!(ac.unpause(owner).unwrap(), None);
        assert!(ac.require_not_paused().is_ok());
    }

    #[test]
    fn non_owner_cannot_administer() {
        let (mut ac, _, collector) = controller();
        let stranger = Address::random();
        let before = ac.state().clone();

        assert!(matches!(
            ac.pause(stranger),
            Err(PolyPayError::NotOwner { caller }) if caller == stranger
        ));
        assert!(matches!(ac.unpause(stranger), Err(PolyPayError::NotOwner { .. })));
        assert!(matches!(
            ac.set_fee_collector(stranger, stranger),
            Err(PolyPayError::NotOwner { .. })
        ));
        assert!(matches!(ac.set_fee_rate(stranger, 10), Err(PolyPayError::NotOwner { .. })));
        assert!(matches!(
            ac.transfer_ownership(stranger, stranger),
            Err(PolyPayError::NotOwner { .. })
        ));

        assert_eq!(ac.state(), &before);
        assert_eq!(ac.fee_collector(), collector);
    }

    #[test]
    fn fee_collector_update_emits_old_and_new() {
        let (mut ac, owner, old) = controller();
        let new = Address::random();
        let ev = ac.set_fee_collector(owner, new).unwrap();
        assert_eq!(ev, Some(ProcessorEvent::FeeCollectorUpdated { old, new }));
        assert_eq!(ac.fee_collector(), new);
        assert_eq!(ac.set_fee_collector(owner, new).unwrap(), None);
        assert!(matches!(
            ac.set_fee_collector(owner, Address::ZERO),
            Err(PolyPayError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn fee_rate_bounds() {
        let (mut ac, owner, _) = controller();
        assert_eq!(ac.fee_rate().get(), 40);
        let ev = ac.set_fee_rate(owner, 25).unwrap().unwrap();
        assert!(matches!(
            ev,
            ProcessorEvent::FeeRateUpdated { old, new } if old.get() == 40 && new.get() == 25
        ));
        assert!(matches!(
            ac.set_fee_rate(owner, 10_001),
            Err(PolyPayError::InvalidFeeRate(10_001))
        ));
        assert_eq!(ac.fee_rate().get(), 25);
        assert_eq!(ac.set_fee_rate(owner, 25).unwrap(), None);
    }

    #[test]
    fn ownership_transfer_hands_over_control() {
        let (mut ac, owner, _) = controller();
        let heir = Address::random();
        let ev = ac.transfer_ownership(owner, heir).unwrap();
        assert_eq!(
            ev,
            Some(ProcessorEvent::OwnershipTransferred {
                previous_owner: owner,
                new_owner: heir
            })
        );
        assert!(ac.pause(owner).is_err());
        assert!(ac.pause(heir).is_ok());
        assert!(matches!(
            ac.transfer_ownership(heir, Address::ZERO),
            Err(PolyPayError::InvalidAddress { .. })
        ));
    }
}
