//! Owner, fee routing and pause state of a processor.

use serde::{Deserialize, Serialize};

use crate::{Address, BasisPoints};

/// Administrative state owned by a processor instance.
///
/// Only the `AccessController` in `polypay-settlement` mutates it, and only
/// on behalf of `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessState {
    pub owner: Address,
    pub fee_collector: Address,
    pub paused: bool,
    pub fee_rate: BasisPoints,
}

impl AccessState {
    /// Unpaused state charging the platform default fee.
    #[must_use]
    pub fn new(owner: Address, fee_collector: Address) -> Self {
        Self {
            owner,
            fee_collector,
            paused: false,
            fee_rate: BasisPoints::PLATFORM_DEFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unpaused_at_default_rate() {
        let state = AccessState::new(Address::random(), Address::random());
        assert!(!state.paused);
        assert_eq!(state.fee_rate.get(), 40);
    }
}
