//! Gas accounting at block and message scope.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use crate::TxFailure;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
pub enum GasPoolError {
    #[error("block gas pool exhausted (requested {requested}, remaining {remaining})")]
    Exhausted { requested: u64, remaining: u64 },
}

/// Remaining gas of one block.  Only ever decreases.
#[derive(Debug)]
pub struct GasPool {
    limit: u64,
    remaining: AtomicU64,
}

impl GasPool {
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: AtomicU64::new(limit),
        }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn used(&self) -> u64 {
        self.limit - self.remaining()
    }

    /// Returns if a message with this gas limit may still be admitted.
    pub fn admits(&self, gas_limit: u64) -> bool {
        gas_limit <= self.remaining()
    }

    /// Atomically takes `amount`, failing without any change if not enough
    /// gas is left.
    pub fn try_sub_gas(&self, amount: u64) -> Result<u64, GasPoolError> {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |cur| {
                cur.checked_sub(amount)
            })
            .map(|prev| prev - amount)
            .map_err(|remaining| GasPoolError::Exhausted {
                requested: amount,
                remaining,
            })
    }
}

/// Gas consumed by a single message.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct GasMeter {
    limit: u64,
    used: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    /// Charges `amount`.  Running out leaves the meter unchanged.
    pub fn charge(&mut self, amount: u64) -> Result<(), TxFailure> {
        if amount > self.remaining() {
            return Err(TxFailure::OutOfGas);
        }
        self.used += amount;
        Ok(())
    }

    /// Burns everything left, as happens on out of gas.
    pub fn exhaust(&mut self) {
        self.used = self.limit;
    }

    /// Gives back up to `amount` of used gas.
    pub fn refund(&mut self, amount: u64) {
        self.used -= amount.min(self.used);
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_pool_rejects_overdraw() {
        let pool = GasPool::new(100);
        assert_eq!(pool.try_sub_gas(60), Ok(40));
        assert!(pool.admits(40));
        assert!(!pool.admits(41));
        assert_eq!(
            pool.try_sub_gas(41),
            Err(GasPoolError::Exhausted {
                requested: 41,
                remaining: 40
            })
        );
        assert_eq!(pool.remaining(), 40);
        assert_eq!(pool.used(), 60);
    }

    #[test]
    fn test_pool_concurrent_subtraction_is_exact() {
        let pool = Arc::new(GasPool::new(10_000));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let pool = pool.clone();
                thread::spawn(move || (0..1_000).filter(|_| pool.try_sub_gas(3).is_ok()).count())
            })
            .collect();
        let ok: usize = handles.into_iter().map(|h| h.join().expect("test: join")).sum();
        assert_eq!(ok, 3_333);
        assert_eq!(pool.remaining(), 1);
    }

    #[test]
    fn test_meter_charge_and_refund() {
        let mut m = GasMeter::new(50);
        m.charge(30).expect("test: charge");
        assert_eq!(m.charge(21), Err(TxFailure::OutOfGas));
        assert_eq!(m.used(), 30);
        m.refund(10);
        assert_eq!(m.used(), 20);
        m.exhaust();
        assert_eq!(m.remaining(), 0);
    }
}
