use log::debug;
use serde::Serialize;

use crate::blockchain::Ledger;
use crate::error::LedgerError;
use crate::events::LedgerEvent;

/// A completed transfer and the resulting balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub from: u64,
    pub to: u64,
    pub amount: u64,
    pub from_balance: u64,
    pub to_balance: u64,
}

impl Ledger {
    /// Move `amount` from the block at `from` to the producer at `to`.
    ///
    /// Checks run in order: both addresses exist, same zip code,
    /// destination is a producer, sunlight gate, source balance strictly
    /// above `amount`, destination balance can absorb `amount`. Any failure
    /// leaves both balances untouched.
    pub fn make_transaction(
        &mut self,
        from: u64,
        to: u64,
        amount: u64,
    ) -> Result<Settlement, LedgerError> {
        let (source, destination) = match self.check_transaction(from, to, amount) {
            Ok(positions) => positions,
            Err(reason) => {
                self.emit(LedgerEvent::TransactionRejected {
                    from,
                    to,
                    amount,
                    reason: reason.clone(),
                });
                return Err(reason);
            }
        };

        self.chain[source].balance -= amount;
        self.chain[destination].balance += amount;

        let settlement = Settlement {
            from,
            to,
            amount,
            from_balance: self.chain[source].balance,
            to_balance: self.chain[destination].balance,
        };
        debug!("settled {:?}", settlement);
        self.emit(LedgerEvent::TransactionSettled { from, to, amount });
        Ok(settlement)
    }

    /// Chain positions of source and destination when every check passes.
    fn check_transaction(
        &self,
        from: u64,
        to: u64,
        amount: u64,
    ) -> Result<(usize, usize), LedgerError> {
        let source = self
            .position_of(from)
            .ok_or(LedgerError::InvalidAddress(from))?;
        let destination = self
            .position_of(to)
            .ok_or(LedgerError::InvalidAddress(to))?;
        let (payer, payee) = (&self.chain[source], &self.chain[destination]);

        if payer.zip_code != payee.zip_code {
            return Err(LedgerError::RegionMismatch {
                expected: payer.zip_code.clone(),
                found: payee.zip_code.clone(),
            });
        }
        if !payee.is_producer {
            return Err(LedgerError::NonProducerDestination(to));
        }
        self.require_sunlight()?;
        if payer.balance <= amount {
            return Err(LedgerError::InsufficientFunds {
                available: payer.balance,
                requested: amount,
            });
        }
        if payee.balance.checked_add(amount).is_none() {
            return Err(LedgerError::BalanceOverflow {
                address: to,
                amount,
            });
        }
        Ok((source, destination))
    }
}
