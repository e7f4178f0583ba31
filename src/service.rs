use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use log::debug;

use crate::blockchain::{Admission, Block, Ledger, MiningLimits};
use crate::error::LedgerError;
use crate::market::Settlement;

/// Thread-safe handle to a [`Ledger`].
///
/// Every read and write goes through one lock. Proof-of-Work runs outside
/// it, so audits and balance queries stay responsive while a block is mined.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.inner.lock().expect("mutex poisoned")
    }

    /// Run `f` against the ledger under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&Ledger) -> R) -> R {
        f(&self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn is_chain_valid(&self) -> bool {
        self.lock().is_chain_valid()
    }

    pub fn balance(&self, address: u64) -> Result<u64, LedgerError> {
        self.lock().balance(address)
    }

    pub fn balances(&self) -> Vec<(u64, u64)> {
        self.lock().balances()
    }

    pub fn log_balances(&self) {
        self.lock().log_balances();
    }

    pub fn calculate_price(&self) -> i64 {
        self.lock().calculate_price()
    }

    pub fn make_transaction(
        &self,
        from: u64,
        to: u64,
        amount: u64,
    ) -> Result<Settlement, LedgerError> {
        self.lock().make_transaction(from, to, amount)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        self.lock().to_json()
    }

    /// Admit, mine and append `candidate` with the ledger's own limits.
    pub fn add_block(&self, candidate: Block) -> Result<Admission, LedgerError> {
        let limits = self.lock().mining_limits().clone();
        self.add_block_with(candidate, &limits)
    }

    /// Admit, mine and append `candidate`, blocking the caller but not the
    /// ledger. If another block lands while this one is mined, the
    /// candidate is linked to the new head and mined again.
    pub fn add_block_with(
        &self,
        candidate: Block,
        limits: &MiningLimits,
    ) -> Result<Admission, LedgerError> {
        loop {
            let (mut prepared, difficulty) = {
                let ledger = self.lock();
                (ledger.prepare_block(candidate.clone())?, ledger.difficulty())
            };

            prepared.block.mine_with(difficulty, limits)?;

            match self.lock().append_premined(prepared) {
                Err(LedgerError::StaleTemplate) => {
                    debug!("head moved while mining block #{}, retrying", candidate.index);
                }
                outcome => return outcome,
            }
        }
    }

    /// Mine `candidate` on a dedicated worker thread.
    pub fn submit_block(
        &self,
        candidate: Block,
        limits: MiningLimits,
    ) -> JoinHandle<Result<Admission, LedgerError>> {
        let ledger = self.clone();
        thread::spawn(move || ledger.add_block_with(candidate, &limits))
    }
}
