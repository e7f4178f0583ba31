use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;

use super::Block;
use super::mining::MiningLimits;
use crate::config::LedgerConfig;
use crate::error::LedgerError;
use crate::events::{EventSink, LedgerEvent, LogSink};

/// A candidate that passed admission and is linked to the current head,
/// waiting for its Proof-of-Work.
#[derive(Debug, Clone)]
pub struct PreparedBlock {
    pub block: Block,
    /// Index the caller asked for, when it had to be reassigned.
    pub reassigned_from: Option<u64>,
}

/// Result of a successful `add_block`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Admission {
    pub index: u64,
    pub hash: String,
    pub nonce: u64,
    pub reassigned_from: Option<u64>,
}

/// In-memory, single-region ledger with Proof-of-Work admission.
pub struct Ledger {
    pub(crate) chain: Vec<Block>,
    pub(crate) difficulty: u32,
    pub(crate) block_count: u64,
    pub(crate) previous_average_temperature: i64,
    pub(crate) limits: MiningLimits,
    pub(crate) sink: Box<dyn EventSink>,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("chain", &self.chain)
            .field("difficulty", &self.difficulty)
            .field("block_count", &self.block_count)
            .field(
                "previous_average_temperature",
                &self.previous_average_temperature,
            )
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Initialize a new ledger with a genesis block, logging events.
    pub fn new(difficulty: u32) -> Self {
        let mut ledger = Self {
            chain: Vec::new(),
            difficulty,
            block_count: 0,
            previous_average_temperature: 0,
            limits: MiningLimits::unbounded(),
            sink: Box::new(LogSink),
        };
        ledger.chain.push(Block::genesis());
        ledger
    }

    pub fn from_config(config: &LedgerConfig) -> Self {
        let mut ledger = Self::new(config.difficulty);
        ledger.limits.max_attempts = config.max_mining_attempts;
        ledger
    }

    /// Replace the notification sink.
    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Limits applied by [`Ledger::add_block`].
    pub fn with_limits(mut self, limits: MiningLimits) -> Self {
        self.limits = limits;
        self
    }

    pub(crate) fn emit(&self, event: LedgerEvent) {
        self.sink.emit(&event);
    }

    /// Return the last block in the chain.
    pub fn latest_block(&self) -> Result<&Block, LedgerError> {
        self.chain.last().ok_or(LedgerError::EmptyChain)
    }

    /// Zip code of the genesis block; every block must share it.
    pub fn region(&self) -> &str {
        self.chain.first().map_or("", |b| b.zip_code.as_str())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Blocks added after genesis.
    pub fn block_count(&self) -> u64 {
        self.block_count
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_limits(&self) -> &MiningLimits {
        &self.limits
    }

    pub fn previous_average_temperature(&self) -> i64 {
        self.previous_average_temperature
    }

    pub fn find_block(&self, address: u64) -> Option<&Block> {
        self.chain.iter().find(|b| b.index == address)
    }

    pub(crate) fn position_of(&self, address: u64) -> Option<usize> {
        self.chain.iter().position(|b| b.index == address)
    }

    /// First free index at or after the value the block counter will hold
    /// once the next block lands.
    fn next_free_index(&self) -> u64 {
        let mut candidate = self.block_count + 1;
        while self.find_block(candidate).is_some() {
            candidate += 1;
        }
        candidate
    }

    fn check_region(&self, block: &Block) -> Result<(), LedgerError> {
        if block.zip_code == self.region() {
            return Ok(());
        }
        Err(LedgerError::RegionMismatch {
            expected: self.region().to_string(),
            found: block.zip_code.clone(),
        })
    }

    /// Run admission on `candidate` and link it to the current head.
    /// The returned block is not mined yet.
    ///
    /// A duplicate index is replaced with the next free one; the collision
    /// is reported when the block is appended.
    pub fn prepare_block(&self, mut candidate: Block) -> Result<PreparedBlock, LedgerError> {
        if let Err(e) = self.check_region(&candidate) {
            if let LedgerError::RegionMismatch { expected, found } = &e {
                self.emit(LedgerEvent::RegionMismatch {
                    index: candidate.index,
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
            return Err(e);
        }

        let mut reassigned_from = None;
        if self.find_block(candidate.index).is_some() {
            let assigned = self.next_free_index();
            debug!(
                "index {} already in chain, reassigning to {}",
                candidate.index, assigned
            );
            reassigned_from = Some(candidate.index);
            candidate.index = assigned;
        }

        candidate.previous_hash = self.latest_block()?.hash.clone();
        candidate.hash = candidate.calculate_hash();
        Ok(PreparedBlock {
            block: candidate,
            reassigned_from,
        })
    }

    /// Append a block whose Proof-of-Work was done elsewhere.
    ///
    /// Fails with `StaleTemplate` if the head moved since `prepare_block`.
    pub fn append_premined(&mut self, prepared: PreparedBlock) -> Result<Admission, LedgerError> {
        let PreparedBlock {
            block,
            reassigned_from,
        } = prepared;

        self.check_region(&block)?;
        if self.latest_block()?.hash != block.previous_hash || self.find_block(block.index).is_some()
        {
            warn!("stale block #{}: head moved", block.index);
            return Err(LedgerError::StaleTemplate);
        }
        if !block.is_valid(self.difficulty) {
            return Err(LedgerError::InvalidProofOfWork {
                difficulty: self.difficulty,
            });
        }

        if let Some(requested) = reassigned_from {
            self.emit(LedgerEvent::IndexCollision {
                requested,
                assigned: block.index,
            });
        }

        let admission = Admission {
            index: block.index,
            hash: block.hash.clone(),
            nonce: block.nonce,
            reassigned_from,
        };
        self.chain.push(block);
        self.block_count += 1;
        self.emit(LedgerEvent::BlockMined {
            index: admission.index,
            hash: admission.hash.clone(),
            nonce: admission.nonce,
        });
        Ok(admission)
    }

    /// Admit, mine and append `candidate` using the ledger's mining limits.
    pub fn add_block(&mut self, candidate: Block) -> Result<Admission, LedgerError> {
        let limits = self.limits.clone();
        self.add_block_with(candidate, &limits)
    }

    /// Admit, mine and append `candidate`. Nothing is appended unless the
    /// Proof-of-Work completes within `limits`.
    pub fn add_block_with(
        &mut self,
        candidate: Block,
        limits: &MiningLimits,
    ) -> Result<Admission, LedgerError> {
        let mut prepared = self.prepare_block(candidate)?;
        if let Err(e) = prepared.block.mine_with(self.difficulty, limits) {
            warn!("block #{} not added: {}", prepared.block.index, e);
            return Err(e.into());
        }
        self.append_premined(prepared)
    }

    /// Audit hashes, linkage, difficulty and region across the chain.
    /// Read-only.
    pub fn is_chain_valid(&self) -> bool {
        let Some(genesis) = self.chain.first() else {
            return false;
        };
        if genesis.hash != genesis.calculate_hash() {
            return false;
        }

        self.chain.windows(2).all(|pair| {
            let (prev, current) = (&pair[0], &pair[1]);
            current.hash == current.calculate_hash()
                && current.meets_difficulty(self.difficulty)
                && current.previous_hash == prev.hash
                && current.zip_code == prev.zip_code
        })
    }

    /// Balance of the block at logical `address`.
    pub fn balance(&self, address: u64) -> Result<u64, LedgerError> {
        self.find_block(address)
            .map(|b| b.balance)
            .ok_or(LedgerError::InvalidAddress(address))
    }

    /// `(address, balance)` for every block, in chain order.
    pub fn balances(&self) -> Vec<(u64, u64)> {
        self.chain.iter().map(|b| (b.index, b.balance)).collect()
    }

    pub fn log_balances(&self) {
        for (address, balance) in self.balances() {
            info!("Block Address [{address}]: {balance}");
        }
    }

    /// Render the chain as pretty JSON for display.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.chain)
    }
}
