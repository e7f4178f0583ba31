use serde::Serialize;
use thiserror::Error;

use crate::blockchain::MiningError;

/// Reported, recoverable outcomes of ledger operations. A call that
/// returns one of these has left the ledger unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum LedgerError {
    #[error("zip code {found} does not match region {expected}")]
    RegionMismatch { expected: String, found: String },
    #[error("no block with address {0}")]
    InvalidAddress(u64),
    #[error("block {0} is not an energy producer")]
    NonProducerDestination(u64),
    #[error("no sunlight: {sunlit} sunlit devices, {required} required")]
    NoSunlight { sunlit: usize, required: usize },
    #[error("insufficient funds: balance {available} does not exceed {requested}")]
    InsufficientFunds { available: u64, requested: u64 },
    #[error("crediting {amount} to block {address} would overflow its balance")]
    BalanceOverflow { address: u64, amount: u64 },
    /// Integrity fault: genesis seeding makes this unreachable.
    #[error("chain has no blocks")]
    EmptyChain,
    #[error(transparent)]
    Mining(#[from] MiningError),
    #[error("chain head moved while the block was being mined")]
    StaleTemplate,
    #[error("block hash is inconsistent or below difficulty {difficulty}")]
    InvalidProofOfWork { difficulty: u32 },
}
