//! Permissioned, single-region ledger for community solar-energy trading.
//!
//! Blocks carry a device's sensor readings and balance, are sealed with
//! Proof-of-Work and linked by SHA-256 hashes. The [`Ledger`] prices energy
//! from the chain's aggregate sensor state and settles transfers between
//! devices.

pub mod blockchain;
pub mod config;
pub mod error;
pub mod events;
pub mod market;
pub mod sensor;
pub mod service;

pub use blockchain::{Admission, Block, CancelToken, Ledger, MiningError, MiningLimits};
pub use config::LedgerConfig;
pub use error::LedgerError;
pub use events::{EventSink, LedgerEvent, LogSink, RecordingSink};
pub use market::Settlement;
pub use service::SharedLedger;
