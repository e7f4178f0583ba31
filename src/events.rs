use std::sync::{Arc, Mutex};

use log::{info, warn};
use serde::Serialize;

use crate::error::LedgerError;

/// Notifications emitted by the ledger core.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    BlockMined {
        index: u64,
        hash: String,
        nonce: u64,
    },
    RegionMismatch {
        index: u64,
        expected: String,
        found: String,
    },
    /// A block's requested index was taken and has been reassigned.
    IndexCollision { requested: u64, assigned: u64 },
    TransactionSettled { from: u64, to: u64, amount: u64 },
    TransactionRejected {
        from: u64,
        to: u64,
        amount: u64,
        reason: LedgerError,
    },
    /// A price query found too few sunlit devices.
    NoSunlight { sunlit: usize, required: usize },
}

/// Receiver for [`LedgerEvent`]s.
pub trait EventSink: Send {
    fn emit(&self, event: &LedgerEvent);
}

/// Writes every event through the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::BlockMined { index, hash, nonce } => {
                info!("block #{index} mined: hash={hash} nonce={nonce}");
            }
            LedgerEvent::RegionMismatch {
                index,
                expected,
                found,
            } => {
                warn!("block #{index} rejected: zip code {found} is outside region {expected}");
            }
            LedgerEvent::IndexCollision {
                requested,
                assigned,
            } => {
                warn!("index {requested} already exists, block will use index {assigned}");
            }
            LedgerEvent::TransactionSettled { from, to, amount } => {
                info!("transaction {from} -> {to} settled ({amount})");
            }
            LedgerEvent::TransactionRejected {
                from,
                to,
                amount,
                reason,
            } => {
                warn!("transaction {from} -> {to} ({amount}) rejected: {reason}");
            }
            LedgerEvent::NoSunlight { sunlit, required } => {
                warn!("no sunlight ({sunlit}/{required} devices), no electricity can be sold");
            }
        }
    }
}

/// Keeps events in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<LedgerEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().expect("mutex poisoned").clone()
    }

    pub fn clear(&self) {
        self.events.lock().expect("mutex poisoned").clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &LedgerEvent) {
        self.events
            .lock()
            .expect("mutex poisoned")
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_clones_share_buffer() {
        let sink = RecordingSink::new();
        let handle = sink.clone();
        sink.emit(&LedgerEvent::IndexCollision {
            requested: 1,
            assigned: 2,
        });
        assert_eq!(handle.events().len(), 1);
        handle.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn events_serialize_with_tag() {
        let json = serde_json::to_value(LedgerEvent::TransactionSettled {
            from: 1,
            to: 2,
            amount: 60,
        })
        .unwrap();
        assert_eq!(json["event"], "transaction_settled");
        assert_eq!(json["amount"], 60);
    }

    #[test]
    fn rejection_carries_reason() {
        let json = serde_json::to_value(LedgerEvent::TransactionRejected {
            from: 1,
            to: 9,
            amount: 5,
            reason: LedgerError::InvalidAddress(9),
        })
        .unwrap();
        assert_eq!(json["reason"]["InvalidAddress"], 9);
    }
}
