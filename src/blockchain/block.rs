use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::mining::{MiningError, MiningLimits};
use super::{GENESIS_LIGHT, GENESIS_TEMPERATURE, GENESIS_TIMESTAMP, GENESIS_ZIP_CODE};

/// One device's entry in the ledger: identity, optional sensor data,
/// account balance and the hash linkage to its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Logical address of the device. Unique within a ledger.
    pub index: u64,
    pub timestamp: String, // opaque, only hashed
    pub zip_code: String,
    pub is_producer: bool,
    pub temperature_reading: f64,
    pub light_reading: f64,
    pub balance: u64,
    pub previous_hash: String, // empty for genesis
    pub hash: String,
    pub nonce: u64,
}

impl Block {
    /// Create a new block (not mined yet). Sensor readings are kept only
    /// for producers; consumers always carry zero readings.
    pub fn new(
        index: u64,
        timestamp: impl Into<String>,
        zip_code: impl Into<String>,
        is_producer: bool,
        temperature_reading: f64,
        light_reading: f64,
        balance: u64,
    ) -> Self {
        let (temperature_reading, light_reading) = if is_producer {
            (temperature_reading, light_reading)
        } else {
            (0.0, 0.0)
        };
        let mut block = Self {
            index,
            timestamp: timestamp.into(),
            zip_code: zip_code.into(),
            is_producer,
            temperature_reading,
            light_reading,
            balance,
            previous_hash: String::new(),
            hash: String::new(),
            nonce: 0,
        };
        // Provisional; mining replaces it.
        block.hash = block.calculate_hash();
        block
    }

    /// The fixed first block of every ledger. Not mined.
    pub fn genesis() -> Self {
        Self::new(
            0,
            GENESIS_TIMESTAMP,
            GENESIS_ZIP_CODE,
            true,
            GENESIS_TEMPERATURE,
            GENESIS_LIGHT,
            0,
        )
    }

    /// SHA-256 over `index`, `previous_hash`, `timestamp`, `zip_code` and
    /// `nonce`, concatenated without separators, hex encoded.
    ///
    /// Sensor readings and balance are not part of the preimage.
    pub fn calculate_hash(&self) -> String {
        let preimage = format!(
            "{}{}{}{}{}",
            self.index, self.previous_hash, self.timestamp, self.zip_code, self.nonce
        );
        let mut hasher = Sha256::new();
        hasher.update(preimage.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Perform Proof-of-Work by finding a nonce that yields a hash
    /// starting with `difficulty` leading zeros (in hex). Runs until found.
    pub fn mine(&mut self, difficulty: u32) {
        if let Err(e) = self.mine_with(difficulty, &MiningLimits::unbounded()) {
            unreachable!("unbounded mining stopped early: {e}");
        }
    }

    /// Like [`Block::mine`], but stops early when the attempt budget is
    /// spent or the cancel token fires. Returns the number of hashes tried.
    ///
    /// On error the nonce and hash are left mid-search and the block must
    /// not be admitted to a chain.
    pub fn mine_with(
        &mut self,
        difficulty: u32,
        limits: &MiningLimits,
    ) -> Result<u64, MiningError> {
        let target_prefix = "0".repeat(difficulty as usize);
        let mut attempts: u64 = 0;
        loop {
            if limits.is_cancelled() {
                debug!("mining of block #{} cancelled", self.index);
                return Err(MiningError::Cancelled { attempts });
            }
            if let Some(limit) = limits.max_attempts {
                if attempts >= limit {
                    return Err(MiningError::AttemptLimit { limit });
                }
            }
            self.hash = self.calculate_hash();
            attempts += 1;
            if self.hash.starts_with(&target_prefix) {
                break;
            }
            self.nonce = self.nonce.wrapping_add(1);
        }

        info!(
            "BLOCK MINED: {} (index={}, nonce={})",
            self.hash, self.index, self.nonce
        );
        Ok(attempts)
    }

    /// True when the hash prefix satisfies `difficulty`.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        self.hash.len() >= difficulty as usize
            && self
                .hash
                .chars()
                .take(difficulty as usize)
                .all(|c| c == '0')
    }

    /// Validate that the cached `hash` matches the block's fields and
    /// satisfies the PoW difficulty. (Does NOT validate chain linkage.)
    pub fn is_valid(&self, difficulty: u32) -> bool {
        self.hash == self.calculate_hash() && self.meets_difficulty(difficulty)
    }

    /// Update the temperature reading. Ignored for non-producers.
    pub fn add_temperature_reading(&mut self, reading: f64) -> bool {
        if !self.is_producer {
            return false;
        }
        self.temperature_reading = reading;
        true
    }

    /// Update the light reading. Ignored for non-producers.
    pub fn add_light_reading(&mut self, reading: f64) -> bool {
        if !self.is_producer {
            return false;
        }
        self.light_reading = reading;
        true
    }
}

/// Today's date in the `dd/mm/YYYY` form used for block timestamps.
pub fn timestamp_now() -> String {
    Utc::now().format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::mining::CancelToken;

    fn producer(index: u64) -> Block {
        Block::new(index, "20/07/2017", "30609", true, 40.0, 10.0, 100)
    }

    #[test]
    fn genesis_matches_seed_values() {
        let b = Block::genesis();
        assert_eq!(b.index, 0);
        assert_eq!(b.zip_code, "30609");
        assert!(b.is_producer);
        assert_eq!(b.temperature_reading, 30.0);
        assert_eq!(b.light_reading, 40.0);
        assert_eq!(b.balance, 0);
        assert!(b.previous_hash.is_empty());
        assert_eq!(b.hash, b.calculate_hash());
    }

    #[test]
    fn hash_covers_concatenated_fields() {
        let b = producer(1);
        let mut hasher = Sha256::new();
        hasher.update("120/07/2017306090");
        assert_eq!(b.calculate_hash(), hex::encode(hasher.finalize()));
        assert_eq!(b.hash.len(), 64);
    }

    #[test]
    fn hash_ignores_readings_and_balance() {
        let mut b = producer(1);
        let before = b.calculate_hash();
        b.balance = 9_999;
        b.temperature_reading = -4.0;
        b.light_reading = 500.0;
        assert_eq!(before, b.calculate_hash());
    }

    #[test]
    fn consumer_readings_are_forced_to_zero() {
        let b = Block::new(4, "24/07/2017", "30609", false, 55.0, 80.0, 10);
        assert_eq!(b.temperature_reading, 0.0);
        assert_eq!(b.light_reading, 0.0);
    }

    #[test]
    fn mining_produces_leading_zeros() {
        let mut b = producer(1);
        b.previous_hash = "prev".into();
        b.mine(2);
        assert!(b.hash.starts_with("00"));
        assert_eq!(b.hash, b.calculate_hash());
        assert!(b.is_valid(2));
    }

    #[test]
    fn difficulty_zero_accepts_first_hash() {
        let mut b = producer(1);
        let attempts = b.mine_with(0, &MiningLimits::unbounded()).unwrap();
        assert_eq!(attempts, 1);
        assert_eq!(b.nonce, 0);
    }

    #[test]
    fn invalid_when_mutated() {
        let mut b = producer(2);
        b.mine(1);
        b.timestamp = "01/01/1999".into();
        assert!(!b.is_valid(1));
    }

    #[test]
    fn attempt_limit_stops_search() {
        let mut b = producer(1);
        // 64 leading zeros is never reached in practice.
        let err = b.mine_with(64, &MiningLimits::with_max_attempts(50)).unwrap_err();
        assert_eq!(err, MiningError::AttemptLimit { limit: 50 });
        assert_eq!(b.nonce, 50);
    }

    #[test]
    fn cancelled_token_stops_before_hashing() {
        let token = CancelToken::new();
        token.cancel();
        let mut b = producer(1);
        let limits = MiningLimits::unbounded().cancellable(token);
        assert_eq!(
            b.mine_with(3, &limits),
            Err(MiningError::Cancelled { attempts: 0 })
        );
    }

    #[test]
    fn readings_update_only_for_producers() {
        let mut seller = producer(1);
        assert!(seller.add_temperature_reading(33.0));
        assert!(seller.add_light_reading(71.0));
        assert_eq!(seller.temperature_reading, 33.0);
        assert_eq!(seller.light_reading, 71.0);

        let mut buyer = Block::new(2, "21/07/2017", "30609", false, 0.0, 0.0, 10);
        assert!(!buyer.add_temperature_reading(33.0));
        assert!(!buyer.add_light_reading(71.0));
        assert_eq!(buyer.temperature_reading, 0.0);
        assert_eq!(buyer.light_reading, 0.0);
    }

    #[test]
    fn timestamp_now_has_day_month_year_shape() {
        let ts = timestamp_now();
        let parts: Vec<&str> = ts.split('/').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[2].len(), 4);
    }
}
