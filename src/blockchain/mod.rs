pub mod block;
pub mod mining;
pub mod model;

pub use block::{Block, timestamp_now};
pub use mining::{CancelToken, MiningError, MiningLimits};
pub use model::{Admission, Ledger, PreparedBlock};

/// Default Proof-of-Work difficulty (number of leading zero hex digits).
pub const DEFAULT_DIFFICULTY: u32 = 5;

/// Genesis seed values. The genesis block also fixes the chain's region.
pub const GENESIS_TIMESTAMP: &str = "01/01/2017";
pub const GENESIS_ZIP_CODE: &str = "30609";
pub const GENESIS_TEMPERATURE: f64 = 30.0;
pub const GENESIS_LIGHT: f64 = 40.0;

/// A device counts as sunlit when its light reading is strictly above this.
pub const LIGHT_THRESHOLD: f64 = 50.0;

/// Sunlit devices needed before energy can be priced or sold.
pub const MIN_SUNLIT_DEVICES: usize = 2;
