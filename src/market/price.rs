use log::info;

use crate::blockchain::{LIGHT_THRESHOLD, Ledger, MIN_SUNLIT_DEVICES};
use crate::error::LedgerError;
use crate::events::LedgerEvent;

/// Price multiplier when the average temperature went up.
pub const RISING_MULTIPLIER: i64 = 4;
/// Price multiplier otherwise.
pub const FLAT_MULTIPLIER: i64 = 2;

impl Ledger {
    /// Number of blocks whose light reading is above [`LIGHT_THRESHOLD`].
    pub fn sunlit_devices(&self) -> usize {
        self.chain
            .iter()
            .filter(|b| b.light_reading > LIGHT_THRESHOLD)
            .count()
    }

    pub fn has_sunlight(&self) -> bool {
        self.sunlit_devices() >= MIN_SUNLIT_DEVICES
    }

    pub(crate) fn require_sunlight(&self) -> Result<(), LedgerError> {
        let sunlit = self.sunlit_devices();
        if sunlit < MIN_SUNLIT_DEVICES {
            return Err(LedgerError::NoSunlight {
                sunlit,
                required: MIN_SUNLIT_DEVICES,
            });
        }
        Ok(())
    }

    /// Mean temperature over every block, consumers included, rounded to
    /// the nearest integer with halves going up. Out-of-range means clamp to
    /// the `i64` bounds.
    pub fn average_temperature(&self) -> i64 {
        if self.chain.is_empty() {
            return 0;
        }
        let total: f64 = self.chain.iter().map(|b| b.temperature_reading).sum();
        let mean = total / self.chain.len() as f64;
        (mean + 0.5).floor() as i64
    }

    /// Unit price of energy derived from the whole chain.
    ///
    /// Zero when the sunlight gate fails. Otherwise the rounded average
    /// temperature times 4 if it rose since the last priced query, times 2
    /// if not, saturating at the `i64` bounds. Each priced query records the
    /// new average.
    pub fn calculate_price(&mut self) -> i64 {
        if let Err(LedgerError::NoSunlight { sunlit, required }) = self.require_sunlight() {
            self.emit(LedgerEvent::NoSunlight { sunlit, required });
            return 0;
        }

        let average = self.average_temperature();
        let multiplier = if average > self.previous_average_temperature {
            RISING_MULTIPLIER
        } else {
            FLAT_MULTIPLIER
        };
        let price = average.saturating_mul(multiplier);
        info!(
            "price {} (avg temp {}, previous {})",
            price, average, self.previous_average_temperature
        );
        self.previous_average_temperature = average;
        price
    }
}

#[cfg(test)]
mod tests {
    use crate::blockchain::{Block, Ledger};
    use crate::events::{LedgerEvent, RecordingSink};

    fn ledger_with_light(readings: &[(f64, f64)]) -> Ledger {
        let mut ledger = Ledger::new(1);
        for (i, (temp, light)) in readings.iter().enumerate() {
            let index = i as u64 + 1;
            let block = Block::new(index, "20/07/2017", "30609", true, *temp, *light, 100);
            ledger.add_block(block).unwrap();
        }
        ledger
    }

    #[test]
    fn dim_chain_prices_at_zero() {
        let sink = RecordingSink::new();
        let mut ledger = ledger_with_light(&[(40.0, 10.0), (40.0, 23.0), (60.0, 12.0)])
            .with_sink(sink.clone());
        assert_eq!(ledger.sunlit_devices(), 0);
        assert_eq!(ledger.calculate_price(), 0);
        assert_eq!(ledger.previous_average_temperature(), 0);
        assert_eq!(
            sink.events(),
            vec![LedgerEvent::NoSunlight {
                sunlit: 0,
                required: 2,
            }]
        );
    }

    #[test]
    fn one_sunlit_device_is_not_enough() {
        let mut ledger = ledger_with_light(&[(40.0, 60.0), (40.0, 50.0)]);
        assert_eq!(ledger.sunlit_devices(), 1);
        assert!(!ledger.has_sunlight());
        assert_eq!(ledger.calculate_price(), 0);
    }

    #[test]
    fn rising_then_flat_average() {
        // temps: genesis 30 + 40 + 40 + 60 => 42.5, rounds to 43
        let mut ledger = ledger_with_light(&[(40.0, 60.0), (40.0, 70.0), (60.0, 10.0)]);
        assert!(ledger.has_sunlight());
        assert_eq!(ledger.average_temperature(), 43);

        assert_eq!(ledger.calculate_price(), 4 * 43);
        assert_eq!(ledger.previous_average_temperature(), 43);

        // unchanged average is not a rise
        assert_eq!(ledger.calculate_price(), 2 * 43);
    }

    #[test]
    fn consumers_dilute_the_average() {
        let mut ledger = ledger_with_light(&[(40.0, 60.0), (40.0, 70.0)]);
        // 30 + 40 + 40 => 36.67, rounds to 37
        assert_eq!(ledger.average_temperature(), 37);
        let consumer = Block::new(9, "22/07/2017", "30609", false, 99.0, 99.0, 5);
        ledger.add_block(consumer).unwrap();
        // 110 / 4 => 27.5, rounds to 28
        assert_eq!(ledger.average_temperature(), 28);
    }

    #[test]
    fn falling_average_uses_flat_multiplier() {
        let mut ledger = ledger_with_light(&[(40.0, 60.0), (40.0, 70.0)]);
        assert_eq!(ledger.calculate_price(), 4 * 37);
        ledger
            .add_block(Block::new(3, "23/07/2017", "30609", true, 0.0, 0.0, 0))
            .unwrap();
        // 110 / 4 => 27.5, rounds to 28
        assert_eq!(ledger.calculate_price(), 2 * 28);
        assert_eq!(ledger.previous_average_temperature(), 28);
    }

    #[test]
    fn extreme_readings_saturate_instead_of_overflowing() {
        let mut ledger = ledger_with_light(&[(1e30, 60.0), (1e30, 70.0)]);
        assert_eq!(ledger.average_temperature(), i64::MAX);
        assert_eq!(ledger.calculate_price(), i64::MAX);
        // no rise the second time, still clamped
        assert_eq!(ledger.calculate_price(), i64::MAX);

        let mut cold = ledger_with_light(&[(-1e30, 60.0), (-1e30, 70.0)]);
        assert_eq!(cold.calculate_price(), i64::MIN);
    }
}
