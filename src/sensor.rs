use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::blockchain::Block;

/// One temperature/light sample from a device.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub temperature: f64,
    pub light: f64,
}

/// Anything that can hand the ledger raw sensor values.
pub trait SensorSource {
    fn read(&mut self) -> SensorReading;
}

/// Random readings standing in for the device hardware.
#[derive(Debug, Clone)]
pub struct SimulatedSensor {
    rng: StdRng,
    temperature: Range<f64>,
    light: Range<f64>,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic sequence, for repeatable demos and tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            temperature: 10.0..45.0,
            light: 0.0..100.0,
        }
    }

    pub fn with_ranges(mut self, temperature: Range<f64>, light: Range<f64>) -> Self {
        self.temperature = temperature;
        self.light = light;
        self
    }
}

impl Default for SimulatedSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self) -> SensorReading {
        SensorReading {
            temperature: self.rng.gen_range(self.temperature.clone()),
            light: self.rng.gen_range(self.light.clone()),
        }
    }
}

/// Push a reading into a block. Returns false (and changes nothing) for
/// consumer blocks.
pub fn apply_reading(block: &mut Block, reading: SensorReading) -> bool {
    block.add_temperature_reading(reading.temperature) && block.add_light_reading(reading.light)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sensors_repeat() {
        let mut a = SimulatedSensor::seeded(7);
        let mut b = SimulatedSensor::seeded(7);
        for _ in 0..5 {
            assert_eq!(a.read(), b.read());
        }
    }

    #[test]
    fn readings_stay_in_range() {
        let mut sensor = SimulatedSensor::seeded(1).with_ranges(20.0..21.0, 60.0..61.0);
        for _ in 0..20 {
            let r = sensor.read();
            assert!((20.0..21.0).contains(&r.temperature));
            assert!((60.0..61.0).contains(&r.light));
        }
    }

    #[test]
    fn readings_only_reach_producers() {
        let reading = SensorReading {
            temperature: 25.0,
            light: 75.0,
        };
        let mut producer = Block::new(1, "20/07/2017", "30609", true, 0.0, 0.0, 0);
        assert!(apply_reading(&mut producer, reading));
        assert_eq!(producer.light_reading, 75.0);

        let mut consumer = Block::new(2, "20/07/2017", "30609", false, 0.0, 0.0, 0);
        assert!(!apply_reading(&mut consumer, reading));
        assert_eq!(consumer.temperature_reading, 0.0);
        assert_eq!(consumer.light_reading, 0.0);
    }
}
