//! Simulated engine temperature readings.
//!
//! A reading is derived from a uniform unit sample so that any
//! [`RandomSource`](crate::random::RandomSource) can drive it.

use std::fmt;

/// Lowest value a reading can take (inclusive).
pub const MIN_TEMPERATURE: f64 = 80.0;

/// Upper bound of a reading (exclusive).
pub const MAX_TEMPERATURE: f64 = 100.0;

/// Largest f64 strictly below 1.0.
const UNIT_UPPER: f64 = 1.0 - f64::EPSILON / 2.0;

/// Largest f64 strictly below [`MAX_TEMPERATURE`].
const BELOW_MAX: f64 = f64::from_bits(MAX_TEMPERATURE.to_bits() - 1);

/// A simulated engine temperature in [80.0, 100.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Reading(f64);

impl Reading {
    /// Map a unit sample in [0, 1) onto the temperature range.
    ///
    /// Samples outside that interval, NaN included, are clamped first so the
    /// range invariant holds for any source.
    pub fn from_unit(sample: f64) -> Self {
        let sample = if sample.is_nan() {
            0.0
        } else {
            sample.clamp(0.0, UNIT_UPPER)
        };
        let value = MIN_TEMPERATURE + sample * (MAX_TEMPERATURE - MIN_TEMPERATURE);
        // Multiplication can round up to the bound for samples right below 1.0
        Self(value.min(BELOW_MAX))
    }

    /// Temperature value.
    pub fn celsius(&self) -> f64 {
        self.0
    }

    /// Value in hundredths, rounded half away from zero.
    pub fn centi(&self) -> u64 {
        (self.0 * 100.0).round() as u64
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let centi = self.centi();
        write!(f, "{}.{:02}", centi / 100, centi % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_bound() {
        let reading = Reading::from_unit(0.0);
        assert_eq!(reading.celsius(), 80.0);
        assert_eq!(reading.to_string(), "80.00");
    }

    #[test]
    fn test_upper_bound_is_exclusive() {
        let reading = Reading::from_unit(UNIT_UPPER);
        assert!(reading.celsius() < MAX_TEMPERATURE);

        let reading = Reading::from_unit(1.0);
        assert!(reading.celsius() < MAX_TEMPERATURE);
    }

    #[test]
    fn test_out_of_range_samples_are_clamped() {
        assert_eq!(Reading::from_unit(-3.0).celsius(), MIN_TEMPERATURE);
        assert_eq!(Reading::from_unit(f64::NAN).celsius(), MIN_TEMPERATURE);

        let reading = Reading::from_unit(42.0);
        assert!(reading.celsius() >= MIN_TEMPERATURE && reading.celsius() < MAX_TEMPERATURE);
    }

    #[test]
    fn test_midpoint() {
        let reading = Reading::from_unit(0.5);
        assert_eq!(reading.celsius(), 90.0);
        assert_eq!(reading.centi(), 9000);
    }

    #[test]
    fn test_display_rounds_half_up() {
        // 84.125 is exact in binary
        assert_eq!(Reading(84.125).to_string(), "84.13");
        assert_eq!(Reading(84.3).to_string(), "84.30");
        assert_eq!(Reading(84.374).to_string(), "84.37");
        assert_eq!(Reading(99.998).to_string(), "100.00");
    }
}
