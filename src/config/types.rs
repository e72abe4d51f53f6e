//! Small value types shared across the crate.

use serde::{Deserialize, Serialize};

use crate::config::constants::{DEFAULT_DELIVERY_DAYS, MAX_DELIVERY_DAYS};

/// A 'general' fraction clamped between 0 and 1.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Pct(f64);

impl Pct {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);

    pub const fn new(val: f64) -> Self {
        // NaN fails both comparisons, so map it explicitly.
        let v = if val.is_nan() || val < 0.0 {
            0.0
        } else if val > 1.0 {
            1.0
        } else {
            val
        };
        Self(v)
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Pct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0 * 100.)
    }
}

/// Estimated transit duration, between one day and `MAX_DELIVERY_DAYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryDays(u32);

impl DeliveryDays {
    pub const DEFAULT: Self = Self(DEFAULT_DELIVERY_DAYS);

    /// `None` for zero or anything past `MAX_DELIVERY_DAYS`.
    pub const fn new(days: u32) -> Option<Self> {
        if days == 0 || days > MAX_DELIVERY_DAYS {
            None
        } else {
            Some(Self(days))
        }
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for DeliveryDays {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for DeliveryDays {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 == 1 {
            write!(f, "1 day")
        } else {
            write!(f, "{} days", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pct_clamps_out_of_range_and_nan() {
        assert_eq!(Pct::new(-0.5).value(), 0.0);
        assert_eq!(Pct::new(1.7).value(), 1.0);
        assert_eq!(Pct::new(f64::NAN).value(), 0.0);
        assert_eq!(Pct::new(0.25).to_string(), "25.0%");
    }

    #[test]
    fn out_of_range_delivery_days_are_rejected() {
        assert!(DeliveryDays::new(0).is_none());
        assert!(DeliveryDays::new(MAX_DELIVERY_DAYS + 1).is_none());
        assert!(DeliveryDays::new(u32::MAX).is_none());
        assert_eq!(DeliveryDays::new(MAX_DELIVERY_DAYS).map(DeliveryDays::get), Some(3650));
        assert_eq!(DeliveryDays::new(5).map(DeliveryDays::get), Some(5));
        assert_eq!(DeliveryDays::default().get(), 3);
    }
}
