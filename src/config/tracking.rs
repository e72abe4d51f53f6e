//! Tracking and status-transition settings.

use serde::{Deserialize, Serialize};

use crate::config::DeliveryDays;

/// Whether the admin console may move a shipment to an earlier step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TransitionPolicy {
    pub allow_non_monotonic_transitions: bool,
}

impl TransitionPolicy {
    pub const STRICT: Self = Self {
        allow_non_monotonic_transitions: false,
    };
    pub const PERMISSIVE: Self = Self {
        allow_non_monotonic_transitions: true,
    };

    /// Same-step moves (location updates) and forward skips are always allowed.
    pub fn permits(&self, from_step: usize, to_step: usize) -> bool {
        self.allow_non_monotonic_transitions || to_step >= from_step
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub default_delivery_days: DeliveryDays,
    pub transitions: TransitionPolicy,
}

impl TrackingConfig {
    pub fn with_transitions(mut self, transitions: TransitionPolicy) -> Self {
        self.transitions = transitions;
        self
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        TRACKING
    }
}

pub const TRACKING: TrackingConfig = TrackingConfig {
    default_delivery_days: DeliveryDays::DEFAULT,
    transitions: TransitionPolicy::STRICT,
};
