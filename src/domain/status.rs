use {
    crate::error::TrackingError,
    serde::{Deserialize, Serialize},
    std::str::FromStr,
    strum_macros::{EnumCount, EnumIter},
};

/// The canonical, ordered shipment lifecycle.
///
/// Discriminants are the step indices of the tracking display, so the mapping
/// from status to step is total.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    EnumCount,
)]
pub enum ShipmentStatus {
    #[serde(rename = "Order Placed")]
    OrderPlaced = 0,
    #[serde(rename = "Dispatched")]
    Dispatched = 1,
    #[serde(rename = "In Transit")]
    InTransit = 2,
    #[serde(rename = "At Sorting Center")]
    AtSortingCenter = 3,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery = 4,
    #[serde(rename = "Delivered")]
    Delivered = 5,
}

/// Every status string seen in stored records, matched exactly.
///
/// Canonical admin labels, the lower-case labels written by the local-storage
/// create form, and the step ids used by the tracking display.
pub const STATUS_LABELS: &[(&str, ShipmentStatus)] = &[
    ("Order Placed", ShipmentStatus::OrderPlaced),
    ("order placed", ShipmentStatus::OrderPlaced),
    ("order-placed", ShipmentStatus::OrderPlaced),
    ("Dispatched", ShipmentStatus::Dispatched),
    ("dispatched", ShipmentStatus::Dispatched),
    ("In Transit", ShipmentStatus::InTransit),
    ("in transit", ShipmentStatus::InTransit),
    ("in-transit", ShipmentStatus::InTransit),
    ("At Sorting Center", ShipmentStatus::AtSortingCenter),
    ("at sorting center", ShipmentStatus::AtSortingCenter),
    ("sorting", ShipmentStatus::AtSortingCenter),
    ("Out for Delivery", ShipmentStatus::OutForDelivery),
    ("out for delivery", ShipmentStatus::OutForDelivery),
    ("out-delivery", ShipmentStatus::OutForDelivery),
    ("Delivered", ShipmentStatus::Delivered),
    ("delivered", ShipmentStatus::Delivered),
];

impl ShipmentStatus {
    pub const INITIAL: Self = Self::OrderPlaced;

    #[inline]
    pub fn step_index(self) -> usize {
        self as usize
    }

    /// The label written to storage and shown to admins.
    pub fn label(self) -> &'static str {
        match self {
            Self::OrderPlaced => "Order Placed",
            Self::Dispatched => "Dispatched",
            Self::InTransit => "In Transit",
            Self::AtSortingCenter => "At Sorting Center",
            Self::OutForDelivery => "Out for Delivery",
            Self::Delivered => "Delivered",
        }
    }

    /// Exact-match lookup against `STATUS_LABELS`. No trimming, no case folding.
    pub fn from_label(label: &str) -> Option<Self> {
        STATUS_LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|&(_, status)| status)
    }
}

impl FromStr for ShipmentStatus {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| TrackingError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
