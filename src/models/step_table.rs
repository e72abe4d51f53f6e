//! The canonical step table of the tracking display.
//!
//! Six steps, one per `ShipmentStatus`, in lifecycle order. A status string
//! maps onto a step only through the exact-match `STATUS_LABELS` lookup.

use {
    crate::domain::{ServiceType, ShipmentRecord, ShipmentStatus},
    serde::{Deserialize, Serialize},
    strum_macros::Display,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum StepIcon {
    Clipboard,
    Package,
    Truck,
    Plane,
    Ship,
    MapPin,
}

impl StepIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            Self::Clipboard => "📋",
            Self::Package => "📦",
            Self::Truck => "🚛",
            Self::Plane => "✈️",
            Self::Ship => "🚢",
            Self::MapPin => "📍",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRule {
    Fixed(StepIcon),
    /// Plane for air, ship for ocean, truck otherwise.
    ByService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationRule {
    SenderAddress,
    ReceiverAddress,
    /// Live shipment data when available, otherwise the fixed text.
    Recorded(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    pub status: ShipmentStatus,
    pub id: &'static str,
    pub title: &'static str,
    pub icon: IconRule,
    pub location: LocationRule,
    pub description: &'static str,
}

impl StepDefinition {
    pub fn icon_for(&self, service: ServiceType) -> StepIcon {
        match self.icon {
            IconRule::Fixed(icon) => icon,
            IconRule::ByService => match service {
                ServiceType::Air => StepIcon::Plane,
                ServiceType::Ocean => StepIcon::Ship,
                _ => StepIcon::Truck,
            },
        }
    }

    /// The current step reads `currentLocation`; other steps read the latest
    /// history entry recorded for their status.
    pub fn location_for(&self, shipment: &ShipmentRecord, is_current: bool) -> String {
        match self.location {
            LocationRule::SenderAddress => shipment.sender_address.clone(),
            LocationRule::ReceiverAddress => shipment.receiver_address.clone(),
            LocationRule::Recorded(fallback) => {
                let recorded = if is_current {
                    shipment.current_location.as_deref()
                } else {
                    shipment
                        .status_history
                        .iter()
                        .rev()
                        .find(|e| e.canonical_status() == Some(self.status))
                        .map(|e| e.location.as_str())
                };

                recorded
                    .map(str::trim)
                    .filter(|loc| !loc.is_empty())
                    .unwrap_or(fallback)
                    .to_string()
            }
        }
    }
}

pub const STEPS: &[StepDefinition] = &[
    StepDefinition {
        status: ShipmentStatus::OrderPlaced,
        id: "order-placed",
        title: "Order Placed",
        icon: IconRule::Fixed(StepIcon::Clipboard),
        location: LocationRule::Recorded("Processing Center"),
        description: "Your order has been received and is awaiting pickup",
    },
    StepDefinition {
        status: ShipmentStatus::Dispatched,
        id: "dispatched",
        title: "Package Dispatched",
        icon: IconRule::Fixed(StepIcon::Package),
        location: LocationRule::SenderAddress,
        description: "Your package has been picked up and is being prepared for transit",
    },
    StepDefinition {
        status: ShipmentStatus::InTransit,
        id: "in-transit",
        title: "In Transit",
        icon: IconRule::ByService,
        location: LocationRule::Recorded("En Route"),
        description: "Package is on its way to the destination",
    },
    StepDefinition {
        status: ShipmentStatus::AtSortingCenter,
        id: "sorting",
        title: "At Sorting Center",
        icon: IconRule::Fixed(StepIcon::MapPin),
        location: LocationRule::Recorded("Distribution Hub"),
        description: "Package is being sorted at our distribution center",
    },
    StepDefinition {
        status: ShipmentStatus::OutForDelivery,
        id: "out-delivery",
        title: "Out for Delivery",
        icon: IconRule::Fixed(StepIcon::Truck),
        location: LocationRule::Recorded("Near Destination"),
        description: "Package is out for final delivery",
    },
    StepDefinition {
        status: ShipmentStatus::Delivered,
        id: "delivered",
        title: "Delivered",
        icon: IconRule::Fixed(StepIcon::Package),
        location: LocationRule::ReceiverAddress,
        description: "Package has been successfully delivered",
    },
];

/// `None` for labels outside the lookup table.
pub fn resolve_step_index(status: &str) -> Option<usize> {
    ShipmentStatus::from_label(status).map(ShipmentStatus::step_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShipmentRecord, StatusHistoryEntry};
    use chrono::{TimeZone, Utc};
    use strum::{EnumCount, IntoEnumIterator};

    fn shipment() -> ShipmentRecord {
        crate::domain::fixtures::record("In Transit", "2024-01-01", Some(3))
    }

    #[test]
    fn table_has_one_step_per_status_in_order() {
        assert_eq!(STEPS.len(), ShipmentStatus::COUNT);
        for (step, status) in STEPS.iter().zip(ShipmentStatus::iter()) {
            assert_eq!(step.status, status);
            assert_eq!(step.status.step_index(), status.step_index());
        }
    }

    #[test]
    fn transit_icon_follows_service_type() {
        let transit = &STEPS[2];
        assert_eq!(transit.icon_for(ServiceType::Air), StepIcon::Plane);
        assert_eq!(transit.icon_for(ServiceType::Ocean), StepIcon::Ship);
        assert_eq!(transit.icon_for(ServiceType::Ground), StepIcon::Truck);
        assert_eq!(transit.icon_for(ServiceType::Express), StepIcon::Truck);
        assert_eq!(STEPS[3].icon_for(ServiceType::Air), StepIcon::MapPin);
    }

    #[test]
    fn current_step_prefers_live_location() {
        let mut s = shipment();
        assert_eq!(STEPS[2].location_for(&s, true), "En Route");

        s.current_location = Some("M6 near Preston".to_string());
        assert_eq!(STEPS[2].location_for(&s, true), "M6 near Preston");

        s.current_location = Some("   ".to_string());
        assert_eq!(STEPS[2].location_for(&s, true), "En Route");
    }

    #[test]
    fn completed_steps_read_their_history_entry() {
        let mut s = shipment();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        s.status_history
            .push(StatusHistoryEntry::new(ShipmentStatus::OrderPlaced, "Portsmouth Hub", at));
        s.current_location = Some("A3 northbound".to_string());

        assert_eq!(STEPS[0].location_for(&s, false), "Portsmouth Hub");
        assert_eq!(STEPS[3].location_for(&s, false), "Distribution Hub");
    }

    #[test]
    fn address_steps_use_shipment_addresses() {
        let s = shipment();
        assert_eq!(STEPS[1].location_for(&s, false), "12 Harbour Road");
        assert_eq!(STEPS[5].location_for(&s, true), "1 Dorset Street");
    }

    #[test]
    fn unknown_labels_do_not_resolve() {
        assert_eq!(resolve_step_index("Delivered"), Some(5));
        assert_eq!(resolve_step_index("sorting"), Some(3));
        assert_eq!(resolve_step_index("Held at customs"), None);
    }
}
