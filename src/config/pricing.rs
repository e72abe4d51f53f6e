//! Fee table for the create-shipment quote.

use crate::domain::ServiceType;

pub struct ServiceRate {
    pub service: ServiceType,
    pub label: &'static str,
    /// Advertised transit window, display only
    pub days_label: &'static str,
    pub base_fee: f64,
}

pub struct DeliveryOption {
    pub days: u32,
    pub label: &'static str,
    pub multiplier: f64,
}

pub struct PricingConfig {
    pub fee_per_kg: f64,
    pub services: &'static [ServiceRate],
    pub delivery_options: &'static [DeliveryOption],
}

impl PricingConfig {
    pub fn service_rate(&self, service: ServiceType) -> Option<&ServiceRate> {
        self.services.iter().find(|r| r.service == service)
    }

    pub fn delivery_option(&self, days: u32) -> Option<&DeliveryOption> {
        self.delivery_options.iter().find(|o| o.days == days)
    }
}

pub const PRICING: PricingConfig = PricingConfig {
    fee_per_kg: 2.0,
    services: &[
        ServiceRate {
            service: ServiceType::Ground,
            label: "Ground Transport",
            days_label: "5-7",
            base_fee: 25.0,
        },
        ServiceRate {
            service: ServiceType::Air,
            label: "Air Freight",
            days_label: "2-3",
            base_fee: 75.0,
        },
        ServiceRate {
            service: ServiceType::Ocean,
            label: "Ocean Freight",
            days_label: "14-21",
            base_fee: 45.0,
        },
    ],
    delivery_options: &[
        DeliveryOption { days: 1, label: "1 Day Express", multiplier: 3.0 },
        DeliveryOption { days: 2, label: "2 Days", multiplier: 2.0 },
        DeliveryOption { days: 3, label: "3 Days", multiplier: 1.5 },
        DeliveryOption { days: 5, label: "5 Days Standard", multiplier: 1.0 },
        DeliveryOption { days: 7, label: "7 Days Economy", multiplier: 0.8 },
        DeliveryOption { days: 14, label: "14 Days Budget", multiplier: 0.6 },
    ],
};
