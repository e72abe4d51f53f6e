//! Configuration module for the shipment tracker.

// Can all be private now because we have a public re-export.
mod debug;
mod demo;
mod persistence;
mod pricing;
mod tracking;
mod types;

// Public
pub mod constants;

// Re-export commonly used items
pub use debug::DF;
pub use demo::{DEMO, DemoConfig, DemoShipment};
pub use persistence::{PERSISTENCE, PersistenceConfig};
pub use pricing::{DeliveryOption, PRICING, PricingConfig, ServiceRate};
pub use tracking::{TRACKING, TrackingConfig, TransitionPolicy};
pub use types::{DeliveryDays, Pct};
