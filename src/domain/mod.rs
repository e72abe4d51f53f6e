// Domain types and value objects
mod history;
mod service_type;
mod shipment;
mod status;
mod tracking_number;

// Re-export commonly used types
pub use history::{HistoryIssue, StatusHistoryEntry, audit_history};
pub use service_type::ServiceType;
pub use shipment::ShipmentRecord;
pub use status::{STATUS_LABELS, ShipmentStatus};
pub use tracking_number::{format_tracking_number, generate_tracking_number};

#[cfg(test)]
pub(crate) use shipment::fixtures;
