use thiserror::Error;

use crate::domain::ShipmentStatus;

/// Failures the tracking core and its collaborators can report.
///
/// None of these are fatal to the process. `Data` renders as
/// "status unavailable" and `NotFound` as "shipment not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("invalid {field}: {reason}")]
    Data { field: &'static str, reason: String },

    #[error("unknown shipment status '{0}'")]
    UnknownStatus(String),

    #[error("no shipment with tracking number '{0}'")]
    NotFound(String),

    #[error("status cannot move from '{from}' back to '{to}'")]
    IllegalTransition {
        from: ShipmentStatus,
        to: ShipmentStatus,
    },

    #[error("tracking number '{0}' already exists")]
    DuplicateTrackingNumber(String),

    #[error("history entry at {new} is older than the last entry at {last}")]
    OutOfOrderHistory { last: String, new: String },

    #[error("{0}")]
    Validation(String),
}

impl TrackingError {
    pub(crate) fn data(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Data {
            field,
            reason: reason.into(),
        }
    }

    /// True when the display should fall back to the "status unavailable" state.
    pub fn is_status_unavailable(&self) -> bool {
        matches!(self, Self::Data { .. })
    }
}
