use crate::models::ProgressResult;

/// What a tracking view receives after each relevant change.
#[derive(Debug, Clone)]
pub enum TrackingUpdate {
    /// A fresh projection of the watched shipment.
    Progress(Box<ProgressResult>),

    /// The record exists but cannot be projected (or could not be read).
    Unavailable {
        tracking_number: String,
        reason: String,
    },

    NotFound(String),
}

impl TrackingUpdate {
    pub fn tracking_number(&self) -> &str {
        match self {
            Self::Progress(p) => &p.tracking_number,
            Self::Unavailable { tracking_number, .. } => tracking_number,
            Self::NotFound(tracking_number) => tracking_number,
        }
    }

    pub fn progress(&self) -> Option<&ProgressResult> {
        match self {
            Self::Progress(p) => Some(p),
            _ => None,
        }
    }
}
