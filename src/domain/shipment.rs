use {
    crate::{
        config::{DeliveryDays, TransitionPolicy},
        domain::{ServiceType, ShipmentStatus, StatusHistoryEntry},
        error::TrackingError,
        utils::{parse_date, parse_timestamp},
    },
    chrono::{DateTime, NaiveDate, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// A shipment as the persistence collaborator hands it over.
///
/// `status`, `created_at` and `estimated_delivery` stay raw strings: the
/// record is consumed, not owned, and the progress model decides what to do
/// with values it cannot read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRecord {
    pub id: Uuid,
    pub tracking_number: String,
    pub status: String,
    pub created_at: String,
    pub delivery_days: Option<u32>,
    pub estimated_delivery: Option<String>,

    pub sender_name: String,
    pub sender_address: String,
    pub sender_city: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub receiver_city: String,
    pub customer_email: Option<String>,
    pub current_location: Option<String>,

    pub service_type: ServiceType,
    pub weight: Option<String>,
    pub fee: Option<f64>,
    /// Declared value as entered, e.g. `"250"` or `"$1,200"`.
    pub declared_value: Option<String>,
    pub description: Option<String>,
    pub held_by_customs: bool,

    pub status_history: Vec<StatusHistoryEntry>,
}

impl ShipmentRecord {
    pub fn canonical_status(&self) -> Option<ShipmentStatus> {
        ShipmentStatus::from_label(&self.status)
    }

    pub fn parsed_created_at(&self) -> Result<DateTime<Utc>, TrackingError> {
        parse_timestamp(&self.created_at).ok_or_else(|| {
            TrackingError::data(
                "createdAt",
                format!("'{}' is not a recognised timestamp", self.created_at),
            )
        })
    }

    /// Absent, zero or oversized durations fall back to `fallback`.
    pub fn effective_delivery_days(&self, fallback: DeliveryDays) -> DeliveryDays {
        self.delivery_days
            .and_then(DeliveryDays::new)
            .unwrap_or(fallback)
    }

    /// The explicit override, when present and readable.
    pub fn estimated_delivery_override(&self) -> Option<NaiveDate> {
        self.estimated_delivery.as_deref().and_then(parse_date)
    }

    pub fn last_history_entry(&self) -> Option<&StatusHistoryEntry> {
        self.status_history.last()
    }

    /// Applies a status change the way the admin action does: append, then
    /// update the top-level `status` and `currentLocation`.
    ///
    /// Both labels must be known for `policy` to apply; a record whose status
    /// is unreadable may move anywhere.
    pub fn apply_status_entry(
        &mut self,
        entry: StatusHistoryEntry,
        policy: TransitionPolicy,
    ) -> Result<(), TrackingError> {
        if let (Some(from), Some(to)) = (self.canonical_status(), ShipmentStatus::from_label(&entry.status)) {
            if !policy.permits(from.step_index(), to.step_index()) {
                return Err(TrackingError::IllegalTransition { from, to });
            }
        }

        if let Some(last) = self.last_history_entry() {
            if let (Some(prev), Some(new)) = (last.recorded_at(), entry.recorded_at()) {
                if new < prev {
                    return Err(TrackingError::OutOfOrderHistory {
                        last: prev.to_string(),
                        new: new.to_string(),
                    });
                }
            }
        }

        self.status = entry.status.clone();
        self.current_location = Some(entry.location.clone());
        self.status_history.push(entry);
        Ok(())
    }

    /// Customer-facing party fields, `(name, city)` for the receiver.
    pub fn receiver_summary(&self) -> String {
        format!("{} ({})", self.receiver_name, self.receiver_city)
    }
}
