use {
    crate::{
        config::TransitionPolicy,
        domain::{ShipmentRecord, ShipmentStatus, StatusHistoryEntry},
        error::TrackingError,
        utils::parse_timestamp,
    },
    anyhow::Result,
    async_trait::async_trait,
    std::cmp::Reverse,
    tokio::sync::broadcast,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    StatusAppended(Option<ShipmentStatus>),
    Deleted,
}

/// Pushed whenever a record or its history changes. Carries no payload:
/// listeners re-fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentEvent {
    pub tracking_number: String,
    pub kind: ChangeKind,
}

/// Broadcast side of the change-notification collaborator.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ShipmentEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, tracking_number: &str, kind: ChangeKind) {
        // No subscribers is not an error.
        let _ = self.tx.send(ShipmentEvent {
            tracking_number: tracking_number.to_string(),
            kind,
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShipmentEvent> {
        self.tx.subscribe()
    }
}

/// Orders records newest first by `createdAt`. Unreadable timestamps sort last.
pub(crate) fn sort_newest_first(records: &mut [ShipmentRecord]) {
    records.sort_by_key(|r| Reverse(parse_timestamp(&r.created_at)));
}

// --- TRAIT DEFINITION ---

/// Abstract interface for shipment storage (SQLite vs JSON document store)
///
/// Domain failures (`NotFound`, `DuplicateTrackingNumber`, `IllegalTransition`,
/// `OutOfOrderHistory`)
/// travel inside the `anyhow::Error` as a `TrackingError` and can be
/// recovered with `downcast_ref`.
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    async fn initialize(&self) -> Result<()>;

    /// Exact string match on the tracking number.
    async fn find_by_tracking_number(&self, tracking_number: &str)
    -> Result<Option<ShipmentRecord>>;

    /// Newest first.
    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>>;

    async fn insert_shipment(&self, shipment: ShipmentRecord) -> Result<()>;

    /// Appends to the history and moves `status`/`currentLocation` with it.
    /// `policy` is checked against the stored status inside the same write,
    /// so concurrent updates cannot slip a backward move past it.
    async fn append_status(
        &self,
        tracking_number: &str,
        entry: StatusHistoryEntry,
        policy: TransitionPolicy,
    ) -> Result<ShipmentRecord>;

    /// Removes the record and its history.
    async fn delete_shipment(&self, tracking_number: &str) -> Result<()>;

    fn subscribe(&self) -> broadcast::Receiver<ShipmentEvent>;

    /// Like `find_by_tracking_number`, with absence as `TrackingError::NotFound`.
    async fn get_shipment(&self, tracking_number: &str) -> Result<ShipmentRecord> {
        self.find_by_tracking_number(tracking_number)
            .await?
            .ok_or_else(|| TrackingError::NotFound(tracking_number.to_string()).into())
    }
}
