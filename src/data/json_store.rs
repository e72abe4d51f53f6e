use {
    crate::{
        config::{PERSISTENCE, TransitionPolicy},
        data::{
            document::parse_documents,
            repository::{ChangeFeed, ChangeKind, ShipmentEvent, ShipmentRepository, sort_newest_first},
        },
        domain::{ShipmentRecord, StatusHistoryEntry},
        error::TrackingError,
    },
    anyhow::{Context, Result},
    async_trait::async_trait,
    std::path::{Path, PathBuf},
    tokio::sync::{RwLock, broadcast},
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Document-style backend: the whole collection lives in one JSON array, the
/// way the browser's local storage held it. Legacy documents are normalized
/// on load and written back in canonical form on the next mutation.
pub struct JsonShipmentRepository {
    path: Option<PathBuf>,
    records: RwLock<Vec<ShipmentRecord>>,
    feed: ChangeFeed,
}

impl JsonShipmentRepository {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = match tokio::fs::read_to_string(&path).await {
            Ok(json) if json.trim().is_empty() => Vec::new(),
            Ok(json) => parse_documents(&json)
                .with_context(|| format!("Failed to read {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open {}", path.display()));
            }
        };

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!("JSON: Loaded {} shipments from {}", records.len(), path.display());
        }

        let repo = Self {
            path: Some(path),
            records: RwLock::new(records),
            feed: ChangeFeed::new(PERSISTENCE.change_feed_capacity),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Nothing touches the disk.
    pub fn in_memory() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<ShipmentRecord>) -> Self {
        Self {
            path: None,
            records: RwLock::new(records),
            feed: ChangeFeed::new(PERSISTENCE.change_feed_capacity),
        }
    }

    async fn persist(&self, records: &[ShipmentRecord]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(records)?;
        // Write-then-rename so a crash never leaves half a file behind.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl ShipmentRepository for JsonShipmentRepository {
    async fn initialize(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if !tokio::fs::try_exists(path).await.unwrap_or(false) {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                let records = self.records.read().await;
                self.persist(&records).await?;
            }
        }
        Ok(())
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .find(|r| r.tracking_number == tracking_number)
            .cloned())
    }

    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>> {
        let mut records = self.records.read().await.clone();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn insert_shipment(&self, shipment: ShipmentRecord) -> Result<()> {
        let tracking_number = shipment.tracking_number.clone();
        {
            let mut records = self.records.write().await;
            if records.iter().any(|r| r.tracking_number == tracking_number) {
                return Err(TrackingError::DuplicateTrackingNumber(tracking_number).into());
            }

            records.push(shipment);
            if let Err(e) = self.persist(&records).await {
                records.pop();
                return Err(e);
            }
        }

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!("JSON: Inserted {}", tracking_number);
        }

        self.feed.publish(&tracking_number, ChangeKind::Created);
        Ok(())
    }

    async fn append_status(
        &self,
        tracking_number: &str,
        entry: StatusHistoryEntry,
        policy: TransitionPolicy,
    ) -> Result<ShipmentRecord> {
        let updated = {
            let mut records = self.records.write().await;
            let index = records
                .iter()
                .position(|r| r.tracking_number == tracking_number)
                .ok_or_else(|| TrackingError::NotFound(tracking_number.to_string()))?;

            let previous = records[index].clone();
            records[index].apply_status_entry(entry, policy)?;

            if let Err(e) = self.persist(&records).await {
                records[index] = previous;
                return Err(e);
            }
            records[index].clone()
        };

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!("JSON: {} -> '{}'", tracking_number, updated.status);
        }

        self.feed.publish(
            tracking_number,
            ChangeKind::StatusAppended(updated.canonical_status()),
        );
        Ok(updated)
    }

    async fn delete_shipment(&self, tracking_number: &str) -> Result<()> {
        {
            let mut records = self.records.write().await;
            let index = records
                .iter()
                .position(|r| r.tracking_number == tracking_number)
                .ok_or_else(|| TrackingError::NotFound(tracking_number.to_string()))?;

            let removed = records.remove(index);
            if let Err(e) = self.persist(&records).await {
                records.insert(index, removed);
                return Err(e);
            }
        }

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!("JSON: Deleted {}", tracking_number);
        }

        self.feed.publish(tracking_number, ChangeKind::Deleted);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ShipmentEvent> {
        self.feed.subscribe()
    }
}
