use {
    crate::{
        config::{PERSISTENCE, TransitionPolicy},
        data::repository::{ChangeFeed, ChangeKind, ShipmentEvent, ShipmentRepository, sort_newest_first},
        domain::{ShipmentRecord, StatusHistoryEntry},
        error::TrackingError,
    },
    anyhow::{Context, Result},
    async_trait::async_trait,
    itertools::Itertools,
    sqlx::{
        Row, SqliteConnection,
        sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
            SqliteSynchronous,
        },
    },
    std::{collections::HashMap, str::FromStr, time::Duration},
    tokio::sync::broadcast,
    uuid::Uuid,
};

#[cfg(debug_assertions)]
use crate::config::DF;

const SHIPMENT_COLUMNS: &str = "id, tracking_number, status, created_at, delivery_days, \
    estimated_delivery, sender_name, sender_address, sender_city, receiver_name, \
    receiver_address, receiver_city, customer_email, current_location, service_type, weight, \
    fee, declared_value, description, held_by_customs";

const ADDED_COLUMNS: [&str; 2] = ["customer_email", "declared_value"];

/// Relational backend: one row per shipment plus an ordered `status_history` table.
pub struct SqliteShipmentRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl SqliteShipmentRepository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let connection_options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(PERSISTENCE.busy_timeout_secs))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(PERSISTENCE.max_connections)
            .connect_with(connection_options)
            .await
            .with_context(|| format!("Failed to connect to {}", db_path))?;

        let repo = Self {
            pool,
            feed: ChangeFeed::new(PERSISTENCE.change_feed_capacity),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    /// A private database that lives as long as the repository.
    pub async fn in_memory() -> Result<Self> {
        // One connection that never recycles, or the database vanishes.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let repo = Self {
            pool,
            feed: ChangeFeed::new(PERSISTENCE.change_feed_capacity),
        };
        repo.initialize().await?;
        Ok(repo)
    }

    fn record_from_row(row: &SqliteRow, history: Vec<StatusHistoryEntry>) -> Result<ShipmentRecord> {
        let tracking_number: String = row.try_get("tracking_number")?;
        let id: String = row.try_get("id")?;
        let delivery_days: Option<i64> = row.try_get("delivery_days")?;
        let service_type: String = row.try_get("service_type")?;

        Ok(ShipmentRecord {
            id: Uuid::parse_str(&id)
                .with_context(|| format!("Corrupt id for shipment {}", tracking_number))?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
            delivery_days: delivery_days.and_then(|d| u32::try_from(d).ok()),
            estimated_delivery: row.try_get("estimated_delivery")?,
            sender_name: row.try_get("sender_name")?,
            sender_address: row.try_get("sender_address")?,
            sender_city: row.try_get("sender_city")?,
            receiver_name: row.try_get("receiver_name")?,
            receiver_address: row.try_get("receiver_address")?,
            receiver_city: row.try_get("receiver_city")?,
            customer_email: row.try_get("customer_email")?,
            current_location: row.try_get("current_location")?,
            service_type: service_type.parse().unwrap_or_default(),
            weight: row.try_get("weight")?,
            fee: row.try_get("fee")?,
            declared_value: row.try_get("declared_value")?,
            description: row.try_get("description")?,
            held_by_customs: row.try_get("held_by_customs")?,
            status_history: history,
            tracking_number,
        })
    }

    fn history_from_row(row: &SqliteRow) -> Result<StatusHistoryEntry> {
        Ok(StatusHistoryEntry {
            status: row.try_get("status")?,
            location: row.try_get("location")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
        })
    }

    async fn load_record(
        conn: &mut SqliteConnection,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>> {
        let sql = format!("SELECT {} FROM shipments WHERE tracking_number = ?", SHIPMENT_COLUMNS);
        let Some(row) = sqlx::query(&sql)
            .bind(tracking_number)
            .fetch_optional(&mut *conn)
            .await?
        else {
            return Ok(None);
        };

        let history = sqlx::query(
            "SELECT status, location, date, time FROM status_history
             WHERE tracking_number = ? ORDER BY seq ASC",
        )
        .bind(tracking_number)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(Self::history_from_row)
        .collect::<Result<Vec<_>>>()?;

        Self::record_from_row(&row, history).map(Some)
    }

    async fn insert_history_entry(
        conn: &mut SqliteConnection,
        tracking_number: &str,
        seq: usize,
        entry: &StatusHistoryEntry,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO status_history (tracking_number, seq, status, location, date, time)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(tracking_number)
        .bind(seq as i64)
        .bind(&entry.status)
        .bind(&entry.location)
        .bind(&entry.date)
        .bind(&entry.time)
        .execute(&mut *conn)
        .await
        .context("Failed to insert status history entry")?;
        Ok(())
    }
}

#[async_trait]
impl ShipmentRepository for SqliteShipmentRepository {
    async fn initialize(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS shipments (
                tracking_number TEXT PRIMARY KEY,
                id TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                delivery_days INTEGER,
                estimated_delivery TEXT,
                sender_name TEXT NOT NULL,
                sender_address TEXT NOT NULL,
                sender_city TEXT NOT NULL,
                receiver_name TEXT NOT NULL,
                receiver_address TEXT NOT NULL,
                receiver_city TEXT NOT NULL,
                customer_email TEXT,
                current_location TEXT,
                service_type TEXT NOT NULL,
                weight TEXT,
                fee REAL,
                declared_value TEXT,
                description TEXT,
                held_by_customs BOOLEAN NOT NULL DEFAULT 0
            );",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create shipments table")?;

        // Databases created before these columns existed.
        let existing: Vec<String> = sqlx::query("SELECT name FROM pragma_table_info('shipments')")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| row.try_get("name"))
            .collect::<Result<_, _>>()?;
        for column in ADDED_COLUMNS {
            if !existing.iter().any(|name| name == column) {
                sqlx::query(&format!("ALTER TABLE shipments ADD COLUMN {} TEXT", column))
                    .execute(&self.pool)
                    .await
                    .with_context(|| format!("Failed to add column {}", column))?;
            }
        }

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS status_history (
                tracking_number TEXT NOT NULL,
                seq INTEGER NOT NULL,
                status TEXT NOT NULL,
                location TEXT NOT NULL,
                date TEXT NOT NULL,
                time TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (tracking_number, seq)
            );",
        )
        .execute(&self.pool)
        .await
        .context("Failed to create status_history table")?;

        Ok(())
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &str,
    ) -> Result<Option<ShipmentRecord>> {
        let mut conn = self.pool.acquire().await?;
        Self::load_record(&mut conn, tracking_number).await
    }

    async fn list_shipments(&self) -> Result<Vec<ShipmentRecord>> {
        let sql = format!("SELECT {} FROM shipments", SHIPMENT_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;

        let history_rows = sqlx::query(
            "SELECT tracking_number, status, location, date, time FROM status_history
             ORDER BY tracking_number, seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut histories: HashMap<String, Vec<StatusHistoryEntry>> = history_rows
            .iter()
            .map(|row| -> Result<(String, StatusHistoryEntry)> {
                let tracking_number: String = row.try_get("tracking_number")?;
                Ok((tracking_number, Self::history_from_row(row)?))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .into_group_map();

        let mut records = rows
            .iter()
            .map(|row| -> Result<ShipmentRecord> {
                let tracking_number: String = row.try_get("tracking_number")?;
                let history = histories.remove(&tracking_number).unwrap_or_default();
                Self::record_from_row(row, history)
            })
            .collect::<Result<Vec<_>>>()?;

        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn insert_shipment(&self, shipment: ShipmentRecord) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT 1 FROM shipments WHERE tracking_number = ?")
            .bind(&shipment.tracking_number)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if exists {
            return Err(TrackingError::DuplicateTrackingNumber(shipment.tracking_number).into());
        }

        let sql = format!(
            "INSERT INTO shipments ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            SHIPMENT_COLUMNS
        );
        sqlx::query(&sql)
            .bind(shipment.id.to_string())
            .bind(&shipment.tracking_number)
            .bind(&shipment.status)
            .bind(&shipment.created_at)
            .bind(shipment.delivery_days.map(i64::from))
            .bind(&shipment.estimated_delivery)
            .bind(&shipment.sender_name)
            .bind(&shipment.sender_address)
            .bind(&shipment.sender_city)
            .bind(&shipment.receiver_name)
            .bind(&shipment.receiver_address)
            .bind(&shipment.receiver_city)
            .bind(&shipment.customer_email)
            .bind(&shipment.current_location)
            .bind(shipment.service_type.to_string())
            .bind(&shipment.weight)
            .bind(shipment.fee)
            .bind(&shipment.declared_value)
            .bind(&shipment.description)
            .bind(shipment.held_by_customs)
            .execute(&mut *tx)
            .await
            .context("Failed to insert shipment")?;

        for (seq, entry) in shipment.status_history.iter().enumerate() {
            Self::insert_history_entry(&mut tx, &shipment.tracking_number, seq, entry).await?;
        }

        tx.commit().await?;

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!(
                "SQLITE: Inserted {} ({} history entries)",
                shipment.tracking_number,
                shipment.status_history.len()
            );
        }

        self.feed.publish(&shipment.tracking_number, ChangeKind::Created);
        Ok(())
    }

    async fn append_status(
        &self,
        tracking_number: &str,
        entry: StatusHistoryEntry,
        policy: TransitionPolicy,
    ) -> Result<ShipmentRecord> {
        let mut tx = self.pool.begin().await?;

        let mut record = Self::load_record(&mut tx, tracking_number)
            .await?
            .ok_or_else(|| TrackingError::NotFound(tracking_number.to_string()))?;

        let seq = record.status_history.len();
        record.apply_status_entry(entry.clone(), policy)?;

        Self::insert_history_entry(&mut tx, tracking_number, seq, &entry).await?;
        sqlx::query("UPDATE shipments SET status = ?, current_location = ? WHERE tracking_number = ?")
            .bind(&record.status)
            .bind(&record.current_location)
            .bind(tracking_number)
            .execute(&mut *tx)
            .await
            .context("Failed to update shipment status")?;

        tx.commit().await?;

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!(
                "SQLITE: {} -> '{}' at '{}'",
                tracking_number,
                entry.status,
                entry.location
            );
        }

        self.feed.publish(
            tracking_number,
            ChangeKind::StatusAppended(record.canonical_status()),
        );
        Ok(record)
    }

    async fn delete_shipment(&self, tracking_number: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM status_history WHERE tracking_number = ?")
            .bind(tracking_number)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM shipments WHERE tracking_number = ?")
            .bind(tracking_number)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            // Dropping the transaction rolls it back.
            return Err(TrackingError::NotFound(tracking_number.to_string()).into());
        }
        tx.commit().await?;

        #[cfg(debug_assertions)]
        if DF.log_repository {
            log::info!("SQLITE: Deleted {}", tracking_number);
        }

        self.feed.publish(tracking_number, ChangeKind::Deleted);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ShipmentEvent> {
        self.feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ShipmentStatus, fixtures::record};
    use chrono::{TimeZone, Utc};

    fn shipment(tracking_number: &str, created_at: &str) -> ShipmentRecord {
        let mut r = record("Order Placed", created_at, Some(3));
        r.tracking_number = tracking_number.to_string();
        r.id = Uuid::new_v4();
        r.customer_email = Some("charles@engine.example".to_string());
        r.declared_value = Some("$1,200".to_string());
        r.status_history.push(StatusHistoryEntry {
            status: "Order Placed".to_string(),
            location: "Processing Center".to_string(),
            date: "2024-01-01".to_string(),
            time: "09:00:00".to_string(),
        });
        r
    }

    #[tokio::test]
    async fn older_databases_gain_the_new_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.sqlite");
        let db_path = path.to_str().unwrap();

        {
            let repo = SqliteShipmentRepository::new(db_path).await.unwrap();
            for column in ADDED_COLUMNS {
                sqlx::query(&format!("ALTER TABLE shipments DROP COLUMN {}", column))
                    .execute(&repo.pool)
                    .await
                    .unwrap();
            }
        }

        let repo = SqliteShipmentRepository::new(db_path).await.unwrap();
        let original = shipment("SP1", "2024-01-01T09:00:00Z");
        repo.insert_shipment(original.clone()).await.unwrap();
        assert_eq!(repo.find_by_tracking_number("SP1").await.unwrap(), Some(original));
    }

    #[tokio::test]
    async fn insert_then_find_returns_the_same_record() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        let original = shipment("SP1", "2024-01-01T09:00:00Z");
        repo.insert_shipment(original.clone()).await.unwrap();

        let found = repo.find_by_tracking_number("SP1").await.unwrap();
        assert_eq!(found, Some(original));
        assert_eq!(repo.find_by_tracking_number("sp1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_tracking_numbers_are_rejected() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        repo.insert_shipment(shipment("SP1", "2024-01-01")).await.unwrap();

        let err = repo.insert_shipment(shipment("SP1", "2024-01-02")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackingError>(),
            Some(TrackingError::DuplicateTrackingNumber(_))
        ));
    }

    #[tokio::test]
    async fn append_status_moves_status_and_keeps_history_order() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        repo.insert_shipment(shipment("SP1", "2024-01-01")).await.unwrap();
        let mut events = repo.subscribe();

        let at = Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap();
        let updated = repo
            .append_status(
                "SP1",
                StatusHistoryEntry::new(ShipmentStatus::Dispatched, "Depot", at),
                TransitionPolicy::STRICT,
            )
            .await
            .unwrap();
        assert_eq!(updated.status, "Dispatched");

        let stored = repo.get_shipment("SP1").await.unwrap();
        assert_eq!(stored, updated);
        let statuses: Vec<_> = stored.status_history.iter().map(|e| e.status.as_str()).collect();
        assert_eq!(statuses, ["Order Placed", "Dispatched"]);
        assert_eq!(stored.current_location.as_deref(), Some("Depot"));

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, ChangeKind::StatusAppended(Some(ShipmentStatus::Dispatched)));
    }

    #[tokio::test]
    async fn out_of_order_append_leaves_the_record_untouched() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        repo.insert_shipment(shipment("SP1", "2024-01-01")).await.unwrap();

        let earlier = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        let err = repo
            .append_status(
                "SP1",
                StatusHistoryEntry::new(ShipmentStatus::Dispatched, "Depot", earlier),
                TransitionPolicy::STRICT,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackingError>(),
            Some(TrackingError::OutOfOrderHistory { .. })
        ));

        let stored = repo.get_shipment("SP1").await.unwrap();
        assert_eq!(stored.status, "Order Placed");
        assert_eq!(stored.status_history.len(), 1);
    }

    #[tokio::test]
    async fn list_is_newest_first_with_histories_attached() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        repo.insert_shipment(shipment("SP-OLD", "2024-01-01T00:00:00Z")).await.unwrap();
        repo.insert_shipment(shipment("SP-NEW", "2024-02-01T00:00:00Z")).await.unwrap();

        let listed = repo.list_shipments().await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|r| r.tracking_number.as_str()).collect();
        assert_eq!(numbers, ["SP-NEW", "SP-OLD"]);
        assert!(listed.iter().all(|r| r.status_history.len() == 1));
    }

    #[tokio::test]
    async fn delete_removes_record_and_reports_missing() {
        let repo = SqliteShipmentRepository::in_memory().await.unwrap();
        repo.insert_shipment(shipment("SP1", "2024-01-01")).await.unwrap();

        repo.delete_shipment("SP1").await.unwrap();
        assert_eq!(repo.find_by_tracking_number("SP1").await.unwrap(), None);

        let err = repo.delete_shipment("SP1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrackingError>(),
            Some(TrackingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn file_backed_database_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shipments.sqlite");
        let path = path.to_str().unwrap();

        {
            let repo = SqliteShipmentRepository::new(path).await.unwrap();
            repo.insert_shipment(shipment("SP1", "2024-01-01")).await.unwrap();
            repo.pool.close().await;
        }

        let reopened = SqliteShipmentRepository::new(path).await.unwrap();
        assert!(reopened.find_by_tracking_number("SP1").await.unwrap().is_some());
    }
}
