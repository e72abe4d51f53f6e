use {
    super::messages::TrackingUpdate,
    crate::{
        config::{PERSISTENCE, TrackingConfig},
        data::{ShipmentEvent, ShipmentRepository},
        models::compute_progress_with,
        utils::now_utc,
    },
    std::sync::{Arc, Weak},
    tokio::{
        sync::{
            broadcast::{self, error::RecvError},
            mpsc,
        },
        task::JoinHandle,
    },
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Live tracking for one shipment.
///
/// A background task listens to the repository's change feed and, for every
/// event naming the watched tracking number, re-fetches the record and sends a
/// fresh projection. The task holds the repository weakly: dropping the last
/// `Arc` closes the feed and ends the watch, as does dropping the update
/// receiver.
pub struct TrackingWatcher {
    tracking_number: String,
    handle: JoinHandle<()>,
}

impl TrackingWatcher {
    pub fn spawn<R>(
        repo: &Arc<R>,
        tracking_number: impl Into<String>,
        config: TrackingConfig,
    ) -> (Self, mpsc::Receiver<TrackingUpdate>)
    where
        R: ShipmentRepository + ?Sized + 'static,
    {
        let tracking_number = tracking_number.into();
        let (tx, rx) = mpsc::channel(PERSISTENCE.change_feed_capacity);

        // Subscribe before the first fetch so nothing slips between them.
        let events = repo.subscribe();
        let handle = tokio::spawn(watch_loop(
            Arc::downgrade(repo),
            tracking_number.clone(),
            config,
            events,
            tx,
        ));

        (
            Self {
                tracking_number,
                handle,
            },
            rx,
        )
    }

    pub fn tracking_number(&self) -> &str {
        &self.tracking_number
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Waits for the watch to end on its own.
    pub async fn finished(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                log::error!("Watcher for {} failed: {}", self.tracking_number, e);
            }
        }
    }
}

async fn watch_loop<R>(
    repo: Weak<R>,
    tracking_number: String,
    config: TrackingConfig,
    mut events: broadcast::Receiver<ShipmentEvent>,
    tx: mpsc::Sender<TrackingUpdate>,
) where
    R: ShipmentRepository + ?Sized,
{
    if !refresh(&repo, &tracking_number, &config, &tx).await {
        return;
    }

    loop {
        let event = tokio::select! {
            _ = tx.closed() => break,
            event = events.recv() => event,
        };

        match event {
            Ok(ev) if ev.tracking_number == tracking_number => {
                #[cfg(debug_assertions)]
                if DF.log_watcher {
                    log::info!("WATCHER: {} changed ({:?})", tracking_number, ev.kind);
                }
            }
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                // Whatever was missed, one re-fetch catches up.
                log::warn!("Watcher for {} lagged by {} events", tracking_number, skipped);
            }
            Err(RecvError::Closed) => break,
        }

        if !refresh(&repo, &tracking_number, &config, &tx).await {
            break;
        }
    }

    #[cfg(debug_assertions)]
    if DF.log_watcher {
        log::info!("WATCHER: stopped watching {}", tracking_number);
    }
}

/// Re-fetches and sends one update. `false` once nobody is listening or the
/// repository is gone.
async fn refresh<R>(
    repo: &Weak<R>,
    tracking_number: &str,
    config: &TrackingConfig,
    tx: &mpsc::Sender<TrackingUpdate>,
) -> bool
where
    R: ShipmentRepository + ?Sized,
{
    let Some(repo) = repo.upgrade() else {
        return false;
    };

    let update = match repo.find_by_tracking_number(tracking_number).await {
        Ok(Some(record)) => match compute_progress_with(&record, now_utc(), config) {
            Ok(progress) => TrackingUpdate::Progress(Box::new(progress)),
            Err(e) => TrackingUpdate::Unavailable {
                tracking_number: tracking_number.to_string(),
                reason: e.to_string(),
            },
        },
        Ok(None) => TrackingUpdate::NotFound(tracking_number.to_string()),
        Err(e) => {
            log::warn!("Watcher failed to fetch {}: {:#}", tracking_number, e);
            TrackingUpdate::Unavailable {
                tracking_number: tracking_number.to_string(),
                reason: e.to_string(),
            }
        }
    };
    drop(repo);

    tx.send(update).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TransitionPolicy,
        data::JsonShipmentRepository,
        domain::{ShipmentRecord, ShipmentStatus, StatusHistoryEntry, fixtures::record},
    };
    use std::time::Duration;
    use tokio::time::timeout;

    fn shipment(tracking_number: &str) -> ShipmentRecord {
        let created = now_utc().to_rfc3339();
        let mut r = record("Order Placed", &created, Some(3));
        r.tracking_number = tracking_number.to_string();
        r
    }

    async fn next(rx: &mut mpsc::Receiver<TrackingUpdate>) -> Option<TrackingUpdate> {
        timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("watcher went quiet")
    }

    #[tokio::test]
    async fn follows_status_changes_of_its_own_shipment() {
        let repo = Arc::new(JsonShipmentRepository::in_memory());
        repo.insert_shipment(shipment("SP1")).await.unwrap();

        let (watcher, mut rx) = TrackingWatcher::spawn(&repo, "SP1", TrackingConfig::default());
        assert_eq!(watcher.tracking_number(), "SP1");

        let first = next(&mut rx).await.unwrap();
        assert_eq!(first.progress().unwrap().step_index, 0);

        // Unrelated traffic is filtered out.
        repo.insert_shipment(shipment("SP2")).await.unwrap();

        let entry = StatusHistoryEntry::new(ShipmentStatus::Dispatched, "Depot", now_utc());
        repo.append_status("SP1", entry, TransitionPolicy::STRICT).await.unwrap();

        let second = next(&mut rx).await.unwrap();
        assert_eq!(second.tracking_number(), "SP1");
        assert_eq!(second.progress().unwrap().step_index, 1);

        repo.delete_shipment("SP1").await.unwrap();
        assert!(matches!(next(&mut rx).await, Some(TrackingUpdate::NotFound(n)) if n == "SP1"));

        watcher.stop();
    }

    #[tokio::test]
    async fn unknown_shipment_and_bad_records_are_reported() {
        let mut broken = shipment("SP-BAD");
        broken.created_at = "garbage".to_string();
        let repo = Arc::new(JsonShipmentRepository::with_records(vec![broken]));

        let (_w1, mut missing) = TrackingWatcher::spawn(&repo, "SP404", TrackingConfig::default());
        assert!(matches!(next(&mut missing).await, Some(TrackingUpdate::NotFound(_))));

        let (_w2, mut bad) = TrackingWatcher::spawn(&repo, "SP-BAD", TrackingConfig::default());
        assert!(matches!(
            next(&mut bad).await,
            Some(TrackingUpdate::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn ends_when_the_repository_goes_away() {
        let repo = Arc::new(JsonShipmentRepository::in_memory());
        repo.insert_shipment(shipment("SP1")).await.unwrap();

        let (watcher, mut rx) = TrackingWatcher::spawn(&repo, "SP1", TrackingConfig::default());
        assert!(next(&mut rx).await.is_some());

        drop(repo);
        assert!(next(&mut rx).await.is_none());
        timeout(Duration::from_secs(5), watcher.finished()).await.unwrap();
    }

    #[tokio::test]
    async fn ends_when_the_receiver_is_dropped() {
        let repo = Arc::new(JsonShipmentRepository::in_memory());
        let (watcher, rx) = TrackingWatcher::spawn(&repo, "SP1", TrackingConfig::default());
        drop(rx);

        timeout(Duration::from_secs(5), watcher.finished()).await.unwrap();
    }
}
