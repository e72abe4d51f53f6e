use {
    crate::{
        admin::NewShipment,
        config::{TransitionPolicy, constants::INITIAL_LOCATION},
        data::ShipmentRepository,
        domain::{ShipmentRecord, ShipmentStatus, StatusHistoryEntry, generate_tracking_number},
        error::TrackingError,
    },
    anyhow::Result,
    chrono::{DateTime, Duration, SecondsFormat, Utc},
    std::sync::Arc,
    uuid::Uuid,
};

#[cfg(debug_assertions)]
use crate::config::DF;

/// Fresh numbers collide only within the same millisecond window.
const TRACKING_NUMBER_ATTEMPTS: usize = 5;

/// Case-insensitive substring match on tracking number, receiver name or
/// receiver city. An empty term matches everything.
pub fn matches_search(record: &ShipmentRecord, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    [
        &record.tracking_number,
        &record.receiver_name,
        &record.receiver_city,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// The admin actions, as a service over any repository.
pub struct AdminConsole<R: ShipmentRepository + ?Sized> {
    repo: Arc<R>,
    policy: TransitionPolicy,
}

impl<R: ShipmentRepository + ?Sized> AdminConsole<R> {
    pub fn new(repo: Arc<R>, policy: TransitionPolicy) -> Self {
        Self { repo, policy }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    pub async fn create_shipment(
        &self,
        new: NewShipment,
        now: DateTime<Utc>,
    ) -> Result<ShipmentRecord> {
        new.validate()?;
        let fee = new.resolved_fee()?;
        let estimated = now
            .checked_add_signed(Duration::days(i64::from(new.delivery_days)))
            .map(|at| at.date_naive())
            .ok_or_else(|| {
                TrackingError::Validation(format!(
                    "delivery in {} days from {} is past the calendar",
                    new.delivery_days, now
                ))
            })?;

        let mut record = ShipmentRecord {
            id: Uuid::new_v4(),
            tracking_number: String::new(),
            status: ShipmentStatus::INITIAL.label().to_string(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            delivery_days: Some(new.delivery_days),
            estimated_delivery: Some(estimated.to_string()),
            sender_name: new.sender_name.trim().to_string(),
            sender_address: new.sender_address.trim().to_string(),
            sender_city: new.sender_city.trim().to_string(),
            receiver_name: new.receiver_name.trim().to_string(),
            receiver_address: new.receiver_address.trim().to_string(),
            receiver_city: new.receiver_city.trim().to_string(),
            customer_email: non_blank(new.customer_email),
            current_location: Some(INITIAL_LOCATION.to_string()),
            service_type: new.service_type,
            weight: Some(new.weight_kg.to_string()),
            fee: Some(fee),
            declared_value: non_blank(new.declared_value),
            description: non_blank(new.description),
            held_by_customs: false,
            status_history: vec![StatusHistoryEntry::new(
                ShipmentStatus::INITIAL,
                INITIAL_LOCATION,
                now,
            )],
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            record.tracking_number = generate_tracking_number(now)?;

            match self.repo.insert_shipment(record.clone()).await {
                Ok(()) => break,
                Err(e)
                    if attempt < TRACKING_NUMBER_ATTEMPTS
                        && matches!(
                            e.downcast_ref::<TrackingError>(),
                            Some(TrackingError::DuplicateTrackingNumber(_))
                        ) =>
                {
                    log::warn!("Tracking number {} taken, retrying", record.tracking_number);
                }
                Err(e) => return Err(e),
            }
        }

        #[cfg(debug_assertions)]
        if DF.log_admin {
            log::info!(
                "ADMIN: Created {} for {} (fee {:.2})",
                record.tracking_number,
                record.receiver_summary(),
                fee
            );
        }

        Ok(record)
    }

    /// Appends a history entry. The status must be a known label and the
    /// location must not be blank. The repository enforces the transition
    /// policy against the status it holds at write time.
    pub async fn update_status(
        &self,
        tracking_number: &str,
        status: &str,
        location: &str,
        now: DateTime<Utc>,
    ) -> Result<ShipmentRecord> {
        let to: ShipmentStatus = status.trim().parse()?;
        let location = location.trim();
        if location.is_empty() {
            return Err(TrackingError::Validation("location is required".to_string()).into());
        }

        let updated = self
            .repo
            .append_status(
                tracking_number,
                StatusHistoryEntry::new(to, location, now),
                self.policy,
            )
            .await?;

        #[cfg(debug_assertions)]
        if DF.log_admin {
            log::info!("ADMIN: {} -> {} at {}", tracking_number, to, location);
        }

        Ok(updated)
    }

    pub async fn delete_shipment(&self, tracking_number: &str) -> Result<()> {
        self.repo.delete_shipment(tracking_number).await?;

        #[cfg(debug_assertions)]
        if DF.log_admin {
            log::info!("ADMIN: Deleted {}", tracking_number);
        }
        Ok(())
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<ShipmentRecord>> {
        self.repo.list_shipments().await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<ShipmentRecord>> {
        let mut records = self.repo.list_shipments().await?;
        records.retain(|r| matches_search(r, term));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        admin::new_shipment::fixtures::form, data::JsonShipmentRepository, domain::ServiceType,
    };
    use chrono::TimeZone;

    fn console(policy: TransitionPolicy) -> AdminConsole<JsonShipmentRepository> {
        AdminConsole::new(Arc::new(JsonShipmentRepository::in_memory()), policy)
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn domain_error(e: &anyhow::Error) -> Option<&TrackingError> {
        e.downcast_ref::<TrackingError>()
    }

    #[tokio::test]
    async fn create_fills_in_the_initial_state() {
        let admin = console(TransitionPolicy::STRICT);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();

        assert!(r.tracking_number.starts_with("SP"));
        assert_eq!(r.tracking_number.len(), 11);
        assert_eq!(r.status, "Order Placed");
        assert_eq!(r.current_location.as_deref(), Some("Processing Center"));
        assert_eq!(r.estimated_delivery.as_deref(), Some("2024-01-04"));
        assert_eq!(r.fee, Some(45.0));
        assert_eq!(r.weight.as_deref(), Some("2.5"));
        assert_eq!(r.customer_email.as_deref(), Some("charles@engine.example"));
        assert_eq!(r.declared_value.as_deref(), Some("1200"));
        assert_eq!(r.status_history.len(), 1);
        assert_eq!(r.status_history[0].date, "2024-01-01");
        assert_eq!(r.status_history[0].time, "10:00:00");

        let stored = admin.repository().get_shipment(&r.tracking_number).await.unwrap();
        assert_eq!(stored, r);
    }

    #[tokio::test]
    async fn create_rejects_incomplete_forms() {
        let admin = console(TransitionPolicy::STRICT);
        let mut f = form();
        f.receiver_address.clear();

        let err = admin.create_shipment(f, at(1, 10)).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::Validation(_))));
        assert!(admin.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_oversized_delivery_days() {
        let admin = console(TransitionPolicy::STRICT);
        let mut f = form();
        f.delivery_days = 4_000_000_000;
        f.fee = Some(10.0);

        let err = admin.create_shipment(f, at(1, 10)).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::Validation(_))));
        assert!(admin.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_policy_blocks_backward_moves() {
        let admin = console(TransitionPolicy::STRICT);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();
        let n = r.tracking_number.as_str();

        // Forward skip, then a location-only update on the same step.
        admin.update_status(n, "At Sorting Center", "Birmingham Hub", at(2, 9)).await.unwrap();
        admin.update_status(n, "At Sorting Center", "Rugby Hub", at(2, 15)).await.unwrap();

        let err = admin.update_status(n, "Dispatched", "Depot", at(3, 9)).await.unwrap_err();
        assert_eq!(
            domain_error(&err),
            Some(&TrackingError::IllegalTransition {
                from: ShipmentStatus::AtSortingCenter,
                to: ShipmentStatus::Dispatched,
            })
        );

        let stored = admin.repository().get_shipment(n).await.unwrap();
        assert_eq!(stored.current_location.as_deref(), Some("Rugby Hub"));
        assert_eq!(stored.status_history.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_updates_cannot_move_backwards() {
        let admin = console(TransitionPolicy::STRICT);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();
        let n = r.tracking_number.as_str();
        admin.update_status(n, "Dispatched", "Depot", at(2, 9)).await.unwrap();

        // Both start from "Dispatched"; whichever lands second must respect the first.
        let (ahead, behind) = tokio::join!(
            admin.update_status(n, "Out for Delivery", "Van 12", at(3, 9)),
            admin.update_status(n, "In Transit", "M6", at(3, 10)),
        );
        for err in [ahead.err(), behind.err()].into_iter().flatten() {
            assert!(matches!(domain_error(&err), Some(TrackingError::IllegalTransition { .. })));
        }

        let stored = admin.repository().get_shipment(n).await.unwrap();
        let steps: Vec<usize> = stored
            .status_history
            .iter()
            .filter_map(|e| ShipmentStatus::from_label(&e.status))
            .map(|s| s.step_index())
            .collect();
        assert!(steps.windows(2).all(|w| w[0] <= w[1]), "{:?}", steps);
        assert_eq!(stored.canonical_status(), Some(ShipmentStatus::OutForDelivery));
    }

    #[tokio::test]
    async fn permissive_policy_allows_corrections() {
        let admin = console(TransitionPolicy::PERMISSIVE);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();
        let n = r.tracking_number.as_str();

        admin.update_status(n, "Delivered", "Front door", at(2, 9)).await.unwrap();
        let back = admin.update_status(n, "Out for Delivery", "Van 12", at(2, 10)).await.unwrap();
        assert_eq!(back.canonical_status(), Some(ShipmentStatus::OutForDelivery));
    }

    #[tokio::test]
    async fn update_requires_known_status_and_location() {
        let admin = console(TransitionPolicy::STRICT);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();
        let n = r.tracking_number.as_str();

        let err = admin.update_status(n, "Lost at sea", "Atlantic", at(2, 9)).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::UnknownStatus(_))));

        let err = admin.update_status(n, "Dispatched", "   ", at(2, 9)).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::Validation(_))));

        let err = admin.update_status("SP000", "Dispatched", "Depot", at(2, 9)).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::NotFound(_))));
    }

    #[tokio::test]
    async fn search_matches_number_name_and_city() {
        let admin = console(TransitionPolicy::STRICT);
        let a = admin.create_shipment(form(), at(1, 10)).await.unwrap();

        let mut other = form();
        other.receiver_name = "Grace Hopper".to_string();
        other.receiver_city = "Arlington".to_string();
        other.service_type = ServiceType::Air;
        let b = admin.create_shipment(other, at(2, 10)).await.unwrap();

        let names = |rs: Vec<ShipmentRecord>| -> Vec<String> {
            rs.into_iter().map(|r| r.tracking_number).collect()
        };
        assert_eq!(names(admin.search("grace").await.unwrap()), [b.tracking_number.clone()]);
        assert_eq!(names(admin.search("LONDON").await.unwrap()), [a.tracking_number.clone()]);
        assert_eq!(
            names(admin.search(&a.tracking_number.to_lowercase()).await.unwrap()),
            [a.tracking_number.clone()]
        );
        assert_eq!(admin.search("").await.unwrap().len(), 2);
        assert!(admin.search("paris").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_and_then_reports_missing() {
        let admin = console(TransitionPolicy::STRICT);
        let r = admin.create_shipment(form(), at(1, 10)).await.unwrap();

        admin.delete_shipment(&r.tracking_number).await.unwrap();
        let err = admin.delete_shipment(&r.tracking_number).await.unwrap_err();
        assert!(matches!(domain_error(&err), Some(TrackingError::NotFound(_))));
    }
}
