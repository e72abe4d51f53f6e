use anyhow::{Context, Result};
use chrono::Duration;
use shipment_tracker::config::{DEMO, PERSISTENCE};
use shipment_tracker::domain::{ServiceType, ShipmentStatus};
use shipment_tracker::utils::now_utc;
use shipment_tracker::{AdminConsole, NewShipment, SqliteShipmentRepository, TransitionPolicy};
use std::sync::Arc;
use strum::IntoEnumIterator;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 2. Target database (first argument, or the default path from persistence.rs)
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| PERSISTENCE.db_path.to_string());
    log::info!("🚀 Seeding demo shipments into {}", db_path);

    let repo = SqliteShipmentRepository::new(&db_path)
        .await
        .with_context(|| format!("Failed to open {}", db_path))?;
    let admin = AdminConsole::new(Arc::new(repo), TransitionPolicy::STRICT);

    let now = now_utc();

    // 3. Create and advance each demo shipment
    for demo in DEMO.shipments {
        let service: ServiceType = demo
            .service
            .parse()
            .with_context(|| format!("Unknown demo service '{}'", demo.service))?;
        let target: ShipmentStatus = demo.advance_to.parse()?;

        // Backdate creation so the timeline has room for every step.
        let created = now - Duration::days(i64::from(demo.delivery_days));
        let record = admin
            .create_shipment(
                NewShipment {
                    sender_name: demo.sender_name.to_string(),
                    sender_address: demo.sender_address.to_string(),
                    sender_city: demo.sender_city.to_string(),
                    receiver_name: demo.receiver_name.to_string(),
                    receiver_address: demo.receiver_address.to_string(),
                    receiver_city: demo.receiver_city.to_string(),
                    customer_email: None,
                    service_type: service,
                    weight_kg: demo.weight_kg,
                    delivery_days: demo.delivery_days,
                    fee: None,
                    declared_value: None,
                    description: None,
                },
                created,
            )
            .await?;

        let steps: Vec<ShipmentStatus> = ShipmentStatus::iter()
            .skip(1)
            .take_while(|s| *s <= target)
            .collect();
        let spacing = (now - created) / (steps.len() as i32 + 1);

        for (i, status) in steps.iter().enumerate() {
            let at = created + spacing * (i as i32 + 1);
            let location = match status {
                ShipmentStatus::Dispatched => demo.sender_city,
                ShipmentStatus::Delivered => demo.receiver_address,
                ShipmentStatus::OutForDelivery => demo.receiver_city,
                _ => "Regional Hub",
            };
            admin
                .update_status(&record.tracking_number, status.label(), location, at)
                .await?;
        }

        log::info!(
            "   📦 {} {} → {} ({})",
            record.tracking_number,
            demo.sender_city,
            demo.receiver_city,
            target
        );
    }

    log::info!("✅ Seeded {} shipments", DEMO.shipments.len());
    Ok(())
}
