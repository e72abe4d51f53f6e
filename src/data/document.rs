//! Legacy document normalization.
//!
//! Stored shipments come in several shapes: camelCase documents from the
//! local-storage create form, snake_case rows from the hosted database, and
//! the admin panel's `customer_name`/`customer_email`/`origin`/`destination`
//! layout with its declared `value`. Some
//! concepts carry two names (`weight`/`packageWeight`, `fee`/`shippingFee`).
//! Everything is folded into one `ShipmentRecord` here so the core only ever
//! sees canonical fields.

use {
    crate::{
        config::constants::MAX_DELIVERY_DAYS,
        domain::{ServiceType, ShipmentRecord, StatusHistoryEntry},
        error::TrackingError,
    },
    anyhow::{Context, Result},
    serde::Deserialize,
    serde_json::Value,
    uuid::Uuid,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipmentDocument {
    pub id: Option<String>,
    #[serde(alias = "tracking_number")]
    pub tracking_number: Option<String>,
    pub status: Option<String>,
    #[serde(alias = "created_at")]
    pub created_at: Option<String>,
    #[serde(alias = "delivery_days")]
    pub delivery_days: Option<Value>,
    #[serde(alias = "estimated_delivery")]
    pub estimated_delivery: Option<String>,

    #[serde(alias = "sender_name")]
    pub sender_name: Option<String>,
    #[serde(alias = "sender_address")]
    pub sender_address: Option<String>,
    #[serde(alias = "sender_city")]
    pub sender_city: Option<String>,
    pub origin: Option<String>,

    #[serde(alias = "receiver_name")]
    pub receiver_name: Option<String>,
    #[serde(alias = "customer_name")]
    pub customer_name: Option<String>,
    #[serde(alias = "receiver_address")]
    pub receiver_address: Option<String>,
    #[serde(alias = "receiver_city")]
    pub receiver_city: Option<String>,
    pub destination: Option<String>,
    #[serde(alias = "customer_email")]
    pub customer_email: Option<String>,

    #[serde(alias = "current_location")]
    pub current_location: Option<String>,
    #[serde(alias = "service_type")]
    pub service_type: Option<String>,
    pub service: Option<String>,

    pub weight: Option<Value>,
    #[serde(alias = "package_weight")]
    pub package_weight: Option<Value>,
    pub fee: Option<Value>,
    #[serde(alias = "shipping_fee")]
    pub shipping_fee: Option<Value>,
    #[serde(alias = "value", alias = "declared_value")]
    pub declared_value: Option<Value>,
    pub description: Option<String>,
    #[serde(alias = "package_description")]
    pub package_description: Option<String>,
    #[serde(alias = "held_by_customs")]
    pub held_by_customs: Option<bool>,

    #[serde(alias = "status_history", alias = "tracking_history")]
    pub status_history: Option<Vec<StatusHistoryEntry>>,
}

/// First value that is present and not blank.
fn first_text<const N: usize>(candidates: [&Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn value_text(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Numbers, or numeric strings such as `"5"` or `"$32.50"`.
fn value_number(value: &Option<Value>) -> Option<f64> {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().trim_start_matches('$').parse().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

impl ShipmentDocument {
    pub fn normalize(self) -> Result<ShipmentRecord, TrackingError> {
        let tracking_number = first_text([&self.tracking_number])
            .ok_or_else(|| TrackingError::data("trackingNumber", "missing"))?;

        let id = self
            .id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
            // Stable id for documents that never had one.
            .unwrap_or_else(|| Uuid::new_v5(&Uuid::NAMESPACE_OID, tracking_number.as_bytes()));

        let delivery_days = value_number(&self.delivery_days)
            .filter(|d| *d >= 1.0 && *d <= f64::from(MAX_DELIVERY_DAYS))
            .map(|d| d.floor() as u32);

        let service_raw = first_text([&self.service_type, &self.service]);
        let service_type = match service_raw.as_deref() {
            None => ServiceType::default(),
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("{}: unknown service type '{}', assuming ground", tracking_number, raw);
                ServiceType::default()
            }),
        };

        Ok(ShipmentRecord {
            id,
            status: self.status.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            delivery_days,
            estimated_delivery: first_text([&self.estimated_delivery]),
            sender_name: first_text([&self.sender_name]).unwrap_or_default(),
            sender_address: first_text([&self.sender_address]).unwrap_or_default(),
            sender_city: first_text([&self.sender_city, &self.origin]).unwrap_or_default(),
            receiver_name: first_text([&self.receiver_name, &self.customer_name]).unwrap_or_default(),
            receiver_address: first_text([&self.receiver_address]).unwrap_or_default(),
            receiver_city: first_text([&self.receiver_city, &self.destination]).unwrap_or_default(),
            customer_email: first_text([&self.customer_email]),
            current_location: first_text([&self.current_location]),
            service_type,
            weight: value_text(&self.weight).or_else(|| value_text(&self.package_weight)),
            fee: value_number(&self.fee).or_else(|| value_number(&self.shipping_fee)),
            declared_value: value_text(&self.declared_value),
            description: first_text([&self.description, &self.package_description]),
            held_by_customs: self.held_by_customs.unwrap_or(false),
            status_history: self.status_history.unwrap_or_default(),
            tracking_number,
        })
    }
}

/// Parses a JSON array of stored shipments. Documents that cannot be
/// normalized are skipped with a warning.
pub fn parse_documents(json: &str) -> Result<Vec<ShipmentRecord>> {
    let raw: Vec<Value> = serde_json::from_str(json).context("Shipment store is not a JSON array")?;

    let mut records = Vec::with_capacity(raw.len());
    for (i, value) in raw.into_iter().enumerate() {
        let normalized = serde_json::from_value::<ShipmentDocument>(value)
            .map_err(|e| TrackingError::data("document", e.to_string()))
            .and_then(ShipmentDocument::normalize);

        match normalized {
            Ok(record) => records.push(record),
            Err(e) => log::warn!("Skipping stored shipment #{}: {}", i, e),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(v: Value) -> ShipmentRecord {
        serde_json::from_value::<ShipmentDocument>(v)
            .unwrap()
            .normalize()
            .unwrap()
    }

    #[test]
    fn local_storage_document_with_legacy_names() {
        let r = normalize(json!({
            "trackingNumber": "SP200123007",
            "status": "dispatched",
            "createdAt": "2024-01-01T10:00:00.000Z",
            "deliveryDays": "5",
            "senderName": "Ada", "senderAddress": "12 Harbour Road", "senderCity": "Portsmouth",
            "receiverName": "Charles", "receiverAddress": "1 Dorset St", "receiverCity": "London",
            "serviceType": "air",
            "packageWeight": "2.5",
            "shippingFee": "$97.50",
            "packageDescription": "Books"
        }));

        assert_eq!(r.tracking_number, "SP200123007");
        assert_eq!(r.delivery_days, Some(5));
        assert_eq!(r.service_type, ServiceType::Air);
        assert_eq!(r.weight.as_deref(), Some("2.5"));
        assert_eq!(r.fee, Some(97.5));
        assert_eq!(r.description.as_deref(), Some("Books"));
        assert!(!r.held_by_customs);
    }

    #[test]
    fn first_non_empty_name_wins() {
        let r = normalize(json!({
            "trackingNumber": "SP1",
            "weight": "",
            "packageWeight": 3,
            "fee": 10,
            "shippingFee": 99
        }));
        assert_eq!(r.weight.as_deref(), Some("3"));
        assert_eq!(r.fee, Some(10.0));
    }

    #[test]
    fn hosted_row_with_admin_layout() {
        let r = normalize(json!({
            "id": "6f1c2f0e-3f43-4a5a-9d7e-0d8f4c1b2a33",
            "tracking_number": "SNABC123XYZ",
            "status": "Out for Delivery",
            "created_at": "2024-02-01T08:00:00+00:00",
            "delivery_days": 3,
            "estimated_delivery": "2024-02-04",
            "customer_name": "Grace",
            "customer_email": "grace@navy.example",
            "origin": "Arlington",
            "destination": "Milton Keynes",
            "service": "express",
            "current_location": "Local depot",
            "shipping_fee": 45.5,
            "value": "1200",
            "held_by_customs": true,
            "tracking_history": [
                {"status": "Order Placed", "location": "Processing Center", "date": "2024-02-01", "time": "08:00:00"}
            ]
        }));

        assert_eq!(r.id.to_string(), "6f1c2f0e-3f43-4a5a-9d7e-0d8f4c1b2a33");
        assert_eq!(r.receiver_name, "Grace");
        assert_eq!(r.sender_city, "Arlington");
        assert_eq!(r.receiver_city, "Milton Keynes");
        assert_eq!(r.service_type, ServiceType::Express);
        assert_eq!(r.current_location.as_deref(), Some("Local depot"));
        assert_eq!(r.fee, Some(45.5));
        assert_eq!(r.customer_email.as_deref(), Some("grace@navy.example"));
        assert_eq!(r.declared_value.as_deref(), Some("1200"));
        assert!(r.held_by_customs);
        assert_eq!(r.status_history.len(), 1);
    }

    #[test]
    fn bad_delivery_days_become_absent() {
        for bad in [json!(0), json!(-2), json!("soon"), json!(null), json!("4000000000"), json!(1e12)] {
            let r = normalize(json!({"trackingNumber": "SP1", "deliveryDays": bad}));
            assert_eq!(r.delivery_days, None);
        }
    }

    #[test]
    fn missing_id_gets_a_stable_one() {
        let a = normalize(json!({"trackingNumber": "SP1"}));
        let b = normalize(json!({"trackingNumber": "SP1"}));
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, Uuid::nil());
    }

    #[test]
    fn unknown_service_falls_back_to_ground() {
        let r = normalize(json!({"trackingNumber": "SP1", "serviceType": "hovercraft"}));
        assert_eq!(r.service_type, ServiceType::Ground);
    }

    #[test]
    fn canonical_record_round_trips_through_documents() {
        let original = normalize(json!({
            "trackingNumber": "SP9",
            "status": "In Transit",
            "createdAt": "2024-01-01",
            "deliveryDays": 4,
            "receiverCity": "London"
        }));
        let json = serde_json::to_string(&vec![original.clone()]).unwrap();
        assert_eq!(parse_documents(&json).unwrap(), vec![original]);
    }

    #[test]
    fn documents_without_tracking_numbers_are_skipped() {
        let json = r#"[{"status": "Delivered"}, {"trackingNumber": "SP2"}, 42]"#;
        let records = parse_documents(json).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tracking_number, "SP2");
    }

    #[test]
    fn non_array_store_is_an_error() {
        assert!(parse_documents(r#"{"trackingNumber": "SP1"}"#).is_err());
    }
}
