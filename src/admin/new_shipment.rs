use {
    crate::{
        admin::quote_fee, config::constants::MAX_DELIVERY_DAYS, domain::ServiceType,
        error::TrackingError,
    },
    serde::{Deserialize, Serialize},
};

/// The create-shipment form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub sender_name: String,
    pub sender_address: String,
    pub sender_city: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub receiver_city: String,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub service_type: ServiceType,
    pub weight_kg: f64,
    pub delivery_days: u32,
    /// Quoted from the fee table when absent.
    pub fee: Option<f64>,
    #[serde(default)]
    pub declared_value: Option<String>,
    pub description: Option<String>,
}

impl NewShipment {
    /// Every required field must be present before a tracking number is issued.
    pub fn validate(&self) -> Result<(), TrackingError> {
        let required = [
            ("senderName", &self.sender_name),
            ("senderAddress", &self.sender_address),
            ("senderCity", &self.sender_city),
            ("receiverName", &self.receiver_name),
            ("receiverAddress", &self.receiver_address),
            ("receiverCity", &self.receiver_city),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(TrackingError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(TrackingError::Validation(format!(
                "weight must be a positive number of kg, got {}",
                self.weight_kg
            )));
        }
        if self.delivery_days == 0 || self.delivery_days > MAX_DELIVERY_DAYS {
            return Err(TrackingError::Validation(format!(
                "delivery days must be between 1 and {}, got {}",
                MAX_DELIVERY_DAYS, self.delivery_days
            )));
        }
        if let Some(fee) = self.fee {
            if !fee.is_finite() || fee < 0.0 {
                return Err(TrackingError::Validation(format!("invalid fee {}", fee)));
            }
        }
        Ok(())
    }

    /// The given fee, or a quote from the fee table.
    pub fn resolved_fee(&self) -> Result<f64, TrackingError> {
        match self.fee {
            Some(fee) => Ok(fee),
            None => quote_fee(self.service_type, self.delivery_days, self.weight_kg).ok_or_else(|| {
                TrackingError::Validation(format!(
                    "no {} rate for {} day delivery, a fee must be given",
                    self.service_type, self.delivery_days
                ))
            }),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub(crate) fn form() -> NewShipment {
        NewShipment {
            sender_name: "Ada Byron".to_string(),
            sender_address: "12 Harbour Road".to_string(),
            sender_city: "Portsmouth".to_string(),
            receiver_name: "Charles Babbage".to_string(),
            receiver_address: "1 Dorset Street".to_string(),
            receiver_city: "London".to_string(),
            customer_email: Some("charles@engine.example".to_string()),
            service_type: ServiceType::Ground,
            weight_kg: 2.5,
            delivery_days: 3,
            fee: None,
            declared_value: Some("1200".to_string()),
            description: Some("Difference engine parts".to_string()),
        }
    }
}
