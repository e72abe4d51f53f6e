use crate::{config::PRICING, domain::ServiceType};

#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(base fee + per-kg fee) * delivery multiplier`, to the cent.
///
/// `None` when the service or the delivery option has no entry in the fee
/// table, or the weight is negative or not a number.
pub fn quote_fee(service: ServiceType, delivery_days: u32, weight_kg: f64) -> Option<f64> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return None;
    }
    let rate = PRICING.service_rate(service)?;
    let option = PRICING.delivery_option(delivery_days)?;

    Some(round2(
        (rate.base_fee + PRICING.fee_per_kg * weight_kg) * option.multiplier,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_follow_the_fee_table() {
        assert_eq!(quote_fee(ServiceType::Ground, 3, 2.5), Some(45.0));
        assert_eq!(quote_fee(ServiceType::Air, 1, 10.0), Some(285.0));
        assert_eq!(quote_fee(ServiceType::Ocean, 14, 1.25), Some(28.5));
        assert_eq!(quote_fee(ServiceType::Ground, 5, 0.0), Some(25.0));
        assert_eq!(quote_fee(ServiceType::Air, 7, 3.3), Some(65.28));
    }

    #[test]
    fn unknown_options_have_no_quote() {
        assert_eq!(quote_fee(ServiceType::Express, 3, 1.0), None);
        assert_eq!(quote_fee(ServiceType::Ground, 4, 1.0), None);
        assert_eq!(quote_fee(ServiceType::Ground, 3, -1.0), None);
        assert_eq!(quote_fee(ServiceType::Ground, 3, f64::NAN), None);
    }
}
