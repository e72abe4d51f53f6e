//! Shipment progress projection.
//!
//! Maps a shipment record and the current time onto everything the tracking
//! display needs: the current step, sub-step animation progress, the overall
//! progress-bar fill and the estimated delivery date. Pure: identical inputs
//! give identical results and the record is never touched.

use {
    crate::{
        config::{DeliveryDays, Pct, TRACKING, TrackingConfig},
        domain::ShipmentRecord,
        error::TrackingError,
        models::step_table::{STEPS, StepIcon, resolve_step_index},
        utils::whole_days_between,
    },
    chrono::{DateTime, Duration, NaiveDate, Utc},
    serde::Serialize,
};

#[cfg(debug_assertions)]
use crate::config::DF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StepState {
    Completed,
    Current,
    Upcoming,
}

impl StepState {
    pub fn of(index: usize, current: usize) -> Self {
        match index.cmp(&current) {
            std::cmp::Ordering::Less => Self::Completed,
            std::cmp::Ordering::Equal => Self::Current,
            std::cmp::Ordering::Greater => Self::Upcoming,
        }
    }
}

/// Display metadata for one step, resolved against the shipment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub index: usize,
    pub id: &'static str,
    pub title: &'static str,
    pub icon: StepIcon,
    pub location: String,
    pub description: &'static str,
    pub state: StepState,
}

/// Origin-to-destination strip with the marker position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteView {
    pub origin: String,
    pub destination: String,
    pub completion: Pct,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressResult {
    pub tracking_number: String,
    pub step_index: usize,
    pub step_count: usize,
    /// False when `status` missed the lookup table and step 0 was assumed.
    pub status_recognized: bool,
    pub days_passed: i64,
    pub delivery_days: DeliveryDays,
    pub fractional_advance: Pct,
    pub progress_ratio: Pct,
    pub estimated_delivery_date: NaiveDate,
    pub current_step: StepView,
    pub steps: Vec<StepView>,
    pub route: RouteView,
    pub customs_hold: bool,
}

impl ProgressResult {
    pub fn step_state(&self, index: usize) -> StepState {
        StepState::of(index, self.step_index)
    }

    pub fn is_completed(&self, index: usize) -> bool {
        index < self.step_index
    }

    pub fn is_current(&self, index: usize) -> bool {
        index == self.step_index
    }

    pub fn is_upcoming(&self, index: usize) -> bool {
        index > self.step_index
    }

    pub fn is_delivered(&self) -> bool {
        self.step_index + 1 == self.step_count
    }
}

/// Sub-step animation progress: `((days_passed / delivery_days) * step_count) mod 1`.
///
/// Computed as `(days_passed * step_count) / delivery_days` so that whole
/// multiples land exactly on 0.
pub fn fractional_advance(days_passed: i64, delivery_days: DeliveryDays, step_count: usize) -> Pct {
    let scaled = (days_passed.max(0) as f64 * step_count as f64) / delivery_days.get() as f64;
    Pct::new(scaled.fract())
}

/// Overall fill: `(step_index + fractional_advance) / (step_count - 1)`.
pub fn progress_ratio(step_index: usize, fractional_advance: Pct, step_count: usize) -> Pct {
    if step_count <= 1 {
        // A single-step table is complete by definition.
        return Pct::ONE;
    }
    let last = (step_count - 1) as f64;
    Pct::new((step_index as f64 + fractional_advance.value()) / last)
}

fn estimated_delivery_date(
    shipment: &ShipmentRecord,
    created_at: DateTime<Utc>,
    delivery_days: DeliveryDays,
) -> Result<NaiveDate, TrackingError> {
    let derived = created_at
        .checked_add_signed(Duration::days(i64::from(delivery_days.get())))
        .map(|at| at.date_naive())
        .ok_or_else(|| {
            TrackingError::data(
                "deliveryDays",
                format!("{} from {} is past the calendar", delivery_days, created_at),
            )
        })?;

    let date = match shipment.estimated_delivery.as_deref() {
        None => derived,
        Some(raw) => match shipment.estimated_delivery_override() {
            Some(date) if date >= created_at.date_naive() => date,
            Some(date) => {
                log::warn!(
                    "{}: estimated delivery {} precedes creation, using {}",
                    shipment.tracking_number,
                    date,
                    derived
                );
                derived
            }
            None => {
                log::warn!(
                    "{}: unreadable estimated delivery '{}', using {}",
                    shipment.tracking_number,
                    raw,
                    derived
                );
                derived
            }
        },
    };
    Ok(date)
}

/// `compute_progress_with` using the default `TRACKING` configuration.
pub fn compute_progress(
    shipment: &ShipmentRecord,
    now: DateTime<Utc>,
) -> Result<ProgressResult, TrackingError> {
    compute_progress_with(shipment, now, &TRACKING)
}

pub fn compute_progress_with(
    shipment: &ShipmentRecord,
    now: DateTime<Utc>,
    config: &TrackingConfig,
) -> Result<ProgressResult, TrackingError> {
    let created_at = shipment.parsed_created_at()?;
    let step_count = STEPS.len();

    // 1. Step from status, failing closed to the first step
    let (step_index, status_recognized) = match resolve_step_index(&shipment.status) {
        Some(index) => (index.min(step_count.saturating_sub(1)), true),
        None => {
            log::warn!(
                "{}: {}, showing first step",
                shipment.tracking_number,
                TrackingError::UnknownStatus(shipment.status.clone())
            );
            (0, false)
        }
    };

    // 2. Elapsed whole days
    let days_passed = whole_days_between(created_at, now);

    // 3. and 4. Animation and bar fill. The fraction never moves the step.
    let delivery_days = shipment.effective_delivery_days(config.default_delivery_days);
    let fractional_advance = fractional_advance(days_passed, delivery_days, step_count);
    let progress_ratio = progress_ratio(step_index, fractional_advance, step_count);

    // 5. Delivery estimate
    let estimated_delivery_date = estimated_delivery_date(shipment, created_at, delivery_days)?;

    // 6. Step metadata
    let steps: Vec<StepView> = STEPS
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let state = StepState::of(index, step_index);
            StepView {
                index,
                id: def.id,
                title: def.title,
                icon: def.icon_for(shipment.service_type),
                location: def.location_for(shipment, state == StepState::Current),
                description: def.description,
                state,
            }
        })
        .collect();
    let current_step = steps[step_index].clone();

    #[cfg(debug_assertions)]
    if DF.log_progress {
        log::info!(
            "PROGRESS: {} step {}/{} ({}) frac {} ratio {} eta {}",
            shipment.tracking_number,
            step_index,
            step_count,
            current_step.title,
            fractional_advance,
            progress_ratio,
            estimated_delivery_date
        );
    }

    Ok(ProgressResult {
        tracking_number: shipment.tracking_number.clone(),
        step_index,
        step_count,
        status_recognized,
        days_passed,
        delivery_days,
        fractional_advance,
        progress_ratio,
        estimated_delivery_date,
        current_step,
        steps,
        route: RouteView {
            origin: shipment.sender_city.clone(),
            destination: shipment.receiver_city.clone(),
            completion: progress_ratio,
        },
        customs_hold: shipment.held_by_customs,
    })
}
