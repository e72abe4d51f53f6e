// Top Level Constants

/// Transit duration assumed when a record carries no usable `deliveryDays`.
pub const DEFAULT_DELIVERY_DAYS: u32 = 3;

/// Longest transit duration accepted anywhere. Ten years.
pub const MAX_DELIVERY_DAYS: u32 = 3650;

/// Location recorded for a freshly created shipment.
pub const INITIAL_LOCATION: &str = "Processing Center";

pub mod tracking_number {
    pub const PREFIX: &str = "SP";
    /// Trailing digits of the epoch-ms timestamp kept in the number.
    pub const TIMESTAMP_DIGITS: usize = 6;
    pub const RANDOM_DIGITS: u32 = 3;
}

pub mod display {
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
    pub const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y";
    pub const TIME_FORMAT: &str = "%H:%M:%S";
    pub const STATUS_UNAVAILABLE: &str = "Status unavailable";
    pub const NOT_FOUND: &str = "Shipment not found";
}
