mod time_utils;

pub use time_utils::{
    TimeUtils, format_long_date, now_utc, parse_date, parse_time_of_day, parse_timestamp,
    whole_days_between,
};
