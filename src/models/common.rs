use chrono::{DateTime, TimeZone, Utc};

/// Rows store timestamps as unix seconds.
pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

pub fn to_datetime(timestamp: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default()
}
