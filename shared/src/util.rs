use chrono::{Local, NaiveDate, SecondsFormat, Utc};

/// Server write timestamp, RFC 3339 with millisecond precision
pub fn server_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Today on the local wall clock (default issue date of a new form)
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}
