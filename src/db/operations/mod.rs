pub mod attempts;
pub mod questions;
pub mod quizzes;
pub mod users;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

pub(crate) fn naive_to_iso(dt: NaiveDateTime) -> String {
    DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn string_list(value: serde_json::Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}
