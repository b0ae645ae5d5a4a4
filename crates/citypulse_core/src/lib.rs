pub mod assistant;
pub mod community;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod insight;
pub mod notify;
pub mod registry;
pub mod schema;
pub mod store;
pub mod users;

use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;

/// RFC 3339 in UTC with a fixed six-digit fraction, so stored timestamps
/// sort the same as text and as instants.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
);

/// Current UTC time in the format every stored timestamp uses.
pub fn timestamp_now() -> String {
    format_timestamp(OffsetDateTime::now_utc())
}

fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| "1970-01-01T00:00:00.000000Z".to_string())
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
