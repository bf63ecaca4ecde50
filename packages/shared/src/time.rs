//! Time helpers. All timestamps are Unix milliseconds rendered in JST.

use chrono::{DateTime, FixedOffset, Offset, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    // 9h is always within the valid offset range
    FixedOffset::east_opt(JST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Get current Unix timestamp in JST (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst());
    now_jst.timestamp_millis()
}

/// Render a Unix timestamp (milliseconds) as an RFC 3339 string in JST.
///
/// Out-of-range values fall back to the Unix epoch.
pub fn timestamp_to_jst_rfc3339(timestamp_millis: i64) -> String {
    DateTime::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .with_timezone(&jst())
        .to_rfc3339()
}
