//! 时间工具: 可注入时钟
//!
//! Repository 层只接收 `i64` Unix millis 或预先格式化的 RFC 3339 字符串；
//! services obtain both from an injected [`Clock`], so tests can pin
//! time with [`FixedClock`].

use chrono::SecondsFormat;

/// Current-time provider. Injected into every service that stamps
/// `created_at`/`updated_at` or defaults a clinical date.
pub trait Clock: Send + Sync {
    /// Unix millis
    fn now_millis(&self) -> i64;

    /// RFC 3339 UTC string, second precision
    fn now_rfc3339(&self) -> String {
        millis_to_rfc3339(self.now_millis())
    }
}

/// Wall clock backed by `chrono::Utc`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        shared::util::now_millis()
    }
}

/// Pinned clock for deterministic tests
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// Unix millis → RFC 3339 UTC string. Out-of-range values fall back to
/// the epoch rather than panicking.
pub fn millis_to_rfc3339(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}
