//! Small display/time helpers shared across the crate.

use std::fmt;

/// Truncates a string for log lines so a hostile payload can't blow up a
/// terminal or log shipper.
pub struct TruncateDisplay<'a> {
    value: &'a str,
    limit: usize,
}

impl<'a> TruncateDisplay<'a> {
    pub fn new(value: &'a str, limit: usize) -> Self {
        Self { value, limit }
    }
}

impl fmt::Display for TruncateDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.len() > self.limit {
            write!(f, "{}...", &self.value[..self.limit])
        } else {
            write!(f, "{}", self.value)
        }
    }
}

pub mod time {
    pub fn now_millis() -> u64 {
        coarsetime::Clock::now_since_epoch().as_millis()
    }

    pub fn now_unix_nanos() -> u128 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    }
}
