use serde::{Deserialize, Serialize};
use std::ops::Add;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Wall-clock instant in milliseconds since the Unix epoch.
/// Captured producer-side when a command is created, never at processing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp {
    pub millis: u64,
}

impl Timestamp {
    pub fn from_millis(millis: u64) -> Self {
        Timestamp { millis }
    }

    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Timestamp { millis }
    }

    /// Saturates to zero when `earlier` is actually later (clock skew between producers).
    pub fn duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.millis.saturating_sub(earlier.millis))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp { millis: self.millis.saturating_add(rhs.as_millis() as u64) }
    }
}
