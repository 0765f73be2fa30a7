use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use time::{Date, OffsetDateTime, UtcOffset};

pub const CLOCK_ENV_VAR: &str = "TASKBOARD_CLOCK_MS";

/// Source of wall-clock time in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, seconds: i64) {
        self.now.fetch_add(seconds * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// System clock unless `TASKBOARD_CLOCK_MS` pins the current time.
pub fn clock_from_env() -> Arc<dyn Clock> {
    if let Ok(raw) = std::env::var(CLOCK_ENV_VAR)
        && let Ok(now_ms) = raw.trim().parse::<i64>()
    {
        return Arc::new(FixedClock(now_ms));
    }

    Arc::new(SystemClock)
}

pub fn to_datetime(millis: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).ok()
}

pub fn local_offset() -> UtcOffset {
    UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC)
}

/// Calendar date of `millis` at `offset`.
pub fn local_date(millis: i64, offset: UtcOffset) -> Option<Date> {
    to_datetime(millis).map(|datetime| datetime.to_offset(offset).date())
}
