//! `Clock` collaborator (§6): the only source of "now" the core consumes,
//! so tests can pin time instead of racing the wall clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    fn now(&self, tz: Tz) -> DateTime<Tz> {
        self.now_utc().with_timezone(&tz)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test/double clock pinned to a fixed instant, advanced explicitly.
#[derive(Debug, Clone)]
pub struct FixedClock {
    inner: std::sync::Arc<std::sync::Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            inner: std::sync::Arc::new(std::sync::Mutex::new(at)),
        }
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.inner.lock().unwrap();
        *guard += delta;
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.inner.lock().unwrap() = at;
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.inner.lock().unwrap()
    }
}
