//! Clock abstraction so blackout scheduling can be driven by tests.

use chrono::{DateTime, Local, NaiveTime};
#[cfg(any(test, feature = "testing-support"))]
use std::sync::{Arc, Mutex};

/// Where the main loop gets the current time from.
pub trait TimeSource: Send {
    fn now(&self) -> DateTime<Local>;

    /// Local wall-clock time, which is all blackout windows care about.
    fn time_of_day(&self) -> NaiveTime {
        self.now().time()
    }
}

/// The system clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[cfg(any(test, feature = "testing-support"))]
#[derive(Clone)]
pub struct FixedTimeSource {
    time: Arc<Mutex<NaiveTime>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl FixedTimeSource {
    pub fn new(time: NaiveTime) -> Self {
        Self {
            time: Arc::new(Mutex::new(time)),
        }
    }

    pub fn set(&self, time: NaiveTime) {
        if let Ok(mut current) = self.time.lock() {
            *current = time;
        }
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for FixedTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
            .date_naive()
            .and_time(self.time_of_day())
            .and_local_timezone(Local)
            .earliest()
            .unwrap_or_else(Local::now)
    }

    fn time_of_day(&self) -> NaiveTime {
        self.time
            .lock()
            .map(|time| *time)
            .unwrap_or(NaiveTime::MIN)
    }
}
