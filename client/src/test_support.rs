//! Shared test doubles for controller tests.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! integration suites under `tests/`.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::BatchSleeper;

/// Lock `cell`, recovering the value if a panicking test poisoned it.
fn guard<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clock frozen at a chosen instant until a test moves it.
///
/// Lets celebration windows be crossed without waiting in real time.
pub struct MutableClock {
    now: Mutex<DateTime<Utc>>,
}

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Move the clock forward by `step`.
    ///
    /// # Panics
    /// When `step` does not fit a [`TimeDelta`].
    pub fn advance(&self, step: Duration) {
        let Ok(step) = TimeDelta::from_std(step) else {
            panic!("clock step {step:?} is out of range");
        };
        *guard(&self.now) += step;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *guard(&self.now)
    }
}

/// Batch sleeper that returns at once and logs each pacing delay.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Delays requested so far, oldest first.
    pub fn recorded(&self) -> Vec<Duration> {
        guard(&self.delays).clone()
    }
}

#[async_trait]
impl BatchSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        guard(&self.delays).push(duration);
    }
}

/// Sleeper that never finishes, for exercising cancellation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingSleeper;

#[async_trait]
impl BatchSleeper for PendingSleeper {
    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}
