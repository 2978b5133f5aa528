//! Runtime dependency bundle for the progression controller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};

/// Async sleeping abstraction used to pace batch completions.
#[async_trait]
pub trait BatchSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use std::sync::Mutex;
    /// use std::time::Duration;
    /// use tidequest::domain::BatchSleeper;
    ///
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Mutex<u32>,
    /// }
    ///
    /// #[async_trait]
    /// impl BatchSleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_millis(600)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl BatchSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock and sleeper used by the controller.
pub struct ControllerRuntime {
    /// Time source for completion stamps and celebration windows.
    pub clock: Arc<dyn Clock>,
    /// Pacing between batch steps.
    pub sleeper: Arc<dyn BatchSleeper>,
}

impl Default for ControllerRuntime {
    fn default() -> Self {
        Self {
            clock: Arc::new(DefaultClock),
            sleeper: Arc::new(TokioSleeper),
        }
    }
}

/// Timing knobs for the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Pause between consecutive completions in a batch.
    pub batch_step_delay: Duration,
    /// How long a level-up celebration stays active.
    pub celebration_window: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            batch_step_delay: Duration::from_millis(600),
            celebration_window: Duration::from_secs(5),
        }
    }
}
