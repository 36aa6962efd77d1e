//! Retry strategies for capture device acquisition.
//!
//! Acquisition must fail fast: strategies are bounded and the default
//! (`config::capture`) makes a single attempt.

use std::time::Duration;

use crate::config::EngineConfig;

/// How many attempts to make and how long to wait between them.
pub trait RetryStrategy {
    fn max_attempts(&self) -> u32;

    /// Delay after the given failed attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration>;

    /// Call `f` up to `max_attempts()` times, sleeping between failures.
    fn execute<T, E, F>(&self, mut f: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
    {
        let max = self.max_attempts().max(1);
        let mut attempt = 0;
        loop {
            match f(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt + 1 >= max => return Err(e),
                Err(_) => {
                    if let Some(delay) = self.delay_for_attempt(attempt).filter(|d| !d.is_zero()) {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Constant delay between a fixed number of attempts.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    max_attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Acquisition policy from the engine configuration.
    pub fn for_acquisition(config: &EngineConfig) -> Self {
        Self::new(
            config.acquire_attempts,
            Duration::from_millis(config.acquire_retry_delay_ms),
        )
    }
}

impl RetryStrategy for FixedDelay {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for_attempt(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}
