//! Retry policy for opening a clipboard that another process may hold.

use std::time::Duration;

/// Something that can wait. Production code sleeps the thread; tests record.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Exponential backoff: `base_delay * multiplier^n` after the n-th failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    /// 5 attempts, waiting 10, 20, 40, 80 and 160 ms.
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(10),
            multiplier: 2,
        }
    }
}

/// All attempts failed; carries the last error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl BackoffPolicy {
    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Longest total wait if every attempt fails.
    pub fn total_budget(&self) -> Duration {
        (0..self.max_attempts)
            .map(|attempt| self.delay_after(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// Every failed attempt is followed by its delay, the last one included,
    /// so a fully contended run stalls for [`total_budget`](Self::total_budget).
    /// At least one attempt is always made.
    pub fn retry<S, T, E, F>(&self, sleeper: &mut S, mut op: F) -> Result<T, RetryExhausted<E>>
    where
        S: Sleeper + ?Sized,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    sleeper.sleep(self.delay_after(attempt));
                    attempt += 1;
                    if attempt >= attempts {
                        return Err(RetryExhausted {
                            attempts,
                            last_error: err,
                        });
                    }
                }
            }
        }
    }
}
