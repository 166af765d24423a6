//! Retry budget and backoff between attempts.
//!
//! Only transport failures are retried (see [`Error::is_retryable`](crate::Error::is_retryable)).
//! The budget counts *additional* attempts: a budget of `n` allows `n + 1`
//! deliveries in total.

use rand::Rng;
use std::time::Duration;

/// Number of retries a freshly built client allows: one extra attempt after
/// the first.
pub const DEFAULT_MAX_RETRIES: usize = 1;

/// How long to wait before a retry.
///
/// # Examples
///
/// ```
/// use httputil::Backoff;
/// use std::time::Duration;
///
/// // Retry right away (the default)
/// let immediate = Backoff::None;
///
/// // 100ms, 200ms, 400ms... capped at 5s
/// let exponential = Backoff::Exponential {
///     initial_delay: Duration::from_millis(100),
///     max_delay: Duration::from_secs(5),
///     jitter: true,
/// };
///
/// // 1s between every attempt
/// let linear = Backoff::Linear {
///     delay: Duration::from_secs(1),
/// };
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,

    /// Wait a fixed delay before each retry.
    Linear {
        /// The delay between attempts.
        delay: Duration,
    },

    /// Wait `initial_delay * 2^(retry - 1)`, capped at `max_delay`.
    Exponential {
        /// The delay before the first retry.
        initial_delay: Duration,
        /// The maximum delay between retries.
        max_delay: Duration,
        /// Scale each delay by a random factor in `[0.5, 1.0]`.
        jitter: bool,
    },
}

impl Backoff {
    /// Returns the delay before the given retry (1-indexed).
    pub fn delay(&self, retry: usize) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Linear { delay } => *delay,
            Backoff::Exponential {
                initial_delay,
                max_delay,
                jitter,
            } => {
                let multiplier = 2u64.saturating_pow(retry.saturating_sub(1) as u32);
                let base_delay =
                    initial_delay.saturating_mul(multiplier.try_into().unwrap_or(u32::MAX));
                let delay = base_delay.min(*max_delay);

                if *jitter {
                    let jitter_factor = rand::thread_rng().gen_range(0.5..=1.0);
                    delay.mul_f64(jitter_factor)
                } else {
                    delay
                }
            }
        }
    }
}

/// The retry budget of a client together with its backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts allowed after the first one.
    pub max_retries: usize,
    /// Delay between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Creates a policy with `max_retries` retries and no delay between them.
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// Sets the backoff.
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total number of deliveries this policy permits.
    pub fn max_attempts(&self) -> usize {
        self.max_retries.saturating_add(1)
    }

    /// Returns the delay before the given retry (1-indexed), or `None` if the
    /// budget is exhausted.
    pub fn delay_for_retry(&self, retry: usize) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        Some(self.backoff.delay(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}
