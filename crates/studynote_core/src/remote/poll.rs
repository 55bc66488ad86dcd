//! Blocking wait-with-backoff for long-running remote operations.
//!
//! # Invariants
//! - The state is fetched at least once, even with a zero `max_wait`.
//! - Retry delays come from `backoff::ExponentialBackoff`; once its elapsed
//!   time passes `max_wait` the loop stops with `PollError::TimedOut`.
//! - Delays grow geometrically and are capped at `max_delay`.

use backoff::ExponentialBackoff;
use std::time::{Duration, Instant};

const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(500);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_MULTIPLIER: f64 = 2.0;
const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(600);

/// Backoff and bound settings for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            multiplier: DEFAULT_MULTIPLIER,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl PollPolicy {
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Delay schedule without jitter, bounded by `max_wait`.
    fn schedule(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_delay,
            initial_interval: self.initial_delay,
            randomization_factor: 0.0,
            multiplier: self.multiplier.max(1.0),
            max_interval: self.max_delay,
            max_elapsed_time: Some(self.max_wait),
            ..ExponentialBackoff::default()
        }
    }
}

#[derive(Debug)]
pub enum PollError<E> {
    /// Fetching the state failed.
    Source(E),
    /// The state was still non-terminal when the bound ran out.
    TimedOut { attempts: u32, waited: Duration },
}

enum Attempt<E> {
    Failed(E),
    Pending,
}

/// Repeatedly calls `fetch` until `is_terminal` accepts the returned state.
///
/// Fetch errors end the loop immediately.
pub fn wait_until<T, E, F, P>(
    policy: &PollPolicy,
    mut fetch: F,
    is_terminal: P,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&T) -> bool,
{
    let started_at = Instant::now();
    let mut attempts = 0_u32;

    let outcome = backoff::retry(policy.schedule(), || {
        attempts = attempts.saturating_add(1);
        match fetch() {
            Err(err) => Err(backoff::Error::permanent(Attempt::Failed(err))),
            Ok(state) if is_terminal(&state) => Ok(state),
            Ok(_) => Err(backoff::Error::transient(Attempt::Pending)),
        }
    });

    outcome.map_err(|err| match err {
        backoff::Error::Permanent(Attempt::Failed(source))
        | backoff::Error::Transient {
            err: Attempt::Failed(source),
            ..
        } => PollError::Source(source),
        backoff::Error::Permanent(Attempt::Pending)
        | backoff::Error::Transient {
            err: Attempt::Pending,
            ..
        } => PollError::TimedOut {
            attempts,
            waited: started_at.elapsed(),
        },
    })
}
