use crate::{
    attempt::{Attempt, IntoAttempt},
    clock::{Clock, SystemClock},
    config::ConfigError,
};

use std::{any, convert::Infallible, error, fmt, sync::Arc, time::Duration};

/// How long to sleep between two attempts when nothing else was configured.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(1);

type Classifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// How to poll a predicate: for how long, how often and which errors mean "not ready yet".
///
/// Values are only validated when waiting, so that the setters can be chained. An invalid
/// configuration makes the wait fail with [`WaitError::Config`] before the predicate is ever
/// called.
pub struct WaitConfig<E = Infallible> {
    timeout_secs: f64,
    polling_interval_secs: f64,
    backoff_rate: f64,
    retryable: Vec<Classifier<E>>,
    name: Option<String>,
    waiting_for: Option<String>,
}

impl<E> WaitConfig<E> {
    /// A single attempt, polling every [`DEFAULT_POLLING_INTERVAL`] should the timeout be
    /// raised, no backoff and no retryable error.
    pub fn new() -> Self {
        Self {
            timeout_secs: 0.0,
            polling_interval_secs: DEFAULT_POLLING_INTERVAL.as_secs_f64(),
            backoff_rate: 1.0,
            retryable: Vec::new(),
            name: None,
            waiting_for: None,
        }
    }

    /// Total time budget. Zero means a single attempt.
    pub fn timeout(self, timeout: Duration) -> Self {
        self.timeout_secs(timeout.as_secs_f64())
    }

    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Time to sleep after the first failed attempt.
    pub fn polling_interval(self, interval: Duration) -> Self {
        self.polling_interval_secs(interval.as_secs_f64())
    }

    pub fn polling_interval_secs(mut self, secs: f64) -> Self {
        self.polling_interval_secs = secs;
        self
    }

    /// The polling interval is multiplied by this rate after each sleep. 1 keeps it constant.
    pub fn backoff_rate(mut self, rate: f64) -> Self {
        self.backoff_rate = rate;
        self
    }

    /// Treat the predicate errors matching this classifier as a failed attempt instead of
    /// aborting the wait. Classifiers accumulate.
    pub fn retry_on<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.retryable.push(Arc::new(classifier));
        self
    }

    /// Treat any predicate error as a failed attempt.
    pub fn retry_all(self) -> Self {
        self.retry_on(|_| true)
    }

    /// Name the predicate in the timeout error. Defaults to the predicate's type name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Describe what we are waiting for in the timeout error.
    pub fn waiting_for(mut self, description: impl Into<String>) -> Self {
        self.waiting_for = Some(description.into());
        self
    }

    pub fn is_retryable(&self, error: &E) -> bool {
        self.retryable.iter().any(|classifier| classifier(error))
    }

    /// Make sure the settings are sane.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.limits().map(|_| ())
    }

    fn limits(&self) -> Result<Limits, ConfigError> {
        if self.timeout_secs.is_nan() || self.timeout_secs < 0.0 {
            return Err(ConfigError::InvalidTimeout(self.timeout_secs));
        }
        if self.polling_interval_secs.is_nan() || self.polling_interval_secs <= 0.0 {
            return Err(ConfigError::InvalidPollingInterval(
                self.polling_interval_secs,
            ));
        }
        if !self.backoff_rate.is_finite() || self.backoff_rate < 1.0 {
            return Err(ConfigError::InvalidBackoffRate(self.backoff_rate));
        }

        Ok(Limits {
            timeout: secs_to_duration(self.timeout_secs),
            polling_interval: secs_to_duration(self.polling_interval_secs),
            backoff_rate: self.backoff_rate,
        })
    }
}

impl<E> Default for WaitConfig<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for WaitConfig<E> {
    fn clone(&self) -> Self {
        Self {
            timeout_secs: self.timeout_secs,
            polling_interval_secs: self.polling_interval_secs,
            backoff_rate: self.backoff_rate,
            retryable: self.retryable.clone(),
            name: self.name.clone(),
            waiting_for: self.waiting_for.clone(),
        }
    }
}

impl<E> fmt::Debug for WaitConfig<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitConfig")
            .field("timeout_secs", &self.timeout_secs)
            .field("polling_interval_secs", &self.polling_interval_secs)
            .field("backoff_rate", &self.backoff_rate)
            .field("retryable", &self.retryable.len())
            .field("name", &self.name)
            .field("waiting_for", &self.waiting_for)
            .finish()
    }
}

// Saturates instead of failing on durations too large to be represented.
fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

// The validated settings of a single wait.
struct Limits {
    timeout: Duration,
    polling_interval: Duration,
    backoff_rate: f64,
}

impl Limits {
    fn next_interval(&self, interval: Duration) -> Duration {
        if self.backoff_rate == 1.0 {
            return interval;
        }
        secs_to_duration(interval.as_secs_f64() * self.backoff_rate).max(interval)
    }
}

/// The predicate never succeeded within the time budget.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeoutError {
    predicate: String,
    waiting_for: Option<String>,
    elapsed: Duration,
    attempts: u32,
    detail: Option<String>,
}

impl TimeoutError {
    pub fn predicate(&self) -> &str {
        &self.predicate
    }

    pub fn waiting_for(&self) -> Option<&str> {
        self.waiting_for.as_deref()
    }

    /// The time actually spent waiting, as opposed to the configured timeout.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Why the last attempt failed, if known.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for TimeoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} returned false with timeout {:.3} seconds",
            self.predicate,
            self.elapsed.as_secs_f64()
        )?;
        if let Some(waiting_for) = &self.waiting_for {
            write!(f, " while waiting for {}", waiting_for)?;
        }
        write!(f, ".")?;
        if let Some(detail) = &self.detail {
            write!(f, " {}", detail)?;
        }
        Ok(())
    }
}

impl error::Error for TimeoutError {}

/// Why a wait did not return the predicate's result.
#[derive(Debug, thiserror::Error)]
pub enum WaitError<E = Infallible> {
    #[error("Invalid wait configuration: {0}")]
    Config(ConfigError),
    #[error("{0}")]
    Timeout(TimeoutError),
    /// The predicate failed with an error that is not retryable. It is passed through as is.
    #[error("{0}")]
    Predicate(E),
}

impl<E> WaitError<E> {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    pub fn as_timeout(&self) -> Option<&TimeoutError> {
        match self {
            Self::Timeout(e) => Some(e),
            _ => None,
        }
    }

    /// Get back the error the predicate failed with, if that is why the wait was aborted.
    pub fn into_predicate_error(self) -> Option<E> {
        match self {
            Self::Predicate(e) => Some(e),
            _ => None,
        }
    }
}

/// Polls predicates on a [`Clock`].
#[derive(Debug, Clone, Default)]
pub struct Waiter<C = SystemClock> {
    clock: C,
}

impl<C: Clock> Waiter<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Call `predicate` until it succeeds or the configured timeout elapses.
    ///
    /// The predicate is always called at least once. On success, its result is returned as
    /// soon as it is observed. Otherwise the returned [`TimeoutError`] contains the last
    /// reason the predicate gave for failing.
    pub fn wait<P, R, T>(&self, config: &WaitConfig, mut predicate: P) -> Result<T, WaitError>
    where
        P: FnMut() -> R,
        R: IntoAttempt<T>,
    {
        self.poll(config, any::type_name::<P>(), || {
            Ok::<_, Infallible>(predicate())
        })
    }

    /// Same as [`Waiter::wait`] for a fallible predicate.
    ///
    /// Errors the configuration declares retryable count as a failed attempt, their message
    /// being the reason for the failure. Any other error aborts the wait right away and is
    /// returned in [`WaitError::Predicate`].
    pub fn try_wait<P, R, T, E>(
        &self,
        config: &WaitConfig<E>,
        predicate: P,
    ) -> Result<T, WaitError<E>>
    where
        P: FnMut() -> Result<R, E>,
        R: IntoAttempt<T>,
        E: fmt::Display,
    {
        self.poll(config, any::type_name::<P>(), predicate)
    }

    fn poll<P, R, T, E>(
        &self,
        config: &WaitConfig<E>,
        type_name: &str,
        mut predicate: P,
    ) -> Result<T, WaitError<E>>
    where
        P: FnMut() -> Result<R, E>,
        R: IntoAttempt<T>,
        E: fmt::Display,
    {
        let limits = config.limits().map_err(WaitError::Config)?;
        let name = config.name.as_deref().unwrap_or(type_name);

        let start = self.clock.now();
        // No deadline if it can't be represented, we'd never reach it anyways.
        let deadline = start.checked_add(limits.timeout);
        let mut interval = limits.polling_interval;
        let mut attempts: u32 = 0;

        let detail = loop {
            attempts = attempts.saturating_add(1);

            let detail = match predicate() {
                Ok(res) => match res.into_attempt() {
                    Attempt::Ready(value) => {
                        log::debug!("'{}' succeeded after {} attempt(s).", name, attempts);
                        return Ok(value);
                    }
                    Attempt::NotYet(detail) => detail,
                },
                Err(e) if config.is_retryable(&e) => Some(e.to_string()),
                Err(e) => return Err(WaitError::Predicate(e)),
            };
            log::debug!(
                "Attempt #{} of '{}' failed: {}",
                attempts,
                name,
                detail.as_deref().unwrap_or("no detail")
            );

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(self.clock.now()),
                None => Duration::MAX,
            };
            // Don't sleep if we would wake up past the deadline.
            if remaining.is_zero() || interval > remaining {
                break detail;
            }

            log::trace!("Sleeping {:?} before polling '{}' again.", interval, name);
            self.clock.sleep(interval);
            interval = limits.next_interval(interval);
        };

        let error = TimeoutError {
            predicate: name.to_string(),
            waiting_for: config.waiting_for.clone(),
            elapsed: self.clock.now().saturating_duration_since(start),
            attempts,
            detail,
        };
        log::debug!("{}", error);
        Err(WaitError::Timeout(error))
    }
}

/// Call `predicate` until it succeeds or the configured timeout elapses, on the wall clock.
///
/// See [`Waiter::wait`].
pub fn wait<P, R, T>(config: &WaitConfig, predicate: P) -> Result<T, WaitError>
where
    P: FnMut() -> R,
    R: IntoAttempt<T>,
{
    Waiter::new(SystemClock).wait(config, predicate)
}

/// Call a fallible `predicate` until it succeeds or the configured timeout elapses, on the
/// wall clock.
///
/// See [`Waiter::try_wait`].
pub fn try_wait<P, R, T, E>(config: &WaitConfig<E>, predicate: P) -> Result<T, WaitError<E>>
where
    P: FnMut() -> Result<R, E>,
    R: IntoAttempt<T>,
    E: fmt::Display,
{
    Waiter::new(SystemClock).try_wait(config, predicate)
}
