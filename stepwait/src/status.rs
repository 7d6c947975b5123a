//! Status steps over cloud resources.

use crate::{
    clock::Clock,
    expect::{equal_to, expect_that, is_in, is_not},
    waiter::{WaitConfig, WaitError, Waiter},
};

use std::fmt;

/// A remote resource whose status can be fetched again.
///
/// This is all a status step needs to know about a volume, a server or a stack.
pub trait Refresh {
    type Error;

    /// Fetch the current state of the resource from the service.
    fn refresh(&mut self) -> Result<(), Self::Error>;

    /// The status as of the last refresh.
    fn status(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum StatusError<E> {
    #[error("{0}")]
    Wait(WaitError<E>),
    #[error("Unexpected status '{status}', expected one of {expected:?}.")]
    Unexpected {
        status: String,
        expected: Vec<String>,
    },
}

impl<E> From<WaitError<E>> for StatusError<E> {
    fn from(e: WaitError<E>) -> Self {
        Self::Wait(e)
    }
}

/// Wait for the resource to leave the `transit` statuses, then check it ended up in one of the
/// `expected` ones.
///
/// Statuses are compared case-insensitively. Errors refreshing the resource abort the step
/// unless the configuration declares them retryable.
pub fn check_status<C, R>(
    waiter: &Waiter<C>,
    resource: &mut R,
    expected: &[&str],
    transit: &[&str],
    config: &WaitConfig<R::Error>,
) -> Result<(), StatusError<R::Error>>
where
    C: Clock,
    R: Refresh,
    R::Error: fmt::Display,
{
    let transit: Vec<String> = transit.iter().map(|s| s.to_lowercase()).collect();
    waiter.try_wait(config, || -> Result<_, R::Error> {
        resource.refresh()?;
        Ok(expect_that(
            resource.status().to_lowercase(),
            is_not(is_in(transit.iter().cloned())),
        ))
    })?;

    let status = resource.status().to_lowercase();
    if expected.iter().any(|s| s.to_lowercase() == status) {
        Ok(())
    } else {
        Err(StatusError::Unexpected {
            status,
            expected: expected.iter().map(|s| s.to_string()).collect(),
        })
    }
}

/// Wait for `lookup` to report the resource as present, or as absent if `must_present` is
/// false.
pub fn check_presence<C, F, E>(
    waiter: &Waiter<C>,
    mut lookup: F,
    must_present: bool,
    config: &WaitConfig<E>,
) -> Result<(), WaitError<E>>
where
    C: Clock,
    F: FnMut() -> Result<bool, E>,
    E: fmt::Display,
{
    waiter
        .try_wait(config, || -> Result<_, E> {
            Ok(expect_that(lookup()?, equal_to(must_present)))
        })
        .map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{DummyApiError, DummyResource, ManualClock};

    use std::{cell::Cell, time::Duration};

    #[test]
    fn status_leaves_transit() {
        let clock = ManualClock::new();
        let waiter = Waiter::new(&clock);
        let mut volume = DummyResource::new(
            "creating",
            &[Ok("creating"), Ok("downloading"), Ok("Available")],
        );

        let config = WaitConfig::new().timeout(Duration::from_secs(300));
        check_status(
            &waiter,
            &mut volume,
            &["available"],
            &["creating", "downloading"],
            &config,
        )
        .unwrap();
        assert_eq!(volume.refreshes, 3);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn unexpected_final_status() {
        let clock = ManualClock::new();
        let waiter = Waiter::new(&clock);
        let mut volume = DummyResource::new("creating", &[Ok("creating"), Ok("error")]);

        let config = WaitConfig::new().timeout(Duration::from_secs(300));
        match check_status(&waiter, &mut volume, &["available"], &["creating"], &config) {
            Err(StatusError::Unexpected { status, expected }) => {
                assert_eq!(status, "error");
                assert_eq!(expected, vec!["available".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn stuck_in_transit() {
        let clock = ManualClock::new();
        let waiter = Waiter::new(&clock);
        let mut stack = DummyResource::new("create_in_progress", &[]);

        let config = WaitConfig::new()
            .timeout(Duration::from_secs(10))
            .polling_interval(Duration::from_secs(5))
            .name("_check_stack_status");
        let err = check_status(
            &waiter,
            &mut stack,
            &["create_complete"],
            &["CREATE_IN_PROGRESS"],
            &config,
        )
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("_check_stack_status returned false with timeout 10.000 seconds."));
        assert!(msg.contains("but: was \"create_in_progress\""));
        assert_eq!(stack.refreshes, 3);
    }

    #[test]
    fn refresh_errors() {
        let clock = ManualClock::new();
        let waiter = Waiter::new(&clock);

        // Not retryable: the step fails on the first error.
        let mut server = DummyResource::new("build", &[Err("Internal Server Error")]);
        let config = WaitConfig::new().timeout(Duration::from_secs(60));
        match check_status(&waiter, &mut server, &["active"], &["build"], &config) {
            Err(StatusError::Wait(WaitError::Predicate(e))) => {
                assert_eq!(e, DummyApiError("Internal Server Error".to_string()))
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(server.refreshes, 1);

        // Retryable: it's just another failed attempt.
        let mut server =
            DummyResource::new("build", &[Err("Service Unavailable"), Ok("build"), Ok("active")]);
        let config = WaitConfig::new()
            .timeout(Duration::from_secs(60))
            .retry_on(|e: &DummyApiError| e.0 == "Service Unavailable");
        check_status(&waiter, &mut server, &["active"], &["build"], &config).unwrap();
        assert_eq!(server.refreshes, 3);
    }

    #[test]
    fn presence() {
        let clock = ManualClock::new();
        let waiter = Waiter::new(&clock);
        let lookups = Cell::new(0);

        let config = WaitConfig::new().timeout(Duration::from_secs(30));
        check_presence(
            &waiter,
            || -> Result<bool, DummyApiError> {
                lookups.set(lookups.get() + 1);
                Ok(lookups.get() >= 2)
            },
            true,
            &config,
        )
        .unwrap();
        assert_eq!(lookups.get(), 2);

        let config = WaitConfig::new()
            .timeout(Duration::from_secs(2))
            .name("_check_project_presence");
        let err = check_presence(
            &waiter,
            || -> Result<bool, DummyApiError> { Ok(true) },
            false,
            &config,
        )
        .unwrap_err();
        assert!(err.is_timeout());
        assert!(err
            .to_string()
            .ends_with("Expected: false\n     but: was true"));
    }
}
