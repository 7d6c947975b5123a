use std::{thread, time};

/// The source of time a [`crate::Waiter`] polls against.
///
/// The waiter never reads the system time nor sleeps by itself, it always goes through this
/// interface. This lets the test suite drive the polling loop on a virtual clock.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> time::Instant;

    /// Block the calling thread for the given duration.
    fn sleep(&self, duration: time::Duration);
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> time::Instant {
        time::Instant::now()
    }

    fn sleep(&self, duration: time::Duration) {
        thread::sleep(duration)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> time::Instant {
        (**self).now()
    }

    fn sleep(&self, duration: time::Duration) {
        (**self).sleep(duration)
    }
}
