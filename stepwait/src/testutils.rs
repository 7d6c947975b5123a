use crate::{clock::Clock, status::Refresh};

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt, time,
};

/// A clock that only moves when slept on or explicitly advanced.
pub struct ManualClock {
    start: time::Instant,
    offset: Cell<time::Duration>,
    sleeps: RefCell<Vec<time::Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: time::Instant::now(),
            offset: Cell::new(time::Duration::ZERO),
            sleeps: RefCell::new(Vec::new()),
        }
    }

    pub fn advance(&self, duration: time::Duration) {
        self.offset.set(self.offset.get() + duration);
    }

    pub fn elapsed(&self) -> time::Duration {
        self.offset.get()
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<time::Duration> {
        self.sleeps.borrow().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> time::Instant {
        self.start + self.offset.get()
    }

    fn sleep(&self, duration: time::Duration) {
        self.sleeps.borrow_mut().push(duration);
        self.advance(duration);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DummyApiError(pub String);

impl fmt::Display for DummyApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cloud resource going through a scripted sequence of statuses, one per refresh.
///
/// An `Err` entry makes the corresponding refresh fail. Once the script is exhausted the
/// resource keeps its last status.
pub struct DummyResource {
    pub status: String,
    pub script: VecDeque<Result<String, DummyApiError>>,
    pub refreshes: usize,
}

impl DummyResource {
    pub fn new(initial: &str, script: &[Result<&str, &str>]) -> Self {
        Self {
            status: initial.to_string(),
            script: script
                .iter()
                .map(|step| match step {
                    Ok(status) => Ok(status.to_string()),
                    Err(e) => Err(DummyApiError(e.to_string())),
                })
                .collect(),
            refreshes: 0,
        }
    }
}

impl Refresh for DummyResource {
    type Error = DummyApiError;

    fn refresh(&mut self) -> Result<(), Self::Error> {
        self.refreshes += 1;
        match self.script.pop_front() {
            Some(Ok(status)) => {
                self.status = status;
                Ok(())
            }
            Some(Err(e)) => Err(e),
            None => Ok(()),
        }
    }

    fn status(&self) -> &str {
        &self.status
    }
}
