use stepwait::status::Refresh;

use std::{
    fmt,
    time::{Duration, Instant},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The service does not know about the resource (yet).
    NotFound(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "Resource '{}' could not be found.", id),
            Self::Internal(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// A volume whose status follows a timeline on the wall clock.
///
/// Until `visible_after` the service answers "not found", then the status is the last one of
/// `timeline` whose offset has passed.
pub struct FakeVolume {
    pub id: String,
    created_at: Instant,
    visible_after: Duration,
    timeline: Vec<(Duration, &'static str)>,
    status: String,
}

impl FakeVolume {
    pub fn new(id: &str, timeline: &[(Duration, &'static str)]) -> Self {
        Self {
            id: id.to_string(),
            created_at: Instant::now(),
            visible_after: Duration::ZERO,
            timeline: timeline.to_vec(),
            status: "unknown".to_string(),
        }
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_after = delay;
        self
    }
}

impl Refresh for FakeVolume {
    type Error = ApiError;

    fn refresh(&mut self) -> Result<(), ApiError> {
        let age = self.age();
        if age < self.visible_after {
            return Err(ApiError::NotFound(self.id.clone()));
        }
        if let Some((_, status)) = self.timeline.iter().rev().find(|(at, _)| *at <= age) {
            self.status = status.to_string();
        }
        Ok(())
    }

    fn status(&self) -> &str {
        &self.status
    }
}
