//! Normalization of what a predicate may return.
//!
//! Status checks come in a few shapes: a plain flag, a flag along with the reason it is not
//! set yet, or the awaited value itself once it shows up. They are all turned into an
//! [`Attempt`] before the polling loop looks at them.

/// The outcome of a single predicate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T> {
    /// The condition holds, with the value to hand back to the caller.
    Ready(T),
    /// The condition does not hold yet, possibly with a human readable reason.
    NotYet(Option<String>),
}

impl<T> Attempt<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The reason this attempt failed, if it did and one was given.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::NotYet(detail) => detail.as_deref(),
        }
    }
}

/// Conversion of a predicate return value into an [`Attempt`].
pub trait IntoAttempt<T> {
    fn into_attempt(self) -> Attempt<T>;
}

impl<T> IntoAttempt<T> for Attempt<T> {
    fn into_attempt(self) -> Attempt<T> {
        self
    }
}

impl IntoAttempt<bool> for bool {
    fn into_attempt(self) -> Attempt<bool> {
        if self {
            Attempt::Ready(true)
        } else {
            Attempt::NotYet(None)
        }
    }
}

impl IntoAttempt<bool> for (bool, Option<String>) {
    fn into_attempt(self) -> Attempt<bool> {
        match self {
            (true, _) => Attempt::Ready(true),
            // An empty reason is no reason.
            (false, detail) => Attempt::NotYet(detail.filter(|d| !d.is_empty())),
        }
    }
}

impl IntoAttempt<bool> for (bool, String) {
    fn into_attempt(self) -> Attempt<bool> {
        (self.0, Some(self.1)).into_attempt()
    }
}

impl IntoAttempt<bool> for (bool, &str) {
    fn into_attempt(self) -> Attempt<bool> {
        (self.0, Some(self.1.to_string())).into_attempt()
    }
}

impl<T> IntoAttempt<T> for Option<T> {
    fn into_attempt(self) -> Attempt<T> {
        match self {
            Some(value) => Attempt::Ready(value),
            None => Attempt::NotYet(None),
        }
    }
}
