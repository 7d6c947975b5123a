//! Expectations as predicate results.
//!
//! Steps commonly poll until some observed value matches an expectation. [`expect_that`] does
//! the check and, on mismatch, explains it. Its result can be returned as is from a predicate.
//!
//! ```ignore
//! waiter.try_wait(&config, || {
//!     server.refresh()?;
//!     Ok(expect_that(server.status(), is_not(is_in(["build", "rebuild"]))))
//! })?;
//! ```

use std::fmt;

/// A check on a value, able to describe what it expects.
pub trait Matcher<T: ?Sized> {
    fn matches(&self, actual: &T) -> bool;

    fn describe(&self) -> String;
}

/// Check `actual` against `matcher`, returning the success flag along with an explanation of
/// the mismatch if any.
pub fn expect_that<T, M>(actual: T, matcher: M) -> (bool, Option<String>)
where
    T: fmt::Debug,
    M: Matcher<T>,
{
    if matcher.matches(&actual) {
        (true, None)
    } else {
        (
            false,
            Some(format!(
                "Expected: {}\n     but: was {:?}",
                matcher.describe(),
                actual
            )),
        )
    }
}

#[derive(Debug, Clone)]
pub struct EqualTo<U>(U);

/// Matches values equal to `expected`.
pub fn equal_to<U>(expected: U) -> EqualTo<U> {
    EqualTo(expected)
}

impl<T, U> Matcher<T> for EqualTo<U>
where
    T: PartialEq<U> + ?Sized,
    U: fmt::Debug,
{
    fn matches(&self, actual: &T) -> bool {
        actual == &self.0
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct IsIn<U>(Vec<U>);

/// Matches values equal to any of `candidates`.
pub fn is_in<U, I>(candidates: I) -> IsIn<U>
where
    I: IntoIterator<Item = U>,
{
    IsIn(candidates.into_iter().collect())
}

impl<T, U> Matcher<T> for IsIn<U>
where
    T: PartialEq<U> + ?Sized,
    U: fmt::Debug,
{
    fn matches(&self, actual: &T) -> bool {
        self.0.iter().any(|candidate| actual == candidate)
    }

    fn describe(&self) -> String {
        format!("one of {:?}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct IsNot<M>(M);

/// Inverts `matcher`.
pub fn is_not<M>(matcher: M) -> IsNot<M> {
    IsNot(matcher)
}

impl<T: ?Sized, M: Matcher<T>> Matcher<T> for IsNot<M> {
    fn matches(&self, actual: &T) -> bool {
        !self.0.matches(actual)
    }

    fn describe(&self) -> String {
        format!("not {}", self.0.describe())
    }
}

pub struct Satisfies<F> {
    description: String,
    check: F,
}

/// Matches values for which `check` holds.
pub fn satisfies<F>(description: impl Into<String>, check: F) -> Satisfies<F> {
    Satisfies {
        description: description.into(),
        check,
    }
}

impl<T: ?Sized, F: Fn(&T) -> bool> Matcher<T> for Satisfies<F> {
    fn matches(&self, actual: &T) -> bool {
        (self.check)(actual)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
