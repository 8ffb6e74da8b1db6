//! A sticky record of the first failure in a parse

use crate::ReadError;

/// The first error encountered while parsing a branch of a font.
///
/// Every fallible operation in this crate returns a `Result`. Parsers that
/// walk deeply nested structures often prefer to check for errors only at a
/// few points; `Status` lets them do so safely. Operations are run through
/// [`Status::check`], which records the first error and turns every later
/// operation into a no-op returning an empty default (an empty window, a zero
/// count, `None`).
///
/// Once set, the error is never replaced or cleared.
///
/// ```
/// use font_window::{Length, Status, Window};
///
/// let data = [0u8; 10];
/// let root = Window::raw(&data);
/// let mut status = Status::new();
///
/// let bad = status.check(|| root.subset(8, Length::Bounded(5)));
/// assert!(bad.is_empty());
///
/// // later derivations short-circuit to empty windows
/// let child = status.check(|| root.subset(0, Length::Bounded(4)));
/// assert!(child.is_empty());
/// assert!(status.into_result().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Status {
    error: Option<ReadError>,
}

impl Status {
    /// A status that has not seen any errors.
    pub const fn new() -> Self {
        Status { error: None }
    }

    /// `true` if no failure has been recorded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// `true` if a failure has been recorded.
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// The recorded failure, if any.
    pub fn error(&self) -> Option<ReadError> {
        self.error
    }

    /// Record `error`, unless an earlier error was already recorded.
    pub fn fail(&mut self, error: ReadError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Run `op` if no failure has been recorded.
    ///
    /// If `op` fails its error is recorded. In either failure case the
    /// default value of `T` is returned, and `op` is not run at all when a
    /// failure was recorded earlier.
    pub fn check<T: Default>(&mut self, op: impl FnOnce() -> Result<T, ReadError>) -> T {
        self.check_or(T::default(), op)
    }

    /// Like [`Status::check`], returning `fallback` on failure.
    pub fn check_or<T>(&mut self, fallback: T, op: impl FnOnce() -> Result<T, ReadError>) -> T {
        if self.error.is_some() {
            return fallback;
        }
        match op() {
            Ok(value) => value,
            Err(e) => {
                self.error = Some(e);
                fallback
            }
        }
    }

    /// Record the error from `result`, if any, and convert it to an `Option`.
    pub fn record<T>(&mut self, result: Result<T, ReadError>) -> Option<T> {
        match result {
            Ok(_) if self.error.is_some() => None,
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    /// Convert into a `Result`, surfacing the recorded error.
    pub fn into_result(self) -> Result<(), ReadError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Return `value` if no failure was recorded.
    ///
    /// This is the usual way to finish a parse: partially built results are
    /// discarded if any step failed.
    pub fn finish<T>(self, value: T) -> Result<T, ReadError> {
        self.into_result().map(|_| value)
    }
}

impl From<Status> for Result<(), ReadError> {
    fn from(src: Status) -> Self {
        src.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut status = Status::new();
        assert!(status.is_ok());
        status.fail(ReadError::IllegalArgument);
        status.fail(ReadError::OutOfBounds);
        assert_eq!(status.error(), Some(ReadError::IllegalArgument));
        assert_eq!(status.into_result(), Err(ReadError::IllegalArgument));
    }

    #[test]
    fn check_skips_after_failure() {
        let mut status = Status::new();
        let mut calls = 0;
        let first: u32 = status.check(|| {
            calls += 1;
            Err(ReadError::OutOfBounds)
        });
        assert_eq!(first, 0);
        let second: u32 = status.check(|| {
            calls += 1;
            Ok(7)
        });
        assert_eq!(second, 0);
        assert_eq!(calls, 1);
    }

    #[test]
    fn check_passes_values_through() {
        let mut status = Status::new();
        assert_eq!(status.check(|| Ok(5u16)), 5);
        assert_eq!(status.check_or(Some(1), || Ok(Some(2))), Some(2));
        assert_eq!(status.finish("done"), Ok("done"));
    }

    #[test]
    fn record_discards_late_successes() {
        let mut status = Status::new();
        assert_eq!(status.record(Ok::<_, ReadError>(1)), Some(1));
        assert_eq!(status.record::<u8>(Err(ReadError::OutOfBounds)), None);
        assert_eq!(status.record(Ok::<_, ReadError>(3)), None);
        let result: Result<(), ReadError> = status.into();
        assert_eq!(result, Err(ReadError::OutOfBounds));
    }
}
