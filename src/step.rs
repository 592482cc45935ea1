/// Outcome of advancing a coroutine by one step.
///
/// A coroutine either pauses with an intermediate value it needs resolved
/// (`Yielded`) or finishes with its final value (`Complete`).
///
/// # Examples
///
/// ```rust
/// use costep::Step;
///
/// let paused: Step<i32, &str> = Step::Yielded(42);
/// let finished: Step<i32, &str> = Step::Complete("done");
///
/// assert!(paused.is_yielded());
/// assert_eq!(finished.unwrap_complete(), "done");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step<Y, D> {
    /// Paused, waiting on an intermediate value
    Yielded(Y),
    /// Finished with a final value
    Complete(D),
}

impl<Y, D> Step<Y, D> {
    /// Returns `true` if the step is `Yielded`.
    #[inline]
    pub const fn is_yielded(&self) -> bool {
        matches!(self, Step::Yielded(_))
    }

    /// Returns `true` if the step is `Complete`.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Step::Complete(_))
    }

    /// Returns the final value.
    ///
    /// # Panics
    ///
    /// Panics if the step is `Yielded`.
    #[inline]
    #[track_caller]
    pub fn unwrap_complete(self) -> D {
        match self {
            Step::Yielded(_) => panic!("called `Step::unwrap_complete()` on a `Yielded` value"),
            Step::Complete(d) => d,
        }
    }
}
