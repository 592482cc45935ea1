//! Constructors for common coroutine shapes.
//!
//! Everything built here is fused: after a coroutine completes or fails,
//! further calls return [`Error::AlreadyComplete`] instead of running the
//! closure again.

use serde_json::Value;

use crate::{Coroutine, Error, Request, Resumed, Step};

/// A coroutine backed by a closure that sees every input, successful or not.
///
/// Created by [`from_fn`].
pub struct FromFn<F> {
    f: F,
    finished: bool,
}

/// Create a coroutine from a closure.
///
/// The closure receives `Ok(value)` on resume and `Err(error)` on raise, so a
/// single match covers both directions.
///
/// ```rust
/// use costep::prelude::*;
/// use serde_json::json;
///
/// let mut retries = 0;
/// let mut co = from_fn(move |input: Result<Value, Error>| match input {
///     Err(_) if retries < 2 => {
///         retries += 1;
///         Ok(Step::Yielded(Request::value(json!([]))))
///     }
///     Err(e) => Err(e),
///     Ok(v) => Ok(Step::Complete(v)),
/// });
/// assert_eq!(co.resume(json!(7)).unwrap().unwrap_complete(), json!(7));
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(Result<Value, Error>) -> Resumed,
{
    FromFn { f, finished: false }
}

impl<F> FromFn<F>
where
    F: FnMut(Result<Value, Error>) -> Resumed,
{
    fn advance(&mut self, input: Result<Value, Error>) -> Resumed {
        if self.finished {
            return Err(Error::AlreadyComplete);
        }
        let step = (self.f)(input);
        if !step.as_ref().is_ok_and(Step::is_yielded) {
            self.finished = true;
        }
        step
    }
}

impl<F> Coroutine for FromFn<F>
where
    F: FnMut(Result<Value, Error>) -> Resumed,
{
    fn resume(&mut self, input: Value) -> Resumed {
        self.advance(Ok(input))
    }

    fn raise(&mut self, error: Error) -> Resumed {
        self.advance(Err(error))
    }
}

enum OnceState<F> {
    Start(Request, F),
    Waiting(F),
    Finished,
}

/// Yields a single request, then completes with whatever `f` makes of its
/// outcome.
///
/// Created by [`once`].
pub struct Once<F> {
    state: OnceState<F>,
}

/// Create a coroutine that yields `request` once and finishes with
/// `f(outcome)`.
///
/// Returning `Err` from `f` fails the coroutine; returning `Ok` for an `Err`
/// outcome recovers from it.
pub fn once<F>(request: impl Into<Request>, f: F) -> Once<F>
where
    F: FnOnce(Result<Value, Error>) -> Result<Value, Error>,
{
    Once {
        state: OnceState::Start(request.into(), f),
    }
}

impl<F> Once<F>
where
    F: FnOnce(Result<Value, Error>) -> Result<Value, Error>,
{
    fn advance(&mut self, input: Result<Value, Error>) -> Resumed {
        match std::mem::replace(&mut self.state, OnceState::Finished) {
            OnceState::Start(request, f) => match input {
                Ok(_) => {
                    self.state = OnceState::Waiting(f);
                    Ok(Step::Yielded(request))
                }
                Err(e) => Err(e),
            },
            OnceState::Waiting(f) => f(input).map(Step::Complete),
            OnceState::Finished => Err(Error::AlreadyComplete),
        }
    }
}

impl<F> Coroutine for Once<F>
where
    F: FnOnce(Result<Value, Error>) -> Result<Value, Error>,
{
    fn resume(&mut self, input: Value) -> Resumed {
        self.advance(Ok(input))
    }

    fn raise(&mut self, error: Error) -> Resumed {
        self.advance(Err(error))
    }
}

/// Completes immediately with a fixed value.
///
/// Created by [`done`].
pub struct Done(Option<Value>);

/// Create a coroutine that never yields and completes with `value`.
pub fn done(value: Value) -> Done {
    Done(Some(value))
}

impl Coroutine for Done {
    fn resume(&mut self, _input: Value) -> Resumed {
        self.0.take().map(Step::Complete).ok_or(Error::AlreadyComplete)
    }
}
