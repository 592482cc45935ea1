//! Driving a coroutine to a single completion.
//!
//! [`drive`] alternates between advancing a [`Coroutine`] and awaiting the
//! completion its latest [`Request`] normalizes to:
//!
//! - a successful request resumes the coroutine with its value,
//! - a failed request is raised into the coroutine, which may recover,
//! - an error returned while advancing fails the whole drive,
//! - a request with no conversion fails the drive with
//!   [`Error::InvalidRequest`].
//!
//! Nested coroutines are driven by a recursive [`drive`] whose completion
//! becomes the request's completion, so failures surface one level at a time.
//! Each nesting level adds a frame to every poll of the outer completion, so
//! stack use grows linearly with nesting depth.
//!
//! When a collection fails, its unfinished branches are not cancelled. The
//! drive that awaited the collection keeps polling them next to each later
//! request and discards their outcomes. Whatever is still running when the
//! outermost drive settles is dropped with it.

use either::Either;
use futures::FutureExt;
use futures::future::{self, BoxFuture};
use serde_json::Value;

use crate::join::{Settled, Strays, Tracked};
use crate::normalize::convert;
use crate::{BoxCoroutine, Coroutine, Error, Step};

/// The single outward completion of a drive.
///
/// Resolves with the coroutine's final value or fails with the error that
/// ended it. Like any future it does nothing until polled.
pub type Completion = BoxFuture<'static, Result<Value, Error>>;

/// What a drive starts from.
pub enum Start {
    /// Advanced step by step until it completes.
    Coroutine(BoxCoroutine),
    /// Resolved as-is, without inspection.
    Value(Value),
    /// Fails the drive right away.
    Failed(Error),
}

impl Start {
    pub fn coroutine<C>(coroutine: C) -> Self
    where
        C: Coroutine + Send + 'static,
    {
        Start::Coroutine(Box::new(coroutine))
    }
}

impl From<BoxCoroutine> for Start {
    fn from(coroutine: BoxCoroutine) -> Self {
        Start::Coroutine(coroutine)
    }
}

impl From<Value> for Start {
    fn from(value: Value) -> Self {
        Start::Value(value)
    }
}

impl<S> From<Result<S, Error>> for Start
where
    S: Into<Start>,
{
    fn from(result: Result<S, Error>) -> Self {
        match result {
            Ok(start) => start.into(),
            Err(error) => Start::Failed(error),
        }
    }
}

/// Drive a coroutine, or pass a plain value through.
///
/// ```rust
/// use costep::prelude::*;
/// use serde_json::json;
///
/// let co = once(
///     Request::all(vec![
///         Request::thunk(|cb| cb.ok(json!(1))),
///         Request::thunk(|cb| cb.ok(json!(2))),
///     ]),
///     |res| {
///         let values = res?;
///         let sum: i64 = values
///             .as_array()
///             .into_iter()
///             .flatten()
///             .filter_map(Value::as_i64)
///             .sum();
///         Ok(json!(sum))
///     },
/// );
///
/// let total = futures::executor::block_on(drive(co.boxed())).unwrap();
/// assert_eq!(total, json!(3));
/// ```
pub fn drive(start: impl Into<Start>) -> Completion {
    drive_tracked(start.into())
        .map(|settled| settled.outcome)
        .boxed()
}

pub(crate) fn drive_tracked(start: Start) -> Tracked {
    match start {
        Start::Coroutine(coroutine) => run(coroutine).boxed(),
        Start::Value(value) => future::ready(Settled::bare(Ok(value))).boxed(),
        Start::Failed(error) => future::ready(Settled::bare(Err(error))).boxed(),
    }
}

/// Build the starting point from `factory(args)` and drive it.
///
/// The factory runs immediately; the drive itself starts on first poll.
pub fn drive_with<F, S>(factory: F, args: Vec<Value>) -> Completion
where
    F: FnOnce(Vec<Value>) -> S,
    S: Into<Start>,
{
    drive(factory(args))
}

async fn run(mut coroutine: BoxCoroutine) -> Settled {
    let mut strays = Strays::default();
    let mut steps = 0_usize;
    tracing::debug!("drive started");
    let mut step = coroutine.resume(Value::Null);

    loop {
        let request = match step {
            Ok(Step::Complete(value)) => {
                tracing::debug!(steps, strays = strays.len(), "coroutine completed");
                return Settled {
                    outcome: Ok(value),
                    abandoned: strays.into_vec(),
                };
            }
            Ok(Step::Yielded(request)) => request,
            Err(error) => {
                tracing::debug!(steps, %error, "coroutine failed");
                return Settled {
                    outcome: Err(error),
                    abandoned: strays.into_vec(),
                };
            }
        };

        steps += 1;
        tracing::trace!(steps, kind = request.kind(), "awaiting request");

        step = match convert(request) {
            Either::Left(mut tracked) => {
                let outcome = future::poll_fn(|cx| {
                    let polled = tracked.poll_unpin(cx).map(|settled| {
                        strays.adopt(settled.abandoned);
                        settled.outcome
                    });
                    strays.poll_drain(cx);
                    polled
                })
                .await;

                match outcome {
                    Ok(value) => coroutine.resume(value),
                    Err(error) => {
                        tracing::debug!(steps, %error, "raising failed request into coroutine");
                        coroutine.raise(error)
                    }
                }
            }
            Either::Right(value) => {
                let error = Error::invalid_request(&value);
                tracing::debug!(steps, %error, "request has no conversion");
                return Settled {
                    outcome: Err(error),
                    abandoned: strays.into_vec(),
                };
            }
        };
    }
}
