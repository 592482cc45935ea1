//! The suspendable computation driven by [`drive`](crate::drive).
//!
//! A [`Coroutine`] is advanced one step at a time. Each step either pauses
//! with a [`Request`] the driver must resolve, or completes with a final
//! [`Value`]. The driver answers a request with [`Coroutine::resume`] when it
//! succeeds and with [`Coroutine::raise`] when it fails, which lets the
//! computation recover from a failed dependency on its own.
//!
//! # Examples
//!
//! ```rust
//! use costep::prelude::*;
//! use serde_json::json;
//!
//! let mut co = once(Request::value(json!([1, 2])), |res| res);
//! assert!(co.resume(Value::Null).unwrap().is_yielded());
//! assert_eq!(co.resume(json!(3)).unwrap().unwrap_complete(), json!(3));
//! ```

use either::Either;
use serde_json::Value;

use crate::{Error, Request, Step};

/// What a coroutine hands back after being advanced.
///
/// `Err` is a synchronous failure while advancing; the driver treats it as
/// fatal for the whole drive.
pub type Resumed = Result<Step<Request, Value>, Error>;

/// A boxed coroutine that can be moved into a drive.
pub type BoxCoroutine = Box<dyn Coroutine + Send>;

/// A computation that can pause at intermediate requests.
///
/// Once a step reports `Complete`, the coroutine must not be resumed or
/// raised into again.
pub trait Coroutine {
    /// Continue with the resolved value of the last request.
    ///
    /// The very first call receives `Value::Null`.
    fn resume(&mut self, input: Value) -> Resumed;

    /// Continue by delivering the failure of the last request.
    ///
    /// The default does not intercept anything and hands the error back.
    fn raise(&mut self, error: Error) -> Resumed {
        Err(error)
    }

    fn boxed(self) -> BoxCoroutine
    where
        Self: Sized + Send + 'static,
    {
        Box::new(self)
    }
}

impl<C> Coroutine for Box<C>
where
    C: Coroutine + ?Sized,
{
    fn resume(&mut self, input: Value) -> Resumed {
        (**self).resume(input)
    }

    fn raise(&mut self, error: Error) -> Resumed {
        (**self).raise(error)
    }
}

impl<L, R> Coroutine for Either<L, R>
where
    L: Coroutine,
    R: Coroutine,
{
    fn resume(&mut self, input: Value) -> Resumed {
        match self {
            Either::Left(l) => l.resume(input),
            Either::Right(r) => r.resume(input),
        }
    }

    fn raise(&mut self, error: Error) -> Resumed {
        match self {
            Either::Left(l) => l.raise(error),
            Either::Right(r) => r.raise(error),
        }
    }
}
