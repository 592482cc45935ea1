//! The intermediate values a coroutine may yield.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::channel::oneshot;
use serde_json::Value;

use crate::{BoxCoroutine, Completion, Coroutine, Error, Start};

/// Produces a fresh computation when a request is normalized.
pub type BoxFactory = Box<dyn FnOnce() -> Start + Send>;

/// A continuation that reports its outcome through a trailing [`Callback`].
pub type BoxThunk = Box<dyn FnOnce(Callback) + Send>;

/// What a paused coroutine needs before it can continue.
///
/// Each variant is one request shape; the driver picks the matching
/// conversion once per step.
pub enum Request {
    /// A plain value. Arrays and objects resolve to themselves; any other
    /// value has no conversion and fails the drive.
    Value(Value),
    /// An already running completion.
    Future(Completion),
    /// A nested computation, driven to completion on its own.
    Coroutine(BoxCoroutine),
    /// Builds a nested computation (or a plain value) when needed.
    Factory(BoxFactory),
    /// A callback-style continuation.
    Thunk(BoxThunk),
    /// Every element, resolved concurrently, in order.
    All(Vec<Request>),
    /// Every entry, resolved concurrently, under the same keys.
    Map(BTreeMap<String, Request>),
}

impl Request {
    pub fn value(value: impl Into<Value>) -> Self {
        Request::Value(value.into())
    }

    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        Request::Future(future.boxed())
    }

    pub fn coroutine<C>(coroutine: C) -> Self
    where
        C: Coroutine + Send + 'static,
    {
        Request::Coroutine(Box::new(coroutine))
    }

    pub fn factory<F, S>(factory: F) -> Self
    where
        F: FnOnce() -> S + Send + 'static,
        S: Into<Start>,
    {
        Request::Factory(Box::new(move || factory().into()))
    }

    /// Wrap a callback-style function.
    ///
    /// ```rust
    /// use costep::prelude::*;
    /// use serde_json::json;
    ///
    /// let req = Request::thunk(|cb| cb.ok(json!("ready")));
    /// assert_eq!(req.kind(), "thunk");
    /// ```
    pub fn thunk<F>(thunk: F) -> Self
    where
        F: FnOnce(Callback) + Send + 'static,
    {
        Request::Thunk(Box::new(thunk))
    }

    pub fn all<I>(requests: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Request>,
    {
        Request::All(requests.into_iter().map(Into::into).collect())
    }

    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Request)>,
        K: Into<String>,
    {
        Request::Map(entries.into_iter().map(|(k, r)| (k.into(), r)).collect())
    }

    /// Short name of the request shape, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Value(_) => "value",
            Request::Future(_) => "future",
            Request::Coroutine(_) => "coroutine",
            Request::Factory(_) => "factory",
            Request::Thunk(_) => "thunk",
            Request::All(_) => "all",
            Request::Map(_) => "map",
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Request::All(items) => f.debug_tuple("All").field(items).finish(),
            Request::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            other => write!(f, "{}(..)", other.kind()),
        }
    }
}

impl From<Value> for Request {
    fn from(value: Value) -> Self {
        Request::Value(value)
    }
}

impl From<Vec<Request>> for Request {
    fn from(requests: Vec<Request>) -> Self {
        Request::All(requests)
    }
}

impl From<BTreeMap<String, Request>> for Request {
    fn from(entries: BTreeMap<String, Request>) -> Self {
        Request::Map(entries)
    }
}

impl From<BoxCoroutine> for Request {
    fn from(coroutine: BoxCoroutine) -> Self {
        Request::Coroutine(coroutine)
    }
}

/// The trailing continuation handed to a [`Request::Thunk`].
///
/// Consuming `self` on every call means a callback settles at most once.
/// Dropping it uncalled fails the request with [`Error::CallbackDropped`].
pub struct Callback {
    tx: oneshot::Sender<Result<Value, Error>>,
}

impl Callback {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Result<Value, Error>>) {
        let (tx, rx) = oneshot::channel();
        (Callback { tx }, rx)
    }

    /// Settle with `(error, results...)`.
    ///
    /// An error wins. Otherwise several results settle as an array, a single
    /// result as itself and no result as `null`.
    pub fn call(self, error: Option<Error>, mut results: Vec<Value>) {
        let outcome = match error {
            Some(e) => Err(e),
            None if results.len() > 1 => Ok(Value::Array(results)),
            None => Ok(results.pop().unwrap_or(Value::Null)),
        };
        // The receiver is gone when a sibling already failed the collection.
        let _ = self.tx.send(outcome);
    }

    pub fn ok(self, value: Value) {
        self.call(None, vec![value]);
    }

    pub fn ok_many(self, values: Vec<Value>) {
        self.call(None, values);
    }

    pub fn err(self, error: Error) {
        self.call(Some(error), Vec::new());
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("abandoned", &self.tx.is_canceled())
            .finish()
    }
}
