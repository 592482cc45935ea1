//! Reusable async operations over coroutine factories.
//!
//! [`wrap`] keeps a factory around and turns each [`Wrapped::call`] into a
//! fresh [`drive_with`], so calls never share coroutine state.

use serde_json::Value;

use crate::{Completion, Start, drive_with};

/// A coroutine factory turned into a callable async operation.
///
/// Every [`call`](Wrapped::call) builds a fresh coroutine from the factory
/// and drives it independently of earlier calls.
///
/// ```rust
/// use costep::prelude::*;
/// use serde_json::json;
///
/// let double = wrap(|args: Vec<Value>| {
///     let n = args.first().and_then(Value::as_i64).unwrap_or_default();
///     once(Request::thunk(move |cb| cb.ok(json!(n * 2))), |res| res).boxed()
/// });
///
/// let out = futures::executor::block_on(double.call(vec![json!(21)])).unwrap();
/// assert_eq!(out, json!(42));
/// ```
#[derive(Clone)]
pub struct Wrapped<F> {
    factory: F,
}

/// Wrap `factory` so each call starts a new drive.
pub fn wrap<F, S>(factory: F) -> Wrapped<F>
where
    F: Fn(Vec<Value>) -> S,
    S: Into<Start>,
{
    Wrapped { factory }
}

impl<F, S> Wrapped<F>
where
    F: Fn(Vec<Value>) -> S,
    S: Into<Start>,
{
    pub fn call(&self, args: Vec<Value>) -> Completion {
        drive_with(&self.factory, args)
    }

    /// The factory this adapter was built from.
    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn into_factory(self) -> F {
        self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{done, from_fn};
    use crate::{Coroutine, Error, Request, Step};
    use futures::executor::block_on;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_each_call_gets_a_fresh_coroutine() {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = wrap({
            let built = Arc::clone(&built);
            move |_args: Vec<Value>| {
                let n = built.fetch_add(1, Ordering::SeqCst);
                done(json!(n)).boxed()
            }
        });

        assert_eq!(block_on(counter.call(Vec::new())).unwrap(), json!(0));
        assert_eq!(block_on(counter.call(Vec::new())).unwrap(), json!(1));
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_args_reach_the_factory() {
        let echo = wrap(|args: Vec<Value>| {
            from_fn(move |input: Result<Value, Error>| {
                input?;
                Ok(Step::Complete(Value::Array(args.clone())))
            })
            .boxed()
        });
        let out = block_on(echo.call(vec![json!(1), json!("two")])).unwrap();
        assert_eq!(out, json!([1, "two"]));
    }

    #[test]
    fn test_factory_is_retrievable() {
        fn make(_args: Vec<Value>) -> Value {
            json!("plain")
        }
        let wrapped = wrap(make);
        assert_eq!((wrapped.factory())(Vec::new()), json!("plain"));
        assert_eq!(block_on(wrapped.call(Vec::new())).unwrap(), json!("plain"));
        let _factory: fn(Vec<Value>) -> Value = wrapped.into_factory();
    }

    #[test]
    fn test_calls_are_independent() {
        let flaky = wrap(|args: Vec<Value>| {
            let fail = args.first().and_then(Value::as_bool).unwrap_or(false);
            crate::build::once(
                Request::thunk(move |cb| {
                    if fail {
                        cb.err(Error::msg("asked to fail"));
                    } else {
                        cb.ok(json!("fine"));
                    }
                }),
                |res| res,
            )
            .boxed()
        });

        assert!(block_on(flaky.call(vec![json!(true)])).is_err());
        assert_eq!(block_on(flaky.call(vec![json!(false)])).unwrap(), json!("fine"));
    }
}
