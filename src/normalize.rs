//! Conversion of a yielded [`Request`] into something the driver can await.

use std::collections::BTreeMap;

use either::Either;
use futures::FutureExt;
use futures::future;
use serde_json::{Map, Value};

use crate::driver::drive_tracked;
use crate::join::{Join, Settled, Tracked, track};
use crate::{BoxThunk, Callback, Completion, Error, Request, Start};

/// Turn a request into a completion, or hand it back untouched when there is
/// no conversion for it.
///
/// Nothing runs here: nested computations, thunks and collection branches
/// only start once the returned completion is polled. `Right` carries a
/// scalar plain value (`null`, a boolean, a number or a string).
///
/// A collection that fails leaves its unfinished siblings behind. Inside a
/// drive they keep being polled until the drive settles; through this
/// function they are dropped along with the completion.
///
/// Nested coroutines and factories are driven recursively, so each level of
/// nesting adds a frame to every poll of the returned completion.
///
/// ```rust
/// use costep::{normalize, Request};
/// use serde_json::json;
///
/// assert!(normalize(Request::value(json!(0))).is_right());
/// assert!(normalize(Request::value(json!([0]))).is_left());
/// ```
pub fn normalize(request: Request) -> Either<Completion, Value> {
    convert(request).map_left(|tracked| tracked.map(|settled| settled.outcome).boxed())
}

/// Same dispatch as [`normalize`], keeping abandoned branches attached to the
/// outcome so the enclosing drive can adopt them.
pub(crate) fn convert(request: Request) -> Either<Tracked, Value> {
    match request {
        Request::Future(completion) => Either::Left(track(completion)),
        Request::Coroutine(coroutine) => Either::Left(drive_tracked(Start::Coroutine(coroutine))),
        Request::Factory(factory) => {
            Either::Left(async move { drive_tracked(factory()).await }.boxed())
        }
        Request::Thunk(thunk) => Either::Left(track(thunk_to_completion(thunk))),
        Request::All(items) => Either::Left(join_all(items)),
        Request::Map(entries) => Either::Left(join_map(entries)),
        Request::Value(value @ (Value::Array(_) | Value::Object(_))) => {
            Either::Left(future::ready(Settled::bare(Ok(value))).boxed())
        }
        Request::Value(value) => Either::Right(value),
    }
}

fn thunk_to_completion(thunk: BoxThunk) -> Completion {
    async move {
        let (callback, settled) = Callback::channel();
        thunk(callback);
        settled.await.unwrap_or(Err(Error::CallbackDropped))
    }
    .boxed()
}

fn join_all(items: Vec<Request>) -> Tracked {
    Join::new(items.into_iter().map(convert))
        .map(|settled| settled.map(Value::Array))
        .boxed()
}

fn join_map(entries: BTreeMap<String, Request>) -> Tracked {
    let (keys, branches): (Vec<String>, Vec<_>) = entries
        .into_iter()
        .map(|(key, request)| (key, convert(request)))
        .unzip();

    Join::new(branches)
        .map(move |settled| {
            settled.map(|values| Value::Object(keys.into_iter().zip(values).collect::<Map<_, _>>()))
        })
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{done, once};
    use crate::Coroutine;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn resolve(request: Request) -> Result<Value, Error> {
        match normalize(request) {
            Either::Left(completion) => completion.await,
            Either::Right(value) => panic!("no conversion for {value}"),
        }
    }

    fn delayed(ms: u64, value: Value) -> Request {
        Request::future(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<_, Error>(value)
        })
    }

    fn recording(calls: &Arc<AtomicUsize>) -> Request {
        let calls = Arc::clone(calls);
        Request::thunk(move |cb| {
            calls.fetch_add(1, Ordering::SeqCst);
            cb.ok(json!("recorded"));
        })
    }

    #[test]
    fn test_scalars_and_null_pass_through() {
        for value in [Value::Null, json!(0), json!(""), json!(false), json!("text"), json!(3.5)] {
            let out = normalize(Request::Value(value.clone()));
            assert_eq!(out.right(), Some(value));
        }
    }

    #[tokio::test]
    async fn test_future_is_returned_unchanged() {
        let out = resolve(Request::future(async { Ok::<_, Error>(json!("f")) })).await;
        assert_eq!(out.unwrap(), json!("f"));
    }

    #[tokio::test]
    async fn test_plain_collections_resolve_to_themselves() {
        assert_eq!(resolve(Request::value(json!([1, "a"]))).await.unwrap(), json!([1, "a"]));
        assert_eq!(resolve(Request::value(json!({"k": 1}))).await.unwrap(), json!({"k": 1}));
    }

    #[tokio::test]
    async fn test_nested_coroutine_is_driven() {
        let inner = once(Request::thunk(|cb| cb.ok(json!(20))), |res| {
            res.map(|v| json!(v.as_i64().unwrap_or_default() + 1))
        });
        assert_eq!(resolve(Request::coroutine(inner)).await.unwrap(), json!(21));
    }

    #[tokio::test]
    async fn test_factory_runs_lazily() {
        let req = Request::factory(|| done(json!("built")).boxed());
        let converted = normalize(req);
        assert_eq!(converted.left().unwrap().await.unwrap(), json!("built"));
    }

    #[tokio::test]
    async fn test_factory_may_return_plain_value() {
        let req = Request::factory(|| json!(9));
        assert_eq!(resolve(req).await.unwrap(), json!(9));
    }

    #[tokio::test]
    async fn test_thunk_with_many_results() {
        let req = Request::thunk(|cb| cb.ok_many(vec![json!("a"), json!("b"), json!("c")]));
        assert_eq!(resolve(req).await.unwrap(), json!(["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_thunk_dropping_callback_fails() {
        let req = Request::thunk(drop);
        assert!(matches!(resolve(req).await, Err(Error::CallbackDropped)));
    }

    #[tokio::test]
    async fn test_thunk_settled_from_another_thread() {
        let req = Request::thunk(|cb| {
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                cb.ok(json!("late"));
            });
        });
        assert_eq!(resolve(req).await.unwrap(), json!("late"));
    }

    #[tokio::test]
    async fn test_all_preserves_order_regardless_of_completion_order() {
        let req = Request::all(vec![
            delayed(30, json!(1)),
            delayed(5, json!(2)),
            Request::value(json!("plain")),
            delayed(15, json!(3)),
        ]);
        assert_eq!(resolve(req).await.unwrap(), json!([1, 2, "plain", 3]));
    }

    #[tokio::test]
    async fn test_empty_collections_keep_their_shape() {
        assert_eq!(resolve(Request::All(Vec::new())).await.unwrap(), json!([]));
        assert_eq!(resolve(Request::Map(BTreeMap::new())).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_all_fails_with_first_error() {
        let req = Request::all(vec![
            delayed(50, json!(1)),
            Request::future(async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Err::<Value, _>(Error::msg("early"))
            }),
            Request::future(async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err::<Value, _>(Error::msg("late"))
            }),
        ]);
        assert_eq!(resolve(req).await.unwrap_err().to_string(), "early");
    }

    #[tokio::test]
    async fn test_map_keeps_keys_and_copies_plain_values() {
        let req = Request::map([
            ("slow", delayed(20, json!("s"))),
            ("fast", delayed(1, json!("f"))),
            ("plain", Request::value(json!(7))),
            ("nothing", Request::value(Value::Null)),
        ]);
        assert_eq!(
            resolve(req).await.unwrap(),
            json!({"slow": "s", "fast": "f", "plain": 7, "nothing": null})
        );
    }

    #[tokio::test]
    async fn test_map_fails_with_failing_key() {
        let req = Request::map([
            ("ok", delayed(20, json!(1))),
            ("bad", Request::thunk(|cb| cb.err(Error::msg("bad key")))),
        ]);
        assert_eq!(resolve(req).await.unwrap_err().to_string(), "bad key");
    }

    #[tokio::test]
    async fn test_collections_nest() {
        let req = Request::map([(
            "list",
            Request::all(vec![
                Request::thunk(|cb| cb.ok(json!(1))),
                Request::map([("inner", Request::thunk(|cb| cb.ok(json!(2))))]),
            ]),
        )]);
        assert_eq!(resolve(req).await.unwrap(), json!({"list": [1, {"inner": 2}]}));
    }

    #[tokio::test]
    async fn test_all_starts_branches_after_a_failing_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Request::all(vec![
            Request::thunk(|cb| cb.err(Error::msg("first"))),
            recording(&calls),
        ]);
        assert_eq!(resolve(req).await.unwrap_err().to_string(), "first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_map_starts_keys_sorting_after_a_failing_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Request::map([
            ("a_bad", Request::thunk(|cb| cb.err(Error::msg("bad key")))),
            ("b_rec", recording(&calls)),
        ]);
        assert_eq!(resolve(req).await.unwrap_err().to_string(), "bad key");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
