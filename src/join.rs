//! Concurrent resolution of collection requests.
//!
//! A [`Join`] owns one slot per collection element. Every pending slot is
//! polled on each wake-up, so all branches start together and make progress
//! together. The join completes once every slot holds a value, or fails with
//! the first branch error it observes.
//!
//! A failing join does not cancel its siblings. Branches still pending are
//! handed back as `abandoned`, and whoever owns the join keeps polling them
//! in its [`Strays`] while it runs, discarding their outcomes.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use either::Either;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde_json::Value;

use crate::{Completion, Error};

/// Outcome of an internally driven branch, plus any work it gave up on
/// without finishing.
pub(crate) struct Settled<T = Value> {
    pub(crate) outcome: Result<T, Error>,
    pub(crate) abandoned: Vec<Tracked>,
}

impl<T> Settled<T> {
    pub(crate) fn bare(outcome: Result<T, Error>) -> Self {
        Settled {
            outcome,
            abandoned: Vec::new(),
        }
    }

    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> Settled<U> {
        Settled {
            outcome: self.outcome.map(f),
            abandoned: self.abandoned,
        }
    }
}

/// A branch whose abandoned siblings travel with its outcome.
pub(crate) type Tracked = BoxFuture<'static, Settled>;

pub(crate) fn track(completion: Completion) -> Tracked {
    completion.map(Settled::bare).boxed()
}

/// Abandoned branches, kept running until their owner goes away.
#[derive(Default)]
pub(crate) struct Strays {
    pending: FuturesUnordered<Tracked>,
}

impl Strays {
    pub(crate) fn adopt(&mut self, abandoned: Vec<Tracked>) {
        self.pending.extend(abandoned);
    }

    /// Poll every stray that is ready, dropping outcomes and adopting whatever
    /// they abandon in turn.
    pub(crate) fn poll_drain(&mut self, cx: &mut Context<'_>) {
        while let Poll::Ready(Some(settled)) = self.pending.poll_next_unpin(cx) {
            if let Err(error) = &settled.outcome {
                tracing::trace!(%error, "abandoned branch failed, discarding");
            }
            self.pending.extend(settled.abandoned);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn into_vec(self) -> Vec<Tracked> {
        self.pending.into_iter().collect()
    }
}

enum Slot {
    Pending(Tracked),
    Ready(Value),
    Failed,
}

/// Resolves a list of branches into a list of values, preserving order.
pub(crate) struct Join {
    slots: Vec<Slot>,
    remaining: usize,
    strays: Strays,
    finished: bool,
}

impl Join {
    /// Build a join from converted branches. Plain values are copied into
    /// their slot right away; tracked branches are awaited.
    pub(crate) fn new<I>(branches: I) -> Self
    where
        I: IntoIterator<Item = Either<Tracked, Value>>,
    {
        let slots: Vec<Slot> = branches
            .into_iter()
            .map(|branch| match branch {
                Either::Left(tracked) => Slot::Pending(tracked),
                Either::Right(value) => Slot::Ready(value),
            })
            .collect();
        let remaining = slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count();

        Join {
            slots,
            remaining,
            strays: Strays::default(),
            finished: false,
        }
    }

    fn take_values(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.slots)
            .into_iter()
            .map(|slot| match slot {
                Slot::Ready(value) => value,
                Slot::Pending(_) | Slot::Failed => Value::Null,
            })
            .collect()
    }

    fn take_abandoned(&mut self) -> Vec<Tracked> {
        let mut abandoned: Vec<Tracked> = std::mem::take(&mut self.slots)
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Pending(tracked) => Some(tracked),
                Slot::Ready(_) | Slot::Failed => None,
            })
            .collect();
        abandoned.extend(std::mem::take(&mut self.strays).into_vec());
        abandoned
    }
}

impl Future for Join {
    type Output = Settled<Vec<Value>>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Pending;
        }

        let mut failure = None;
        for (idx, slot) in this.slots.iter_mut().enumerate() {
            let Slot::Pending(tracked) = slot else {
                continue;
            };
            let Poll::Ready(settled) = tracked.poll_unpin(cx) else {
                continue;
            };

            this.remaining -= 1;
            this.strays.adopt(settled.abandoned);
            match settled.outcome {
                Ok(value) => *slot = Slot::Ready(value),
                Err(error) => {
                    *slot = Slot::Failed;
                    if failure.is_none() {
                        failure = Some((idx, error));
                    } else {
                        tracing::trace!(branch = idx, %error, "later branch failure discarded");
                    }
                }
            }
        }
        this.strays.poll_drain(cx);

        if let Some((idx, error)) = failure {
            this.finished = true;
            let abandoned = this.take_abandoned();
            tracing::debug!(
                branch = idx,
                %error,
                abandoned = abandoned.len(),
                "collection branch failed"
            );
            return Poll::Ready(Settled {
                outcome: Err(error),
                abandoned,
            });
        }

        if this.remaining == 0 {
            this.finished = true;
            let abandoned = std::mem::take(&mut this.strays).into_vec();
            return Poll::Ready(Settled {
                outcome: Ok(this.take_values()),
                abandoned,
            });
        }

        Poll::Pending
    }
}
