//! Pre-settled promises and aggregation over many promises.
//!
//! Everything here is built on [`Promise::deferred_in`] and
//! [`Promise::on_settle`]; none of it blocks.
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::executor::{default_executor, Executor};
use crate::promise::{Promise, Reason, Value};

/// Per-input outcome reported by [`all_settled`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<T, E> {
    Fulfilled(T),
    Rejected(E),
}

impl<T, E> Settled<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Settled::Fulfilled(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Settled::Fulfilled(value) => Ok(value),
            Settled::Rejected(err) => Err(err),
        }
    }
}

impl<T, E> From<Result<T, E>> for Settled<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(value) => Settled::Fulfilled(value),
            Err(err) => Settled::Rejected(err),
        }
    }
}

/// An already fulfilled promise.
pub fn resolve<T: Value, E: Reason>(value: T) -> Promise<T, E> {
    resolve_in(default_executor(), value)
}

pub fn resolve_in<T: Value, E: Reason>(executor: Arc<dyn Executor>, value: T) -> Promise<T, E> {
    let (producer, promise) = Promise::deferred_in(executor);
    producer.resolve(value);
    promise
}

/// A promise that takes on the eventual outcome of `source`.
///
/// This is `resolve` for a value that is itself a promise: the result
/// settles only when the innermost promise of the chain does.
pub fn adopt<T: Value, E: Reason>(source: Promise<T, E>) -> Promise<T, E> {
    let (producer, promise) = Promise::deferred_in(source.executor());
    producer.adopt(source);
    promise
}

/// An already rejected promise. The error is never inspected.
pub fn reject<T: Value, E: Reason>(err: E) -> Promise<T, E> {
    reject_in(default_executor(), err)
}

pub fn reject_in<T: Value, E: Reason>(executor: Arc<dyn Executor>, err: E) -> Promise<T, E> {
    let (producer, promise) = Promise::deferred_in(executor);
    producer.reject(err);
    promise
}

struct Gather<T> {
    slots: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Gather<T> {
    fn new(len: usize) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Gather {
            slots: (0..len).map(|_| None).collect(),
            remaining: len,
        }))
    }

    /// Stores slot `index`; returns every slot once the last one arrives.
    fn fill(&mut self, index: usize, item: T) -> Option<Vec<T>> {
        if self.slots[index].replace(item).is_none() {
            self.remaining -= 1;
        }
        if self.remaining == 0 {
            Some(mem::take(&mut self.slots).into_iter().flatten().collect())
        } else {
            None
        }
    }
}

/// Fulfils with every input's value, in input order, once all have
/// fulfilled. Rejects with the first rejection observed; inputs still
/// pending at that point are left alone. No inputs fulfils with an empty
/// `Vec`.
pub fn all<T, E, I>(promises: I) -> Promise<Vec<T>, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    all_in(default_executor(), promises)
}

pub fn all_in<T, E, I>(executor: Arc<dyn Executor>, promises: I) -> Promise<Vec<T>, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let promises: Vec<_> = promises.into_iter().collect();
    let (producer, output) = Promise::deferred_in(executor);
    if promises.is_empty() {
        producer.resolve(Vec::new());
        return output;
    }

    let gather = Gather::new(promises.len());
    for (index, promise) in promises.iter().enumerate() {
        let gather = gather.clone();
        let producer = producer.clone();
        promise.on_settle(move |outcome| match outcome {
            Ok(value) => {
                let done = gather.lock().fill(index, value);
                if let Some(values) = done {
                    producer.resolve(values);
                }
            }
            Err(err) => {
                producer.reject(err);
            }
        });
    }
    output
}

/// Fulfils once every input has settled, with each outcome in input order.
/// Never rejects.
pub fn all_settled<T, E, I>(promises: I) -> Promise<Vec<Settled<T, E>>, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    all_settled_in(default_executor(), promises)
}

pub fn all_settled_in<T, E, I>(
    executor: Arc<dyn Executor>,
    promises: I,
) -> Promise<Vec<Settled<T, E>>, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let promises: Vec<_> = promises.into_iter().collect();
    let (producer, output) = Promise::deferred_in(executor);
    if promises.is_empty() {
        producer.resolve(Vec::new());
        return output;
    }

    let gather = Gather::new(promises.len());
    for (index, promise) in promises.iter().enumerate() {
        let gather = gather.clone();
        let producer = producer.clone();
        promise.on_settle(move |outcome| {
            let done = gather.lock().fill(index, Settled::from(outcome));
            if let Some(outcomes) = done {
                producer.resolve(outcomes);
            }
        });
    }
    output
}

/// Settles like whichever input settles first, in either direction.
///
/// Which of two inputs settling at nearly the same moment wins is not
/// deterministic. With no inputs the result stays pending.
pub fn race<T, E, I>(promises: I) -> Promise<T, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    race_in(default_executor(), promises)
}

pub fn race_in<T, E, I>(executor: Arc<dyn Executor>, promises: I) -> Promise<T, E>
where
    T: Value,
    E: Reason,
    I: IntoIterator<Item = Promise<T, E>>,
{
    let (producer, output) = Promise::deferred_in(executor);
    for promise in promises {
        let producer = producer.clone();
        promise.on_settle(move |outcome| {
            producer.settle(outcome);
        });
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use crate::Error;

    fn inline() -> Arc<dyn Executor> {
        Arc::new(InlineExecutor)
    }

    #[test]
    fn test_gather_counts_each_slot_once() {
        let gather = Gather::new(2);
        assert_eq!(gather.lock().fill(1, "b"), None);
        assert_eq!(gather.lock().fill(1, "b2"), None);
        assert_eq!(gather.lock().fill(0, "a"), Some(vec!["a", "b2"]));
    }

    #[test]
    fn test_all_order_is_input_order() {
        let (first, p1) = Promise::<i32, Error>::deferred_in(inline());
        let (second, p2) = Promise::<i32, Error>::deferred_in(inline());
        let joined = all_in(inline(), vec![p1, p2]);
        second.resolve(2);
        assert!(joined.is_pending());
        first.resolve(1);
        assert_eq!(joined.try_result(), Some(Ok(vec![1, 2])));
    }

    #[test]
    fn test_all_first_rejection_wins() {
        let (first, p1) = Promise::<i32, Error>::deferred_in(inline());
        let (second, p2) = Promise::<i32, Error>::deferred_in(inline());
        let joined = all_in(inline(), vec![p1, p2]);
        second.reject(Error::msg("second"));
        first.reject(Error::msg("first"));
        assert_eq!(joined.try_result(), Some(Err(Error::msg("second"))));
    }

    #[test]
    fn test_race_empty_stays_pending() {
        let raced = race_in::<i32, Error, _>(inline(), Vec::new());
        assert!(raced.is_pending());
    }

    #[test]
    fn test_settled_into_result() {
        let ok: Settled<i32, Error> = Ok(1).into();
        assert!(ok.is_fulfilled());
        assert_eq!(ok.into_result(), Ok(1));
    }
}
