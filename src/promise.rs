use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::executor::{default_executor, Executor, Task};
use crate::Error;

/// Payloads a promise can fulfil with. Every observer gets its own clone.
pub trait Value: Clone + Send + 'static {}
impl<T: Clone + Send + 'static> Value for T {}

/// Payloads a promise can reject with. `From<Error>` lets converted panics
/// and scheduling failures travel through the caller's own error type.
pub trait Reason: Clone + Send + From<Error> + 'static {}
impl<E: Clone + Send + From<Error> + 'static> Reason for E {}

/// Settlement state of a promise. Leaves `Pending` at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State<T, E> {
    Pending,
    Fulfilled(T),
    Rejected(E),
}

impl<T: Clone, E: Clone> State<T, E> {
    pub fn is_pending(&self) -> bool {
        matches!(self, State::Pending)
    }

    /// The settled outcome, `None` while pending.
    pub fn outcome(&self) -> Option<Result<T, E>> {
        match *self {
            State::Pending => None,
            State::Fulfilled(ref value) => Some(Ok(value.clone())),
            State::Rejected(ref err) => Some(Err(err.clone())),
        }
    }
}

impl<T, E> From<Result<T, E>> for State<T, E> {
    fn from(outcome: Result<T, E>) -> Self {
        match outcome {
            Ok(value) => State::Fulfilled(value),
            Err(err) => State::Rejected(err),
        }
    }
}

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

type Job = Box<dyn FnOnce()>;

thread_local! {
    // Reactions waiting to run on this thread. `Some` while a dispatch loop
    // is draining it.
    static DISPATCH: RefCell<Option<VecDeque<Job>>> = RefCell::new(None);
}

/// Runs `jobs` in order on the current thread.
///
/// A settlement triggered from inside a running reaction appends to the
/// queue of the outermost loop instead of recursing, so a chain of any
/// length settles in constant stack depth.
fn dispatch<I>(jobs: I)
where
    I: IntoIterator<Item = Job>,
{
    let nested = DISPATCH.with(|queue| {
        let mut queue = queue.borrow_mut();
        if let Some(pending) = queue.as_mut() {
            pending.extend(jobs);
            return true;
        }
        *queue = Some(jobs.into_iter().collect());
        false
    });
    if nested {
        return;
    }

    loop {
        let next = DISPATCH.with(|queue| {
            queue
                .borrow_mut()
                .as_mut()
                .and_then(VecDeque::pop_front)
        });
        let job = match next {
            Some(job) => job,
            None => break,
        };
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            log::warn!("reaction panicked: {}", Error::from_panic(payload));
        }
    }
    DISPATCH.with(|queue| *queue.borrow_mut() = None);
}

struct Inner<T, E> {
    state: State<T, E>,
    // Locked in to another promise's outcome by `adopt`.
    adopted: bool,
    reactions: Vec<Reaction<T, E>>,
    wakers: Vec<Waker>,
}

struct Shared<T, E> {
    inner: Mutex<Inner<T, E>>,
    settled: Condvar,
}

impl<T: Value, E: Reason> Shared<T, E> {
    fn new() -> Arc<Self> {
        Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: State::Pending,
                adopted: false,
                reactions: Vec::new(),
                wakers: Vec::new(),
            }),
            settled: Condvar::new(),
        })
    }

    /// First writer wins. Once adopted, only the adopted promise may settle.
    fn settle(&self, outcome: Result<T, E>, from_adoption: bool) -> bool {
        let (reactions, wakers, outcome) = {
            let mut inner = self.inner.lock();
            if !inner.state.is_pending() || (inner.adopted && !from_adoption) {
                log::trace!("ignoring settlement of an already resolved promise");
                return false;
            }
            log::trace!(
                "promise {}",
                if outcome.is_ok() { "fulfilled" } else { "rejected" }
            );
            let reactions = mem::take(&mut inner.reactions);
            let wakers = mem::take(&mut inner.wakers);
            let shared_outcome = if reactions.is_empty() {
                None
            } else {
                Some(outcome.clone())
            };
            inner.state = State::from(outcome);
            self.settled.notify_all();
            (reactions, wakers, shared_outcome)
        };

        for waker in wakers {
            waker.wake();
        }
        if let Some(outcome) = outcome {
            dispatch(reactions.into_iter().map(|reaction| {
                let outcome = outcome.clone();
                Box::new(move || reaction(outcome)) as Job
            }));
        }
        true
    }

    fn adopt(self: &Arc<Self>, source: &Promise<T, E>) -> bool {
        {
            let mut inner = self.inner.lock();
            if !inner.state.is_pending() || inner.adopted {
                log::trace!("ignoring adoption by an already resolved promise");
                return false;
            }
            if !Arc::ptr_eq(self, &source.shared) {
                inner.adopted = true;
            }
        }
        if Arc::ptr_eq(self, &source.shared) {
            return self.settle(Err(E::from(Error::SelfResolution)), false);
        }

        let target = self.clone();
        source.subscribe(Box::new(move |outcome| {
            target.settle(outcome, true);
        }));
        true
    }
}

/// Settles a promise from outside of it.
///
/// This is the handle returned next to a [`Promise`] by
/// [`Promise::deferred`], and the thing [`Resolve`] and [`Reject`] wrap.
/// Clones share the same promise; every call after the first settlement is
/// ignored and returns `false`.
///
/// # Examples
///
/// ```
/// use settle::{Error, Promise};
/// use std::thread;
///
/// let (producer, promise) = Promise::<String, Error>::deferred();
/// let task = thread::spawn(move || producer.resolve("Hi".into()));
/// assert_eq!(promise.await_promise(), Ok("Hi".to_owned()));
/// task.join().expect("The producer thread has panicked");
/// ```
pub struct Producer<T, E = Error> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Producer<T, E> {
    fn clone(&self) -> Self {
        Producer {
            shared: self.shared.clone(),
        }
    }
}

impl<T: Value, E: Reason> Producer<T, E> {
    pub fn resolve(&self, value: T) -> bool {
        self.shared.settle(Ok(value), false)
    }

    pub fn reject(&self, err: E) -> bool {
        self.shared.settle(Err(err), false)
    }

    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        self.shared.settle(outcome, false)
    }

    /// Locks this promise to the eventual outcome of `source`.
    ///
    /// Nested adoption flattens: if `source` itself adopted another promise,
    /// this one settles with whatever that chain finally produces. A promise
    /// adopting itself rejects with [`Error::SelfResolution`].
    pub fn adopt(&self, source: Promise<T, E>) -> bool {
        self.shared.adopt(&source)
    }

    /// True once settled or locked in by [`adopt`](Self::adopt).
    pub fn is_settled(&self) -> bool {
        let inner = self.shared.inner.lock();
        !inner.state.is_pending() || inner.adopted
    }

    pub fn resolver(&self) -> Resolve<T, E> {
        Resolve(self.clone())
    }

    pub fn rejecter(&self) -> Reject<T, E> {
        Reject(self.clone())
    }
}

/// The fulfilment half handed to an executor closure.
pub struct Resolve<T, E = Error>(Producer<T, E>);

impl<T, E> Clone for Resolve<T, E> {
    fn clone(&self) -> Self {
        Resolve(self.0.clone())
    }
}

impl<T: Value, E: Reason> Resolve<T, E> {
    pub fn resolve(&self, value: T) -> bool {
        self.0.resolve(value)
    }

    /// Resolve with another promise, see [`Producer::adopt`].
    pub fn adopt(&self, source: Promise<T, E>) -> bool {
        self.0.adopt(source)
    }
}

/// The rejection half handed to an executor closure.
pub struct Reject<T, E = Error>(Producer<T, E>);

impl<T, E> Clone for Reject<T, E> {
    fn clone(&self) -> Self {
        Reject(self.0.clone())
    }
}

impl<T: Value, E: Reason> Reject<T, E> {
    pub fn reject(&self, err: E) -> bool {
        self.0.reject(err)
    }
}

/// A result that is produced in the background and can be observed any
/// number of times.
///
/// Clones are handles to the same promise. Continuations registered with
/// [`then`](Self::then), [`catch`](Self::catch) and friends run on the
/// thread that settles the promise, in registration order; registered after
/// settlement, they are handed to the promise's executor instead.
///
/// # Examples
///
/// ```
/// use settle::{Error, Promise};
///
/// let doubled = Promise::<i32, Error>::new(|resolve, _reject| {
///     resolve.resolve(21);
/// })
/// .then(|v| v * 2);
/// assert_eq!(doubled.await_promise(), Ok(42));
/// ```
///
/// A panic inside the executor becomes a rejection:
///
/// ```
/// use settle::{Error, Promise};
///
/// let p = Promise::<(), Error>::new(|_, _| panic!("💥"));
/// assert_eq!(p.await_promise(), Err(Error::Panicked("💥".into())));
/// ```
pub struct Promise<T, E = Error> {
    shared: Arc<Shared<T, E>>,
    executor: Arc<dyn Executor>,
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Promise {
            shared: self.shared.clone(),
            executor: self.executor.clone(),
        }
    }
}

impl<T: Value, E: Reason> Promise<T, E> {
    /// Runs `work` on the default executor and returns the pending promise.
    pub fn new<F>(work: F) -> Self
    where
        F: FnOnce(Resolve<T, E>, Reject<T, E>) + Send + 'static,
    {
        Self::new_in(default_executor(), work)
    }

    /// Runs `work` on `executor` and returns the pending promise.
    ///
    /// If `work` panics before settling, the promise rejects with
    /// [`Error::Panicked`]. If it returns without settling, the promise stays
    /// pending forever. If the executor cannot take the task, the promise
    /// rejects with the executor's error.
    pub fn new_in<F>(executor: Arc<dyn Executor>, work: F) -> Self
    where
        F: FnOnce(Resolve<T, E>, Reject<T, E>) + Send + 'static,
    {
        let (producer, promise) = Self::deferred_in(executor);
        let on_fault = producer.clone();
        let task: Task = Box::new(move || {
            let (resolve, reject) = (producer.resolver(), producer.rejecter());
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || work(resolve, reject))) {
                producer.reject(E::from(Error::from_panic(payload)));
            }
        });
        if let Err(err) = promise.executor.execute(task) {
            log::warn!("could not schedule promise work: {}", err);
            on_fault.reject(E::from(err));
        }
        promise
    }

    /// A pending promise with no background work, settled through the
    /// returned [`Producer`].
    pub fn deferred() -> (Producer<T, E>, Self) {
        Self::deferred_in(default_executor())
    }

    pub fn deferred_in(executor: Arc<dyn Executor>) -> (Producer<T, E>, Self) {
        let shared = Shared::new();
        (
            Producer {
                shared: shared.clone(),
            },
            Promise { shared, executor },
        )
    }

    pub fn executor(&self) -> Arc<dyn Executor> {
        self.executor.clone()
    }

    pub fn state(&self) -> State<T, E> {
        self.shared.inner.lock().state.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.inner.lock().state.is_pending()
    }

    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// The outcome if already settled, without blocking.
    pub fn try_result(&self) -> Option<Result<T, E>> {
        self.shared.inner.lock().state.outcome()
    }

    /// Blocks until the promise settles. Any number of threads may wait at
    /// once; all of them see the same outcome.
    pub fn await_promise(&self) -> Result<T, E> {
        let mut inner = self.shared.inner.lock();
        loop {
            if let Some(outcome) = inner.state.outcome() {
                return outcome;
            }
            self.shared.settled.wait(&mut inner);
        }
    }

    /// Like [`await_promise`](Self::await_promise) but gives up after
    /// `timeout`, returning `None` if still pending.
    pub fn await_timeout(&self, timeout: Duration) -> Option<Result<T, E>> {
        let deadline = match Instant::now().checked_add(timeout) {
            Some(deadline) => deadline,
            None => return Some(self.await_promise()),
        };
        let mut inner = self.shared.inner.lock();
        loop {
            if let Some(outcome) = inner.state.outcome() {
                return Some(outcome);
            }
            if self.shared.settled.wait_until(&mut inner, deadline).timed_out() {
                return inner.state.outcome();
            }
        }
    }

    /// Calls `observer` with the outcome once settled.
    ///
    /// No promise is derived from the observer; a panic inside it is logged
    /// and swallowed.
    pub fn on_settle<F>(&self, observer: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        self.subscribe(Box::new(move |outcome| {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || observer(outcome))) {
                let err = Error::from_panic(payload);
                log::warn!("settlement observer panicked: {}", err);
            }
        }));
    }

    /// Maps the fulfilment value. Rejections skip `on_fulfilled` and pass
    /// through unchanged.
    ///
    /// Continuations run on the settling thread. Those woken by a settlement
    /// made inside another continuation are queued and run after it returns,
    /// so a continuation must not block on a promise it settles itself.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.chain(move |outcome, next| match outcome {
            Ok(value) => {
                next.resolve(on_fulfilled(value));
            }
            Err(err) => {
                next.reject(err);
            }
        })
    }

    /// Continues with the promise returned by `on_fulfilled`, flattening it
    /// into the chain.
    pub fn and_then<U, F>(&self, on_fulfilled: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(T) -> Promise<U, E> + Send + 'static,
    {
        self.chain(move |outcome, next| match outcome {
            Ok(value) => {
                next.adopt(on_fulfilled(value));
            }
            Err(err) => {
                next.reject(err);
            }
        })
    }

    /// Handles a rejection. Returning `Ok` recovers the chain with that value;
    /// returning `Err` keeps it rejected with the returned error. Fulfilment
    /// passes through without calling `on_rejected`.
    pub fn catch<F>(&self, on_rejected: F) -> Promise<T, E>
    where
        F: FnOnce(E) -> Result<T, E> + Send + 'static,
    {
        self.chain(move |outcome, next| match outcome {
            Ok(value) => {
                next.resolve(value);
            }
            Err(err) => {
                next.settle(on_rejected(err));
            }
        })
    }

    /// Handles a rejection with a promise, flattening it into the chain.
    pub fn or_else<F>(&self, on_rejected: F) -> Promise<T, E>
    where
        F: FnOnce(E) -> Promise<T, E> + Send + 'static,
    {
        self.chain(move |outcome, next| match outcome {
            Ok(value) => {
                next.resolve(value);
            }
            Err(err) => {
                next.adopt(on_rejected(err));
            }
        })
    }

    /// Runs `on_settled` for either outcome, then passes the outcome on.
    pub fn finally<F>(&self, on_settled: F) -> Promise<T, E>
    where
        F: FnOnce() + Send + 'static,
    {
        self.chain(move |outcome, next| {
            on_settled();
            next.settle(outcome);
        })
    }

    /// Derives a promise settled by `step` once this one settles. A panic
    /// inside `step` rejects the derived promise.
    fn chain<U, F>(&self, step: F) -> Promise<U, E>
    where
        U: Value,
        F: FnOnce(Result<T, E>, &Producer<U, E>) + Send + 'static,
    {
        let (next, promise) = Promise::deferred_in(self.executor.clone());
        self.subscribe(Box::new(move |outcome| {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| step(outcome, &next))) {
                next.reject(E::from(Error::from_panic(payload)));
            }
        }));
        promise
    }

    fn subscribe(&self, reaction: Reaction<T, E>) {
        let outcome = {
            let mut inner = self.shared.inner.lock();
            match inner.state.outcome() {
                Some(outcome) => outcome,
                None => {
                    inner.reactions.push(reaction);
                    return;
                }
            }
        };

        // Already settled: run on the executor rather than inside the
        // registering call. The slot keeps the reaction reachable if the
        // executor drops the task.
        let slot = Arc::new(Mutex::new(Some((reaction, outcome))));
        let task_slot = slot.clone();
        let task: Task = Box::new(move || {
            let taken = task_slot.lock().take();
            if let Some((reaction, outcome)) = taken {
                reaction(outcome);
            }
        });
        if let Err(err) = self.executor.execute(task) {
            log::warn!("running late reaction inline: {}", err);
            let taken = slot.lock().take();
            if let Some((reaction, outcome)) = taken {
                reaction(outcome);
            }
        }
    }
}

impl<T: Value, E: Reason> Future for Promise<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut inner = self.shared.inner.lock();
        match inner.state.outcome() {
            Some(outcome) => Poll::Ready(outcome),
            None => {
                if !inner.wakers.iter().any(|w| w.will_wake(cx.waker())) {
                    inner.wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("Promise")
            .field("state", &inner.state)
            .field("adopted", &inner.adopted)
            .finish()
    }
}

impl<T, E> fmt::Debug for Producer<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use futures::executor::block_on;
    use std::thread;

    fn inline() -> Arc<dyn Executor> {
        Arc::new(InlineExecutor)
    }

    #[test]
    fn test_promise_resolve() {
        let (op, op_a) = Promise::<String, Error>::deferred();
        let task1 = thread::spawn(move || block_on(op_a));
        let task2 = thread::spawn(move || op.resolve(String::from("🍓")));
        assert!(task2.join().expect("The task2 thread has panicked"));
        assert_eq!(
            task1.join().expect("The task1 thread has panicked"),
            Ok("🍓".to_owned())
        );
    }

    #[test]
    fn test_two_consumers_resolve() {
        let (op, op_a) = Promise::<String, Error>::deferred();
        let op_b = op_a.clone();
        let task1 = thread::spawn(move || block_on(op_a));
        let task2 = thread::spawn(move || block_on(op_b));
        let task3 = thread::spawn(move || op.resolve(String::from("🍓")));
        task3.join().expect("The task3 thread has panicked");
        assert_eq!(task1.join().unwrap(), Ok("🍓".to_owned()));
        assert_eq!(task2.join().unwrap(), Ok("🍓".to_owned()));
    }

    #[test]
    fn test_promise_reject() {
        let (a, b) = Promise::<String, Error>::deferred();
        let task1 = thread::spawn(move || b.await_promise());
        a.reject(Error::msg("reject!!"));
        assert_eq!(task1.join().unwrap(), Err(Error::msg("reject!!")));
    }

    #[test]
    fn test_promise_resolve_twice() {
        let (a, b) = Promise::<String, Error>::deferred_in(inline());
        assert!(a.resolve("hi".into()));
        assert!(!a.resolve("again".into()));
        assert!(!a.reject(Error::msg("late")));
        assert_eq!(b.state(), State::Fulfilled("hi".to_owned()));
    }

    #[test]
    fn test_adopt_locks_in() {
        let (inner, inner_promise) = Promise::<i32, Error>::deferred_in(inline());
        let (outer, outer_promise) = Promise::<i32, Error>::deferred_in(inline());
        assert!(outer.adopt(inner_promise));
        assert!(outer.is_settled());
        assert!(!outer.resolve(1));
        assert!(outer_promise.is_pending());
        inner.resolve(2);
        assert_eq!(outer_promise.try_result(), Some(Ok(2)));
    }

    #[test]
    fn test_adopt_self() {
        let (op, promise) = Promise::<i32, Error>::deferred_in(inline());
        assert!(op.adopt(promise.clone()));
        assert_eq!(promise.try_result(), Some(Err(Error::SelfResolution)));
    }

    #[test]
    fn test_reactions_in_registration_order() {
        let (op, promise) = Promise::<i32, Error>::deferred_in(inline());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..4 {
            let seen = seen.clone();
            promise.on_settle(move |outcome| seen.lock().push((tag, outcome)));
        }
        op.resolve(9);
        assert_eq!(
            *seen.lock(),
            vec![(0, Ok(9)), (1, Ok(9)), (2, Ok(9)), (3, Ok(9))]
        );
    }

    #[test]
    fn test_late_reaction_fires_once() {
        let promise = Promise::<i32, Error>::new_in(inline(), |resolve, _| {
            resolve.resolve(3);
        });
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        promise.on_settle(move |_| *counter.lock() += 1);
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_panic_in_observer_is_contained() {
        let (op, promise) = Promise::<i32, Error>::deferred_in(inline());
        promise.on_settle(|_| panic!("observer"));
        let after = promise.then(|v| v + 1);
        op.resolve(1);
        assert_eq!(after.try_result(), Some(Ok(2)));
    }

    #[test]
    fn test_long_then_chain_settles() {
        let (op, head) = Promise::<u64, Error>::deferred_in(inline());
        let mut tail = head.clone();
        for _ in 0..100_000 {
            tail = tail.then(|v| v + 1);
        }
        let task = thread::spawn(move || op.resolve(0));
        assert!(task.join().expect("The resolving thread has panicked"));
        assert_eq!(tail.try_result(), Some(Ok(100_000)));
    }

    #[test]
    fn test_long_adoption_chain_settles() {
        let (op, head) = Promise::<u64, Error>::deferred_in(inline());
        let mut outer = head;
        for _ in 0..100_000 {
            let (next, promise) = Promise::<u64, Error>::deferred_in(inline());
            next.adopt(outer);
            outer = promise;
        }
        let task = thread::spawn(move || op.resolve(7));
        assert!(task.join().expect("The resolving thread has panicked"));
        assert_eq!(outer.try_result(), Some(Ok(7)));
    }

    #[test]
    fn test_nested_settle_runs_after_current_reaction() {
        let (first, a) = Promise::<i32, Error>::deferred_in(inline());
        let (second, b) = Promise::<i32, Error>::deferred_in(inline());
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            b.on_settle(move |_| seen.lock().push("b"));
        }
        {
            let seen = seen.clone();
            a.on_settle(move |_| {
                second.resolve(1);
                seen.lock().push("a");
            });
        }
        first.resolve(0);
        assert_eq!(*seen.lock(), vec!["a", "b"]);
        assert_eq!(b.try_result(), Some(Ok(1)));
    }

    #[test]
    fn test_await_timeout_unbounded() {
        let (op, promise) = Promise::<i32, Error>::deferred();
        let task = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            op.resolve(1)
        });
        assert_eq!(promise.await_timeout(Duration::MAX), Some(Ok(1)));
        task.join().expect("The resolving thread has panicked");
        assert_eq!(promise.await_timeout(Duration::MAX), Some(Ok(1)));
    }

    #[test]
    fn test_await_timeout_pending() {
        let (_op, promise) = Promise::<i32, Error>::deferred();
        assert_eq!(promise.await_timeout(Duration::from_millis(10)), None);
    }

    #[test]
    fn test_debug_shows_state() {
        let (op, promise) = Promise::<i32, Error>::deferred_in(inline());
        op.resolve(5);
        assert!(format!("{:?}", promise).contains("Fulfilled(5)"));
    }
}
