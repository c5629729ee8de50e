//! Thread-backed promises.
//!
//! A [`Promise`] runs its work on an [`Executor`], settles exactly once as
//! fulfilled or rejected, and can be observed any number of times: by
//! blocking with [`Promise::await_promise`], by `.await`ing it from async
//! code, or by chaining continuations with [`Promise::then`] and
//! [`Promise::catch`]. Promises returned from continuations or passed to
//! [`Resolve::adopt`] are flattened into the chain.
//!
//! ```
//! use settle::{all, resolve, Error, Promise};
//!
//! let fetched = Promise::<u32, Error>::new(|resolve, _reject| {
//!     resolve.resolve(2);
//! });
//! let joined = all(vec![fetched.then(|v| v * 10), resolve(5)]);
//! assert_eq!(joined.await_promise(), Ok(vec![20, 5]));
//! ```

mod combinators;
mod error;
pub mod executor;
pub mod pool;
mod promise;

pub use combinators::{
    adopt, all, all_in, all_settled, all_settled_in, race, race_in, reject, reject_in, resolve,
    resolve_in, Settled,
};
pub use error::Error;
pub use executor::{default_executor, Executor, InlineExecutor, Task, ThreadExecutor};
pub use pool::{PoolConfig, ThreadPool};
pub use promise::{Producer, Promise, Reason, Reject, Resolve, State, Value};
