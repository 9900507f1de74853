//! Policy-driven result cells and blocking futures built on one inline state cell.
//!
//! This crate provides a small family of types that hold a value, an error or an
//! exception, and differ only in how a missing alternative is handled and in
//! whether the payload arrives later:
//!
//! - [`StateCell<T, E, X>`]: The inline tagged storage everything else builds on.
//! - [`Outcome<T, E, X, P>`]: A settled cell read through a compile-time [`Policy`].
//! - [`Future<T, E, X, P>`] / [`SharedFuture<T, E, X, P>`]: The same cell shared
//!   between a [`Promise`] and its consumer(s), published exactly once.
//!
//! Policies are zero-sized types. The choice between panicking, aborting,
//! returning [`Error::BadResultAccess`], surfacing an error code as a
//! [`SystemError`] or rethrowing an [`ExceptionPtr`] is made per instantiation
//! and never at runtime.
//!
//! # Features
//!
//! - **No allocation for outcomes**: Payloads live inline in a `union` next to a status word.
//! - **Single publication**: The producer settles the future with one release store.
//! - **Efficient blocking**: Waiters park on the state word with `parking_lot_core`.
//! - **Async support**: `wait_async`/`get_async` when a Tokio feature is enabled.
//!
//! # Examples
//!
//! ## Outcome
//!
//! ```rust
//! use poly_outcome::{Errc, Error, ErrorCode, Outcome};
//!
//! let ok: Outcome<u32> = Outcome::success(42);
//! assert_eq!(*ok.value().unwrap(), 42);
//!
//! let failed: Outcome<u32> = Outcome::failure(ErrorCode::from(Errc::TimedOut));
//! match failed.value() {
//!    Err(Error::System(error)) => assert!(error.is_errno()),
//!    other => panic!("unexpected {other:?}"),
//! }
//! ```
//!
//! ## Promise and future
//!
//! ```rust
//! use poly_outcome::{channel, Future, Promise};
//!
//! let (promise, mut future): (Promise<String>, Future<String>) = channel();
//!
//! std::thread::spawn(move || {
//!    promise.set_value("done".to_string()).unwrap();
//! });
//!
//! assert_eq!(future.get().unwrap(), "done");
//! assert!(future.get().unwrap_err().is_no_state());
//! ```

/// Consuming and shared access modes and the accessor state machine.
mod access;

/// Inline tagged storage.
mod cell;

/// Error-code and exception-pointer adapters.
mod ecosystem;

/// The crate-wide error type.
mod error;

/// Blocking futures over a shared cell.
mod future;

/// Settled outcomes.
mod outcome;

/// Missing-alternative policies.
mod policy;

/// Producer side of a future.
mod promise;

/// Internal synchronization state management.
mod state;

/// Status word layout.
mod status;

pub use access::{Access, Consuming, Shared};
pub use cell::{Payload, StateCell};
pub use ecosystem::{
   AsErrorCode, AsExceptionPtr, Category, Errc, ErrorCode, ExceptionPtr, Panicked, SystemError,
};
pub use error::Error;
pub use future::{
   make_errored_future, make_exceptional_future, make_ready_future, BasicFuture, CheckedFuture,
   Future, FutureStatus, SharedFuture, UncheckedFuture,
};
pub use outcome::{Checked, Fallible, Outcome, Unchecked};
pub use policy::{
   AllNarrow, DefaultPolicy, ErrorCodeThrowAsSystemError, ExceptionPtrRethrow, Policy, Terminate,
   ThrowBadResultAccess,
};
pub use promise::{channel, Promise};
pub use status::{Kind, Status};
