//! The producer side of a [`Future`].

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::cell::Payload;
use crate::ecosystem::{ErrorCode, ExceptionPtr};
use crate::error::Error;
use crate::future::{BasicFuture, Future, Slot};
use crate::outcome::Outcome;
use crate::policy::{DefaultPolicy, Policy};

/// Publishes exactly one payload to the [`Future`] obtained from it.
///
/// The first successful `set_*` call settles the shared slot and wakes every
/// waiter; later calls fail with [`Error::AlreadySatisfied`] and leave the
/// published payload untouched. Dropping an unsatisfied promise wakes waiters
/// with [`Error::BrokenPromise`].
///
/// # Examples
///
/// ```rust
/// use poly_outcome::Promise;
///
/// let mut promise = Promise::<u32>::new();
/// let mut future = promise.get_future().unwrap();
///
/// std::thread::spawn(move || promise.set_value(7).unwrap());
/// assert_eq!(future.get().unwrap(), 7);
/// ```
pub struct Promise<T, E = ErrorCode, X = ExceptionPtr, P = <E as DefaultPolicy>::Policy> {
   slot: Arc<Slot<T, E, X>>,
   retrieved: bool,
   _policy: PhantomData<fn() -> P>,
}

impl<T, E, X, P: Policy<E, X>> Promise<T, E, X, P> {
   /// Creates a promise with a pending slot.
   #[inline]
   #[must_use]
   pub fn new() -> Self {
      Self {
         slot: Arc::new(Slot::pending()),
         retrieved: false,
         _policy: PhantomData,
      }
   }

   /// Returns the future attached to this promise. Only the first call succeeds.
   pub fn get_future(&mut self) -> Result<Future<T, E, X, P>, Error> {
      if self.retrieved {
         return Err(Error::FutureAlreadyRetrieved);
      }
      self.retrieved = true;
      Ok(BasicFuture::from_slot(Arc::clone(&self.slot)))
   }

   /// True once a payload was published.
   #[inline]
   pub fn is_satisfied(&self) -> bool {
      self.slot.is_settled()
   }

   pub fn set_value(&self, value: T) -> Result<(), Error> {
      self.slot.publish(Payload::Value(value), false)
   }

   /// Publishes `error`, classifying it through `P`.
   pub fn set_error(&self, error: E) -> Result<(), Error> {
      let errno = P::is_errno(&error);
      self.slot.publish(Payload::Error(error), errno)
   }

   pub fn set_exception(&self, exception: X) -> Result<(), Error> {
      self.slot.publish(Payload::Exception(exception), false)
   }

   /// Publishes whatever `outcome` holds.
   ///
   /// A consumed outcome is rejected with [`Error::NoState`].
   pub fn set_outcome(&self, outcome: Outcome<T, E, X, P>) -> Result<(), Error> {
      let errno = outcome.status().error_is_errno();
      self.slot.publish(outcome.into_payload(), errno)
   }

   /// Publishes `Ok` as a value and `Err` as an error.
   pub fn set_result(&self, result: Result<T, E>) -> Result<(), Error> {
      match result {
         Ok(value) => self.set_value(value),
         Err(error) => self.set_error(error),
      }
   }
}

impl<T, E, X, P: Policy<E, X>> Default for Promise<T, E, X, P> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<T, E, X, P> Drop for Promise<T, E, X, P> {
   fn drop(&mut self) {
      self.slot.abandon();
   }
}

impl<T, E, X, P> fmt::Debug for Promise<T, E, X, P> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_struct("Promise")
         .field("satisfied", &self.slot.is_settled())
         .field("retrieved", &self.retrieved)
         .finish()
   }
}

/// Creates a connected promise/future pair.
#[must_use]
pub fn channel<T, E, X, P: Policy<E, X>>() -> (Promise<T, E, X, P>, Future<T, E, X, P>) {
   let promise = Promise {
      slot: Arc::new(Slot::pending()),
      retrieved: true,
      _policy: PhantomData,
   };
   let future = BasicFuture::from_slot(Arc::clone(&promise.slot));
   (promise, future)
}
