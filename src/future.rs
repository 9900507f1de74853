//! Blocking futures over a shared [`StateCell`].
//!
//! A future is a handle to a reference-counted slot holding one state cell
//! and one [`FutureState`] word. The producer side ([`Promise`](crate::Promise))
//! publishes into the slot exactly once; consumers wait until the slot leaves
//! the pending state, reach the payload under the slot's exclusion scope, and
//! run the policy only after that scope is released.
//!
//! [`BasicFuture`] is generic over the access mode:
//!
//! - [`Future`] (`Consuming`): one owner, `get` moves the payload out and a
//!   second `get` fails with [`Error::NoState`].
//! - [`SharedFuture`] (`Shared`): cloneable, `get` returns a reference and
//!   every holder observes the same payload.
//!
//! A handle is *invalid* when it has no slot (default-constructed, or the
//! source of a [`share`](Future::share)), *pending* while the slot is empty,
//! and *settled* once a payload was published.

use core::cell::UnsafeCell;
use core::fmt;
use core::marker::PhantomData;
use core::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::access::{self, Access, Check, Consuming, Shared};
use crate::cell::{Payload, StateCell};
use crate::ecosystem::{ErrorCode, ExceptionPtr};
use crate::error::Error;
use crate::outcome::Outcome;
use crate::policy::{AllNarrow, DefaultPolicy, Policy, ThrowBadResultAccess};
use crate::state::FutureState;
use crate::status::Status;

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FutureStatus {
   /// The future is settled.
   Ready,
   /// The deadline passed while the future was still pending.
   Timeout,
}

/// The slot shared by a promise and its futures.
pub(crate) struct Slot<T, E, X> {
   cell: UnsafeCell<StateCell<T, E, X>>,
   state: FutureState,
}

// SAFETY: The cell is only touched inside the exclusion scope, or through
// shared references once the slot is settled and can no longer be written.
// Payloads only ever move between threads, so `Send` payloads suffice. Handles
// that lend out `&T`/`&E`/`&X` add their own `Sync` requirement through
// `Access::Lends`.
unsafe impl<T: Send, E: Send, X: Send> Send for Slot<T, E, X> {}
// SAFETY: See above.
unsafe impl<T: Send, E: Send, X: Send> Sync for Slot<T, E, X> {}

impl<T, E, X> Slot<T, E, X> {
   pub(crate) fn pending() -> Self {
      Self {
         cell: UnsafeCell::new(StateCell::new()),
         state: FutureState::new(),
      }
   }

   pub(crate) fn settled(cell: StateCell<T, E, X>) -> Self {
      Self {
         cell: UnsafeCell::new(cell),
         state: FutureState::settled(),
      }
   }

   /// Maps a resolved slot onto its outcome: settled, or abandoned by the producer.
   fn resolution(&self) -> Result<(), Error> {
      if self.state.is_settled(Ordering::Acquire) {
         Ok(())
      } else if self.state.is_abandoned(Ordering::Acquire) {
         Err(Error::BrokenPromise)
      } else {
         Err(Error::NoState)
      }
   }

   pub(crate) fn is_settled(&self) -> bool {
      self.state.is_settled(Ordering::Acquire)
   }

   fn wait(&self) -> Result<(), Error> {
      self.state.wait();
      self.resolution()
   }

   fn wait_until(&self, deadline: Instant) -> Result<FutureStatus, Error> {
      if self.state.wait_deadline(Some(deadline)) {
         self.resolution().map(|()| FutureStatus::Ready)
      } else {
         Ok(FutureStatus::Timeout)
      }
   }

   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   async fn wait_async(&self) -> Result<(), Error> {
      self.state.wait_async().await;
      self.resolution()
   }

   /// Runs `f` on the cell inside the exclusion scope.
   ///
   /// Only consuming handles and the producer take this path; neither coexists
   /// with outstanding shared references.
   fn with_cell<R>(&self, f: impl FnOnce(&mut StateCell<T, E, X>) -> R) -> R {
      let _scope = self.state.lock();
      // SAFETY: The exclusion scope is held and no shared reference into the
      // cell is alive (see above).
      f(unsafe { &mut *self.cell.get() })
   }

   /// Runs `f` on a shared view of the cell inside the exclusion scope.
   fn with_cell_ref<R>(&self, f: impl FnOnce(&StateCell<T, E, X>) -> R) -> R {
      let _scope = self.state.lock();
      // SAFETY: The exclusion scope is held, so no writer is active.
      f(unsafe { &*self.cell.get() })
   }

   /// Raw pointer to the cell of a settled slot, taken inside the exclusion scope.
   fn settled_cell(&self) -> *const StateCell<T, E, X> {
      let _scope = self.state.lock();
      self.cell.get()
   }

   /// Status of the cell; empty while pending.
   fn status(&self) -> Status {
      if self.state.is_resolved() {
         self.with_cell_ref(StateCell::status)
      } else {
         Status::EMPTY
      }
   }

   /// The single write that moves the slot from pending to settled.
   pub(crate) fn publish(&self, payload: Payload<T, E, X>, errno: bool) -> Result<(), Error> {
      let kind = payload.kind();
      let scope = self.state.lock();
      if self.state.is_settled(Ordering::Relaxed) {
         tracing::debug!(%kind, "rejecting second publish on a settled future");
         return Err(Error::AlreadySatisfied);
      }
      // SAFETY: The exclusion scope is held and the slot is unsettled, so no
      // reader holds a reference into the cell.
      let cell = unsafe { &mut *self.cell.get() };
      let stored = match payload {
         Payload::Value(value) => cell.construct_value(value).is_ok(),
         Payload::Error(error) => {
            let stored = cell.construct_error(error).is_ok();
            cell.set_error_is_errno(errno);
            stored
         }
         Payload::Exception(exception) => cell.construct_exception(exception).is_ok(),
         Payload::Empty => return Err(Error::NoState),
      };
      if !stored {
         return Err(Error::AlreadySatisfied);
      }
      scope.publish();
      tracing::trace!(%kind, "future settled");
      Ok(())
   }

   /// Marks an unsettled slot as abandoned, waking every waiter.
   pub(crate) fn abandon(&self) {
      let scope = self.state.lock();
      if self.state.is_settled(Ordering::Relaxed) {
         return;
      }
      scope.abandon();
      tracing::debug!("promise dropped without publishing");
   }
}

/// A handle to a value published asynchronously, read in access mode `M`.
///
/// `P` defaults to the policy `E` selects through [`DefaultPolicy`].
pub struct BasicFuture<
   T,
   E = ErrorCode,
   X = ExceptionPtr,
   P = <E as DefaultPolicy>::Policy,
   M: Access = Consuming,
> {
   slot: Option<Arc<Slot<T, E, X>>>,
   _marker: PhantomData<fn() -> (P, M)>,
   _lends: PhantomData<M::Lends<T, E, X>>,
}

/// A single-consumer future: reads move the payload out.
pub type Future<T, E = ErrorCode, X = ExceptionPtr, P = <E as DefaultPolicy>::Policy> =
   BasicFuture<T, E, X, P, Consuming>;

/// A cloneable future: every holder reads the same settled payload.
pub type SharedFuture<T, E = ErrorCode, X = ExceptionPtr, P = <E as DefaultPolicy>::Policy> =
   BasicFuture<T, E, X, P, Shared>;

/// A [`Future`] under the narrow contract.
pub type UncheckedFuture<T, E = ErrorCode, X = ExceptionPtr> = Future<T, E, X, AllNarrow>;

/// A [`Future`] that reports every missing alternative as [`Error::BadResultAccess`].
pub type CheckedFuture<T, E = ErrorCode, X = ExceptionPtr> = Future<T, E, X, ThrowBadResultAccess>;

impl<T, E, X, P: Policy<E, X>, M: Access> BasicFuture<T, E, X, P, M> {
   #[inline]
   pub(crate) fn from_slot(slot: Arc<Slot<T, E, X>>) -> Self {
      Self {
         slot: Some(slot),
         _marker: PhantomData,
         _lends: PhantomData,
      }
   }

   /// A handle with no attached state.
   #[inline]
   #[must_use]
   pub const fn invalid() -> Self {
      Self {
         slot: None,
         _marker: PhantomData,
         _lends: PhantomData,
      }
   }

   /// Rebinds the handle to another policy, keeping the attached state.
   ///
   /// Policies never convert implicitly; this is the explicit opt-in.
   #[inline]
   pub fn with_policy<Q: Policy<E, X>>(self) -> BasicFuture<T, E, X, Q, M> {
      BasicFuture {
         slot: self.slot,
         _marker: PhantomData,
         _lends: PhantomData,
      }
   }

   #[inline]
   fn slot(&self) -> Result<&Slot<T, E, X>, Error> {
      self.slot.as_deref().ok_or(Error::NoState)
   }

   /// True if the handle has attached state.
   #[inline]
   pub fn valid(&self) -> bool {
      self.slot.is_some()
   }

   /// True if reads move the payload out.
   #[inline]
   pub fn is_consuming(&self) -> bool {
      M::CONSUMING
   }

   /// True once the future is settled or its producer went away. Never blocks.
   #[inline]
   pub fn is_ready(&self) -> bool {
      self.slot.as_deref().is_some_and(|slot| slot.state.is_resolved())
   }

   /// Status of the cell; empty while pending or invalid. Never blocks on the producer.
   #[inline]
   pub fn status(&self) -> Status {
      self.slot.as_deref().map_or(Status::EMPTY, Slot::status)
   }

   #[inline]
   pub fn has_value(&self) -> bool {
      self.status().has_value()
   }

   #[inline]
   pub fn has_error(&self) -> bool {
      self.status().has_error()
   }

   #[inline]
   pub fn has_exception(&self) -> bool {
      self.status().has_exception()
   }

   /// Blocks until the future is settled.
   ///
   /// Fails with [`Error::NoState`] on an invalid handle and with
   /// [`Error::BrokenPromise`] if the producer was dropped without publishing.
   pub fn wait(&self) -> Result<(), Error> {
      self.slot()?.wait()
   }

   /// Blocks until the future is settled or `timeout` elapses.
   pub fn wait_for(&self, timeout: Duration) -> Result<FutureStatus, Error> {
      let slot = self.slot()?;
      match Instant::now().checked_add(timeout) {
         Some(deadline) => slot.wait_until(deadline),
         None => slot.wait().map(|()| FutureStatus::Ready),
      }
   }

   /// Blocks until the future is settled or `deadline` passes.
   pub fn wait_until(&self, deadline: Instant) -> Result<FutureStatus, Error> {
      self.slot()?.wait_until(deadline)
   }

   /// Waits without blocking the async runtime's worker.
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub async fn wait_async(&self) -> Result<(), Error> {
      self.slot()?.wait_async().await
   }
}

impl<T, E, X, P: Policy<E, X>> BasicFuture<T, E, X, P, Consuming> {
   /// Waits and moves the whole payload out inside the exclusion scope.
   ///
   /// The errno classification travels with the payload; the slot is left
   /// moved-from.
   fn take_cell(&mut self) -> Result<StateCell<T, E, X>, Error> {
      let slot = self.slot()?;
      slot.wait()?;
      slot.with_cell(|cell| {
         cell.check_validity()?;
         let errno = cell.status().error_is_errno();
         let mut taken = StateCell::from(cell.take());
         taken.set_error_is_errno(errno);
         Ok::<_, Error>(taken)
      })
   }

   /// Waits, then resolves `check`/`extract` on the moved-out payload.
   ///
   /// The policy runs after the exclusion scope is released, so user code it
   /// calls (such as a `Debug` impl) may touch the future again.
   fn take_with<R>(
      &mut self,
      check: Check<T, E, X>,
      extract: fn(&mut StateCell<T, E, X>) -> Option<R>,
   ) -> Result<R, Error> {
      let mut cell = self.take_cell()?;
      access::resolve::<Consuming, _, _, _, _, _>(&mut cell, check, extract)
   }

   /// Waits for the value and moves it out.
   ///
   /// A stored error or exception is resolved through `P` and consumed as
   /// well; any later read fails with [`Error::NoState`].
   pub fn get(&mut self) -> Result<T, Error> {
      self.take_with(access::check_value::<T, E, X, P>, StateCell::take_value)
   }

   /// Waits for the error and moves it out.
   pub fn get_error(&mut self) -> Result<E, Error> {
      self.take_with(access::check_error::<T, E, X, P>, StateCell::take_error)
   }

   /// Waits for the exception and moves it out.
   pub fn get_exception(&mut self) -> Result<X, Error> {
      self.take_with(access::check_exception::<T, E, X, P>, StateCell::take_exception)
   }

   /// Owned form of [`get`](Self::get).
   #[inline]
   pub fn into_value(mut self) -> Result<T, Error> {
      self.get()
   }

   /// Waits and lifts the whole payload into an [`Outcome`].
   pub fn into_outcome(mut self) -> Result<Outcome<T, E, X, P>, Error> {
      Outcome::try_from(self.take_cell()?)
   }

   /// Waits asynchronously, then behaves like [`get`](Self::get).
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub async fn get_async(&mut self) -> Result<T, Error> {
      self.wait_async().await?;
      self.get()
   }

   /// Converts into a [`SharedFuture`], leaving this handle invalid.
   ///
   /// Fails with [`Error::NoState`] on an invalid handle, including one that
   /// was already shared.
   pub fn share(&mut self) -> Result<SharedFuture<T, E, X, P>, Error> {
      let slot = self.slot.take().ok_or(Error::NoState)?;
      tracing::debug!(settled = slot.is_settled(), "future converted to shared future");
      Ok(BasicFuture::from_slot(slot))
   }
}

impl<T, E, X, P: Policy<E, X>> BasicFuture<T, E, X, P, Shared> {
   /// Waits, then borrows through `check`/`extract`.
   ///
   /// The policy runs outside the exclusion scope, so user code it calls may
   /// touch the future again.
   fn read_with<'a, R: 'a>(
      &'a self,
      check: Check<T, E, X>,
      extract: fn(&StateCell<T, E, X>) -> Option<&R>,
   ) -> Result<&'a R, Error> {
      let slot = self.slot()?;
      slot.wait()?;
      // SAFETY: Shared handles never write to the cell and the producer cannot
      // write once the slot is settled, so the cell is stable; `self` keeps the
      // slot alive for the returned lifetime.
      let cell = unsafe { &*slot.settled_cell() };
      check(cell)?;
      extract(cell).ok_or(Error::NoState)
   }

   /// Waits for the value and borrows it. Never clears the cell.
   pub fn get(&self) -> Result<&T, Error> {
      self.read_with(access::check_value::<T, E, X, P>, StateCell::value)
   }

   pub fn get_error(&self) -> Result<&E, Error> {
      self.read_with(access::check_error::<T, E, X, P>, StateCell::error)
   }

   pub fn get_exception(&self) -> Result<&X, Error> {
      self.read_with(access::check_exception::<T, E, X, P>, StateCell::exception)
   }

   /// Waits asynchronously, then behaves like [`get`](Self::get).
   #[cfg(any(feature = "async-tokio", feature = "async-tokio-mt"))]
   pub async fn get_async(&self) -> Result<&T, Error> {
      self.wait_async().await?;
      self.get()
   }
}

impl<T, E, X, P, M: Access> Default for BasicFuture<T, E, X, P, M> {
   /// Creates an invalid handle.
   #[inline]
   fn default() -> Self {
      Self {
         slot: None,
         _marker: PhantomData,
         _lends: PhantomData,
      }
   }
}

impl<T, E, X, P> Clone for BasicFuture<T, E, X, P, Shared> {
   #[inline]
   fn clone(&self) -> Self {
      Self {
         slot: self.slot.clone(),
         _marker: PhantomData,
         _lends: PhantomData,
      }
   }
}

impl<T, E, X, P, M: Access> fmt::Debug for BasicFuture<T, E, X, P, M> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let state = match self.slot.as_deref() {
         None => "invalid",
         Some(slot) if slot.state.is_settled(Ordering::Acquire) => "settled",
         Some(slot) if slot.state.is_abandoned(Ordering::Acquire) => "abandoned",
         Some(_) => "pending",
      };
      f.debug_struct("BasicFuture")
         .field("state", &state)
         .field("consuming", &M::CONSUMING)
         .finish()
   }
}

impl<T, E, X, P: Policy<E, X>> From<Outcome<T, E, X, P>> for Future<T, E, X, P> {
   /// A future already settled with the outcome's payload.
   fn from(outcome: Outcome<T, E, X, P>) -> Self {
      let errno = outcome.status().error_is_errno();
      let mut cell = StateCell::from(outcome.into_payload());
      cell.set_error_is_errno(errno);
      Self::from_slot(Arc::new(Slot::settled(cell)))
   }
}

/// A future already holding `value`.
pub fn make_ready_future<T, E, X, P: Policy<E, X>>(value: T) -> Future<T, E, X, P> {
   BasicFuture::from_slot(Arc::new(Slot::settled(StateCell::with_value(value))))
}

/// A future already holding `error`.
pub fn make_errored_future<T, E, X, P: Policy<E, X>>(error: E) -> Future<T, E, X, P> {
   let errno = P::is_errno(&error);
   let mut cell = StateCell::with_error(error);
   cell.set_error_is_errno(errno);
   BasicFuture::from_slot(Arc::new(Slot::settled(cell)))
}

/// A future already holding `exception`.
pub fn make_exceptional_future<T, E, X, P: Policy<E, X>>(exception: X) -> Future<T, E, X, P> {
   BasicFuture::from_slot(Arc::new(Slot::settled(StateCell::with_exception(exception))))
}
