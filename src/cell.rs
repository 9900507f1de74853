//! Inline tagged storage for a value, an error or an exception.
//!
//! [`StateCell<T, E, X>`] is the substrate every other type in this crate is
//! built on. It stores at most one payload in a `union` next to a [`Status`]
//! word and never allocates. Any of the three payload types may be `()`, or
//! [`Infallible`](core::convert::Infallible) to disable that alternative.

use core::fmt;
use core::mem::{self, ManuallyDrop};

use crate::error::Error;
use crate::status::{Kind, Status};

/// Untagged storage; the active member is named by the owning cell's status.
union Storage<T, E, X> {
   empty: (),
   value: ManuallyDrop<T>,
   error: ManuallyDrop<E>,
   exception: ManuallyDrop<X>,
}

/// A payload moved out of a [`StateCell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload<T, E, X> {
   Empty,
   Value(T),
   Error(E),
   Exception(X),
}

impl<T, E, X> Payload<T, E, X> {
   pub fn kind(&self) -> Kind {
      match self {
         Self::Empty => Kind::Empty,
         Self::Value(_) => Kind::Value,
         Self::Error(_) => Kind::Error,
         Self::Exception(_) => Kind::Exception,
      }
   }
}

/// Inline storage holding at most one of a value, an error or an exception.
///
/// A cell starts either empty or holding a payload. Consuming reads
/// ([`take`](Self::take) and friends) move the payload out and mark the cell
/// *moved-from*; such a cell fails [`check_validity`](Self::check_validity),
/// whereas a freshly created empty cell is valid (it is simply pending).
pub struct StateCell<T, E, X> {
   status: Status,
   storage: Storage<T, E, X>,
}

impl<T, E, X> StateCell<T, E, X> {
   /// Creates an empty cell.
   #[inline]
   #[must_use]
   pub const fn new() -> Self {
      Self {
         status: Status::EMPTY,
         storage: Storage { empty: () },
      }
   }

   /// Creates a cell holding `value`.
   #[inline]
   #[must_use]
   pub const fn with_value(value: T) -> Self {
      Self {
         status: Status::EMPTY.with_payload(Status::HAS_VALUE),
         storage: Storage {
            value: ManuallyDrop::new(value),
         },
      }
   }

   /// Creates a cell holding `error`.
   #[inline]
   #[must_use]
   pub const fn with_error(error: E) -> Self {
      Self {
         status: Status::EMPTY.with_payload(Status::HAS_ERROR),
         storage: Storage {
            error: ManuallyDrop::new(error),
         },
      }
   }

   /// Creates a cell holding `exception`.
   #[inline]
   #[must_use]
   pub const fn with_exception(exception: X) -> Self {
      Self {
         status: Status::EMPTY.with_payload(Status::HAS_EXCEPTION),
         storage: Storage {
            exception: ManuallyDrop::new(exception),
         },
      }
   }

   #[inline]
   pub const fn status(&self) -> Status {
      self.status
   }

   #[inline]
   pub const fn has_value(&self) -> bool {
      self.status.has_value()
   }

   #[inline]
   pub const fn has_error(&self) -> bool {
      self.status.has_error()
   }

   #[inline]
   pub const fn has_exception(&self) -> bool {
      self.status.has_exception()
   }

   /// True if no payload is stored.
   #[inline]
   pub const fn is_empty(&self) -> bool {
      self.status.is_empty()
   }

   /// True if the payload was moved out by a consuming read.
   #[inline]
   pub const fn is_moved_from(&self) -> bool {
      self.status.is_moved_from()
   }

   /// Fails with [`Error::NoState`] if the cell was consumed.
   ///
   /// An empty cell that was never filled is valid.
   #[inline]
   pub fn check_validity(&self) -> Result<(), Error> {
      if self.status.is_moved_from() {
         Err(Error::NoState)
      } else {
         Ok(())
      }
   }

   /// True if the cell can accept a payload.
   #[inline(always)]
   fn is_vacant(&self) -> bool {
      self.status.is_empty() && !self.status.is_moved_from()
   }

   /// Stores `value` in a vacant cell.
   ///
   /// Returns `Err(value)` if the cell already holds a payload or was consumed.
   #[inline]
   pub fn construct_value(&mut self, value: T) -> Result<&mut T, T> {
      if !self.is_vacant() {
         return Err(value);
      }
      self.storage = Storage {
         value: ManuallyDrop::new(value),
      };
      self.status = self.status.with_payload(Status::HAS_VALUE);
      // SAFETY: The value member was just written.
      Ok(unsafe { &mut *self.storage.value })
   }

   /// Stores `error` in a vacant cell.
   ///
   /// Returns `Err(error)` if the cell already holds a payload or was consumed.
   #[inline]
   pub fn construct_error(&mut self, error: E) -> Result<&mut E, E> {
      if !self.is_vacant() {
         return Err(error);
      }
      self.storage = Storage {
         error: ManuallyDrop::new(error),
      };
      self.status = self.status.with_payload(Status::HAS_ERROR);
      // SAFETY: The error member was just written.
      Ok(unsafe { &mut *self.storage.error })
   }

   /// Stores `exception` in a vacant cell.
   ///
   /// Returns `Err(exception)` if the cell already holds a payload or was consumed.
   #[inline]
   pub fn construct_exception(&mut self, exception: X) -> Result<&mut X, X> {
      if !self.is_vacant() {
         return Err(exception);
      }
      self.storage = Storage {
         exception: ManuallyDrop::new(exception),
      };
      self.status = self.status.with_payload(Status::HAS_EXCEPTION);
      // SAFETY: The exception member was just written.
      Ok(unsafe { &mut *self.storage.exception })
   }

   /// Records whether the stored error is errno-like. Ignored unless an error is stored.
   #[inline]
   pub fn set_error_is_errno(&mut self, errno: bool) {
      if self.status.has_error() {
         self.status = self.status.with_errno(errno);
      }
   }

   #[inline]
   pub const fn custom_flags(&self) -> u8 {
      self.status.custom()
   }

   /// Sets the custom byte of the status word. Survives consuming reads, but not [`clear`](Self::clear).
   #[inline]
   pub fn set_custom_flags(&mut self, flags: u8) {
      self.status = self.status.with_custom(flags);
   }

   #[inline]
   pub fn value(&self) -> Option<&T> {
      if self.has_value() {
         // SAFETY: The status names the value member as active.
         Some(unsafe { self.value_unchecked() })
      } else {
         None
      }
   }

   #[inline]
   pub fn value_mut(&mut self) -> Option<&mut T> {
      if self.has_value() {
         // SAFETY: The status names the value member as active.
         Some(unsafe { &mut *self.storage.value })
      } else {
         None
      }
   }

   #[inline]
   pub fn error(&self) -> Option<&E> {
      if self.has_error() {
         // SAFETY: The status names the error member as active.
         Some(unsafe { self.error_unchecked() })
      } else {
         None
      }
   }

   #[inline]
   pub fn error_mut(&mut self) -> Option<&mut E> {
      if self.has_error() {
         // SAFETY: The status names the error member as active.
         Some(unsafe { &mut *self.storage.error })
      } else {
         None
      }
   }

   #[inline]
   pub fn exception(&self) -> Option<&X> {
      if self.has_exception() {
         // SAFETY: The status names the exception member as active.
         Some(unsafe { self.exception_unchecked() })
      } else {
         None
      }
   }

   #[inline]
   pub fn exception_mut(&mut self) -> Option<&mut X> {
      if self.has_exception() {
         // SAFETY: The status names the exception member as active.
         Some(unsafe { &mut *self.storage.exception })
      } else {
         None
      }
   }

   /// Returns the value without checking the status.
   ///
   /// # Safety
   ///
   /// Calling this method on a cell that does not hold a value is *undefined behavior*.
   #[inline]
   pub unsafe fn value_unchecked(&self) -> &T {
      debug_assert!(self.has_value(), "value_unchecked called without a value");
      // SAFETY: The caller guarantees the value member is active.
      unsafe { &*self.storage.value }
   }

   /// Returns the error without checking the status.
   ///
   /// # Safety
   ///
   /// Calling this method on a cell that does not hold an error is *undefined behavior*.
   #[inline]
   pub unsafe fn error_unchecked(&self) -> &E {
      debug_assert!(self.has_error(), "error_unchecked called without an error");
      // SAFETY: The caller guarantees the error member is active.
      unsafe { &*self.storage.error }
   }

   /// Returns the exception without checking the status.
   ///
   /// # Safety
   ///
   /// Calling this method on a cell that does not hold an exception is *undefined behavior*.
   #[inline]
   pub unsafe fn exception_unchecked(&self) -> &X {
      debug_assert!(
         self.has_exception(),
         "exception_unchecked called without an exception"
      );
      // SAFETY: The caller guarantees the exception member is active.
      unsafe { &*self.storage.exception }
   }

   /// Moves the payload out, leaving the cell moved-from.
   ///
   /// Returns [`Payload::Empty`] (and leaves the status alone) if nothing is stored.
   #[inline]
   pub fn take(&mut self) -> Payload<T, E, X> {
      let status = self.status;
      if status.is_empty() {
         return Payload::Empty;
      }
      self.status = status.with_payload(Status::MOVED_FROM);
      // SAFETY: `status` named the active member. The cell no longer does, so
      // the member is read out exactly once.
      unsafe {
         match status.kind() {
            Kind::Value => Payload::Value(ManuallyDrop::take(&mut self.storage.value)),
            Kind::Error => Payload::Error(ManuallyDrop::take(&mut self.storage.error)),
            Kind::Exception => {
               Payload::Exception(ManuallyDrop::take(&mut self.storage.exception))
            }
            Kind::Empty => Payload::Empty,
         }
      }
   }

   /// Moves the value out if one is stored.
   #[inline]
   pub fn take_value(&mut self) -> Option<T> {
      match self.has_value() {
         true => match self.take() {
            Payload::Value(value) => Some(value),
            _ => None,
         },
         false => None,
      }
   }

   /// Moves the error out if one is stored.
   #[inline]
   pub fn take_error(&mut self) -> Option<E> {
      match self.has_error() {
         true => match self.take() {
            Payload::Error(error) => Some(error),
            _ => None,
         },
         false => None,
      }
   }

   /// Moves the exception out if one is stored.
   #[inline]
   pub fn take_exception(&mut self) -> Option<X> {
      match self.has_exception() {
         true => match self.take() {
            Payload::Exception(exception) => Some(exception),
            _ => None,
         },
         false => None,
      }
   }

   /// Drops the payload (if any) and resets the status to empty.
   ///
   /// Idempotent; also revalidates a moved-from cell.
   #[inline]
   pub fn clear(&mut self) {
      let status = mem::replace(&mut self.status, Status::EMPTY);
      // SAFETY: `status` named the active member and the cell no longer does.
      unsafe { self.drop_member(status) };
   }

   /// Drops the payload and marks the cell moved-from, as a consuming read would.
   #[inline]
   pub(crate) fn consume(&mut self) {
      let status = self.status;
      self.status = status.with_payload(Status::MOVED_FROM);
      // SAFETY: `status` named the active member and the cell no longer does.
      unsafe { self.drop_member(status) };
   }

   /// # Safety
   ///
   /// `status` must name the active member, and the cell's own status must already
   /// have been updated so the member is never dropped twice.
   #[inline(always)]
   unsafe fn drop_member(&mut self, status: Status) {
      unsafe {
         match status.kind() {
            Kind::Value => ManuallyDrop::drop(&mut self.storage.value),
            Kind::Error => ManuallyDrop::drop(&mut self.storage.error),
            Kind::Exception => ManuallyDrop::drop(&mut self.storage.exception),
            Kind::Empty => {}
         }
      }
   }

   /// Consumes the cell, returning its payload.
   #[inline]
   pub fn into_payload(self) -> Payload<T, E, X> {
      let mut this = mem::ManuallyDrop::new(self);
      // `take` leaves nothing behind for `Drop` to release.
      this.take()
   }
}

impl<T, E, X> Default for StateCell<T, E, X> {
   #[inline]
   fn default() -> Self {
      Self::new()
   }
}

impl<T, E, X> Drop for StateCell<T, E, X> {
   #[inline]
   fn drop(&mut self) {
      self.clear();
   }
}

impl<T, E, X> From<Payload<T, E, X>> for StateCell<T, E, X> {
   fn from(payload: Payload<T, E, X>) -> Self {
      match payload {
         Payload::Empty => Self::new(),
         Payload::Value(value) => Self::with_value(value),
         Payload::Error(error) => Self::with_error(error),
         Payload::Exception(exception) => Self::with_exception(exception),
      }
   }
}

impl<T, E, X> From<Result<T, E>> for StateCell<T, E, X> {
   fn from(result: Result<T, E>) -> Self {
      match result {
         Ok(value) => Self::with_value(value),
         Err(error) => Self::with_error(error),
      }
   }
}

impl<T: Clone, E: Clone, X: Clone> Clone for StateCell<T, E, X> {
   /// Clones the payload and the whole status word, moved-from marker included.
   fn clone(&self) -> Self {
      let mut cell = if let Some(value) = self.value() {
         Self::with_value(value.clone())
      } else if let Some(error) = self.error() {
         Self::with_error(error.clone())
      } else if let Some(exception) = self.exception() {
         Self::with_exception(exception.clone())
      } else {
         Self::new()
      };
      cell.status = self.status;
      cell
   }
}

impl<T: PartialEq, E: PartialEq, X: PartialEq> PartialEq for StateCell<T, E, X> {
   /// Two cells are equal if they hold the same alternative with equal payloads.
   fn eq(&self, other: &Self) -> bool {
      match (self.status.kind(), other.status.kind()) {
         (Kind::Value, Kind::Value) => self.value() == other.value(),
         (Kind::Error, Kind::Error) => self.error() == other.error(),
         (Kind::Exception, Kind::Exception) => self.exception() == other.exception(),
         (Kind::Empty, Kind::Empty) => true,
         _ => false,
      }
   }
}

impl<T: fmt::Debug, E: fmt::Debug, X: fmt::Debug> fmt::Debug for StateCell<T, E, X> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_struct("StateCell");
      d.field("status", &self.status);
      if let Some(value) = self.value() {
         d.field("value", value);
      } else if let Some(error) = self.error() {
         d.field("error", error);
      } else if let Some(exception) = self.exception() {
         d.field("exception", exception);
      }
      d.finish()
   }
}
