//! A settled result: a [`StateCell`] bound to a [`Policy`].
//!
//! [`Outcome<T, E, X, P>`] is the non-future face of the crate. It is
//! constructed already holding a value, an error or an exception, and exposes
//! the three access shapes for each alternative:
//!
//! - `&self` (`value`, `error`, `exception`) returns a reference and never
//!   changes the cell;
//! - `&mut self` (`value_mut`, ...) returns a mutable reference, or with the
//!   `take_*` family moves the payload out and leaves the outcome consumed;
//! - `self` (`into_value`, ...) returns the owned payload.
//!
//! The three shapes fail identically. Which error surfaces for a missing
//! alternative is decided by `P`.

use core::convert::Infallible;
use core::fmt;
use core::marker::PhantomData;

use crate::access::{self, Consuming, Shared};
use crate::cell::{Payload, StateCell};
use crate::ecosystem::{ErrorCode, ExceptionPtr};
use crate::error::Error;
use crate::policy::{AllNarrow, DefaultPolicy, Policy, ThrowBadResultAccess};
use crate::status::Status;

/// A value, an error or an exception, read through policy `P`.
///
/// `P` defaults to the policy `E` selects through [`DefaultPolicy`].
pub struct Outcome<T, E = ErrorCode, X = ExceptionPtr, P = <E as DefaultPolicy>::Policy> {
   cell: StateCell<T, E, X>,
   _policy: PhantomData<fn() -> P>,
}

/// An [`Outcome`] without the exception alternative.
pub type Fallible<T, E = ErrorCode, P = <E as DefaultPolicy>::Policy> =
   Outcome<T, E, Infallible, P>;

/// An [`Outcome`] under the narrow contract: reading a missing value is a caller bug.
pub type Unchecked<T, E = ErrorCode, X = ExceptionPtr> = Outcome<T, E, X, AllNarrow>;

/// An [`Outcome`] that reports every missing alternative as [`Error::BadResultAccess`].
pub type Checked<T, E = ErrorCode, X = ExceptionPtr> = Outcome<T, E, X, ThrowBadResultAccess>;

impl<T, E, X, P: Policy<E, X>> Outcome<T, E, X, P> {
   #[inline]
   const fn from_cell(cell: StateCell<T, E, X>) -> Self {
      Self {
         cell,
         _policy: PhantomData,
      }
   }

   /// Creates a successful outcome.
   #[inline]
   pub const fn success(value: T) -> Self {
      Self::from_cell(StateCell::with_value(value))
   }

   /// Creates a failed outcome holding `error`.
   #[inline]
   pub fn failure(error: E) -> Self {
      let errno = P::is_errno(&error);
      let mut cell = StateCell::with_error(error);
      cell.set_error_is_errno(errno);
      Self::from_cell(cell)
   }

   /// Creates a failed outcome holding `exception`.
   #[inline]
   pub const fn exceptional(exception: X) -> Self {
      Self::from_cell(StateCell::with_exception(exception))
   }

   /// Rebinds the outcome to another policy.
   ///
   /// Policies never convert implicitly; this is the explicit opt-in.
   #[inline]
   pub fn with_policy<Q: Policy<E, X>>(self) -> Outcome<T, E, X, Q> {
      Outcome::from_cell(self.cell)
   }

   #[inline]
   pub const fn status(&self) -> Status {
      self.cell.status()
   }

   #[inline]
   pub const fn has_value(&self) -> bool {
      self.cell.has_value()
   }

   #[inline]
   pub const fn has_error(&self) -> bool {
      self.cell.has_error()
   }

   #[inline]
   pub const fn has_exception(&self) -> bool {
      self.cell.has_exception()
   }

   /// True if an error or an exception is stored.
   #[inline]
   pub const fn has_failure(&self) -> bool {
      self.cell.status().has_failure()
   }

   /// True once a `take_*` call consumed the payload.
   #[inline]
   pub const fn is_consumed(&self) -> bool {
      self.cell.is_moved_from()
   }

   /// The underlying cell.
   #[inline]
   pub fn as_cell(&self) -> &StateCell<T, E, X> {
      &self.cell
   }

   #[inline]
   pub fn value(&self) -> Result<&T, Error> {
      access::check_value::<T, E, X, P>(&self.cell)?;
      self.cell.value().ok_or(Error::NoState)
   }

   #[inline]
   pub fn value_mut(&mut self) -> Result<&mut T, Error> {
      access::resolve::<Shared, _, _, _, _, _>(
         &mut self.cell,
         access::check_value::<T, E, X, P>,
         StateCell::value_mut,
      )
   }

   /// Moves the value out. On failure the stored payload is dropped as well.
   ///
   /// Any later read fails with [`Error::NoState`].
   #[inline]
   pub fn take_value(&mut self) -> Result<T, Error> {
      access::resolve::<Consuming, _, _, _, _, _>(
         &mut self.cell,
         access::check_value::<T, E, X, P>,
         StateCell::take_value,
      )
   }

   #[inline]
   pub fn into_value(mut self) -> Result<T, Error> {
      self.take_value()
   }

   #[inline]
   pub fn error(&self) -> Result<&E, Error> {
      access::check_error::<T, E, X, P>(&self.cell)?;
      self.cell.error().ok_or(Error::NoState)
   }

   #[inline]
   pub fn error_mut(&mut self) -> Result<&mut E, Error> {
      access::resolve::<Shared, _, _, _, _, _>(
         &mut self.cell,
         access::check_error::<T, E, X, P>,
         StateCell::error_mut,
      )
   }

   #[inline]
   pub fn take_error(&mut self) -> Result<E, Error> {
      access::resolve::<Consuming, _, _, _, _, _>(
         &mut self.cell,
         access::check_error::<T, E, X, P>,
         StateCell::take_error,
      )
   }

   #[inline]
   pub fn into_error(mut self) -> Result<E, Error> {
      self.take_error()
   }

   #[inline]
   pub fn exception(&self) -> Result<&X, Error> {
      access::check_exception::<T, E, X, P>(&self.cell)?;
      self.cell.exception().ok_or(Error::NoState)
   }

   #[inline]
   pub fn exception_mut(&mut self) -> Result<&mut X, Error> {
      access::resolve::<Shared, _, _, _, _, _>(
         &mut self.cell,
         access::check_exception::<T, E, X, P>,
         StateCell::exception_mut,
      )
   }

   #[inline]
   pub fn take_exception(&mut self) -> Result<X, Error> {
      access::resolve::<Consuming, _, _, _, _, _>(
         &mut self.cell,
         access::check_exception::<T, E, X, P>,
         StateCell::take_exception,
      )
   }

   #[inline]
   pub fn into_exception(mut self) -> Result<X, Error> {
      self.take_exception()
   }

   /// Returns the value without any check.
   ///
   /// # Safety
   ///
   /// Calling this method on an outcome that does not hold a value is *undefined behavior*.
   /// The caller must check [`has_value`](Self::has_value) first.
   #[inline]
   pub unsafe fn value_unchecked(&self) -> &T {
      // SAFETY: Forwarded to the caller.
      unsafe { self.cell.value_unchecked() }
   }

   /// Returns the error without any check.
   ///
   /// # Safety
   ///
   /// Calling this method on an outcome that does not hold an error is *undefined behavior*.
   #[inline]
   pub unsafe fn error_unchecked(&self) -> &E {
      // SAFETY: Forwarded to the caller.
      unsafe { self.cell.error_unchecked() }
   }

   /// Returns the exception without any check.
   ///
   /// # Safety
   ///
   /// Calling this method on an outcome that does not hold an exception is *undefined behavior*.
   #[inline]
   pub unsafe fn exception_unchecked(&self) -> &X {
      // SAFETY: Forwarded to the caller.
      unsafe { self.cell.exception_unchecked() }
   }

   /// Converts into a [`Result`], resolving the failure side through `P`.
   ///
   /// A stored error is returned as-is; a stored exception goes through the
   /// policy as a value request would.
   pub fn into_result(self) -> Result<Result<T, E>, Error> {
      if self.cell.has_exception() {
         access::check_value::<T, E, X, P>(&self.cell)?;
      }
      match self.cell.into_payload() {
         Payload::Value(value) => Ok(Ok(value)),
         Payload::Error(error) => Ok(Err(error)),
         Payload::Empty | Payload::Exception(_) => Err(Error::NoState),
      }
   }

   /// Consumes the outcome, returning its payload.
   #[inline]
   pub fn into_payload(self) -> Payload<T, E, X> {
      self.cell.into_payload()
   }
}

impl<T, E, X, P: Policy<E, X>> From<Result<T, E>> for Outcome<T, E, X, P> {
   fn from(result: Result<T, E>) -> Self {
      match result {
         Ok(value) => Self::success(value),
         Err(error) => Self::failure(error),
      }
   }
}

impl<T, E, X, P: Policy<E, X>> TryFrom<StateCell<T, E, X>> for Outcome<T, E, X, P> {
   type Error = Error;

   /// Adopts a settled cell. Empty or consumed cells are rejected with [`Error::NoState`].
   fn try_from(mut cell: StateCell<T, E, X>) -> Result<Self, Error> {
      if cell.is_empty() {
         return Err(Error::NoState);
      }
      if let Some(error) = cell.error() {
         let errno = P::is_errno(error);
         cell.set_error_is_errno(errno);
      }
      Ok(Self::from_cell(cell))
   }
}

impl<T: Clone, E: Clone, X: Clone, P> Clone for Outcome<T, E, X, P> {
   fn clone(&self) -> Self {
      Self {
         cell: self.cell.clone(),
         _policy: PhantomData,
      }
   }
}

impl<T: PartialEq, E: PartialEq, X: PartialEq, P> PartialEq for Outcome<T, E, X, P> {
   fn eq(&self, other: &Self) -> bool {
      self.cell == other.cell
   }
}

impl<T: fmt::Debug, E: fmt::Debug, X: fmt::Debug, P> fmt::Debug for Outcome<T, E, X, P> {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let mut d = f.debug_tuple("Outcome");
      if let Some(value) = self.cell.value() {
         d.field(&format_args!("value: {value:?}"));
      } else if let Some(error) = self.cell.error() {
         d.field(&format_args!("error: {error:?}"));
      } else if let Some(exception) = self.cell.exception() {
         d.field(&format_args!("exception: {exception:?}"));
      } else {
         d.field(&format_args!("<consumed>"));
      }
      d.finish()
   }
}
