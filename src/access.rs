//! Consuming vs. shared access, and the checks every accessor runs.
//!
//! All reads in the crate go through the same small state machine:
//!
//! 1. the cell must be valid (not moved-from), else [`Error::NoState`];
//! 2. if the requested alternative is stored it is extracted;
//! 3. otherwise the [`Policy`] resolves the stored alternative into an error,
//!    or an empty cell yields [`Error::NoState`];
//! 4. in [`Consuming`] mode the cell is cleared before a failure propagates,
//!    so the error or exception counts as consumed even though it surfaced as
//!    an `Err`.

use std::sync::Arc;

use crate::cell::StateCell;
use crate::error::Error;
use crate::policy::Policy;

mod sealed {
   pub trait Sealed {}
}

/// Access mode: whether a successful read moves the payload out.
pub trait Access: sealed::Sealed + Send + Sync + 'static {
   const CONSUMING: bool;

   /// Carried as `PhantomData` by handles in this mode, so they are only
   /// `Send`/`Sync` when the payloads they can lend out are.
   type Lends<T, E, X>;
}

/// Reads move the payload out; the cell is single use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Consuming;

/// Reads leave the payload in place; any number of readers observe it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Shared;

impl sealed::Sealed for Consuming {}
impl sealed::Sealed for Shared {}

impl Access for Consuming {
   const CONSUMING: bool = true;
   type Lends<T, E, X> = ();
}

impl Access for Shared {
   const CONSUMING: bool = false;
   // `Arc<T>` is `Send` and `Sync` exactly when `T: Send + Sync`.
   type Lends<T, E, X> = (Arc<T>, Arc<E>, Arc<X>);
}

/// A validity-and-alternative check over a cell.
pub(crate) type Check<T, E, X> = fn(&StateCell<T, E, X>) -> Result<(), Error>;

/// Passes if `cell` holds a value.
pub(crate) fn check_value<T, E, X, P: Policy<E, X>>(cell: &StateCell<T, E, X>) -> Result<(), Error> {
   cell.check_validity()?;
   if cell.has_value() {
      Ok(())
   } else if let Some(error) = cell.error() {
      Err(P::value_on_error(error, cell.status()))
   } else if let Some(exception) = cell.exception() {
      Err(P::value_on_exception(exception))
   } else {
      Err(Error::NoState)
   }
}

/// Passes if `cell` holds an error.
pub(crate) fn check_error<T, E, X, P: Policy<E, X>>(cell: &StateCell<T, E, X>) -> Result<(), Error> {
   cell.check_validity()?;
   if cell.has_error() {
      Ok(())
   } else if let Some(exception) = cell.exception() {
      Err(P::error_on_exception(exception))
   } else if cell.has_value() {
      Err(P::error_on_value())
   } else {
      Err(Error::NoState)
   }
}

/// Passes if `cell` holds an exception.
pub(crate) fn check_exception<T, E, X, P: Policy<E, X>>(
   cell: &StateCell<T, E, X>,
) -> Result<(), Error> {
   cell.check_validity()?;
   if cell.has_exception() {
      Ok(())
   } else if let Some(error) = cell.error() {
      Err(P::exception_on_error(error, cell.status()))
   } else if cell.has_value() {
      Err(P::exception_on_value())
   } else {
      Err(Error::NoState)
   }
}

/// Runs `check` and, on success, `extract`.
///
/// On failure a [`Consuming`] read drops whatever payload is stored and marks
/// the cell moved-from before returning the error.
pub(crate) fn resolve<'a, M, T, E, X, R, F>(
   cell: &'a mut StateCell<T, E, X>,
   check: Check<T, E, X>,
   extract: F,
) -> Result<R, Error>
where
   M: Access,
   F: FnOnce(&'a mut StateCell<T, E, X>) -> Option<R>,
{
   if let Err(error) = check(cell) {
      if M::CONSUMING && !cell.is_empty() {
         tracing::trace!(found = %cell.status().kind(), "consuming read failed, dropping payload");
         cell.consume();
      }
      return Err(error);
   }
   extract(cell).ok_or(Error::NoState)
}
