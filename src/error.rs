//! The single failure surface shared by cells, outcomes and futures.

use thiserror::Error;

use crate::ecosystem::{ExceptionPtr, SystemError};
use crate::status::Kind;

/// Errors surfaced by accessors, producers and waits.
///
/// Missing-state handling of every policy, double publishes and broken
/// promises all map onto this one enum, so callers see one taxonomy whatever
/// the instantiation.
#[derive(Debug, Clone, Error)]
pub enum Error {
   /// The handle has no attached state, or its payload was already consumed.
   #[error("no associated state")]
   NoState,

   /// A second publish was attempted on a settled future.
   #[error("promise already satisfied")]
   AlreadySatisfied,

   /// The future of a promise was requested twice.
   #[error("future already retrieved")]
   FutureAlreadyRetrieved,

   /// The producer was dropped without publishing.
   #[error("broken promise")]
   BrokenPromise,

   /// The requested alternative is not the stored one.
   #[error("bad result access: wanted {wanted}, found {found}")]
   BadResultAccess {
      wanted: Kind,
      found: Kind,
      /// Debug rendering of the stored error or exception, if any.
      payload: Option<String>,
   },

   /// A stored error code, surfaced as a system error.
   #[error(transparent)]
   System(#[from] SystemError),

   /// A stored exception, rethrown.
   #[error(transparent)]
   Exception(#[from] ExceptionPtr),

   /// An error was requested but an exception is stored.
   #[error("an exception is stored instead of an error")]
   ExceptionPresent,

   /// An exception was requested but an error is stored.
   #[error("an error is stored instead of an exception")]
   ErrorPresent,

   /// An error was requested but a value is stored.
   #[error("no error is stored")]
   NoError,

   /// An exception was requested but a value is stored.
   #[error("no exception is stored")]
   NoException,
}

impl Error {
   /// True for [`Error::NoState`].
   #[inline]
   pub fn is_no_state(&self) -> bool {
      matches!(self, Self::NoState)
   }

   /// The system error carried by [`Error::System`].
   #[inline]
   pub fn as_system_error(&self) -> Option<&SystemError> {
      match self {
         Self::System(error) => Some(error),
         _ => None,
      }
   }

   /// The exception carried by [`Error::Exception`].
   #[inline]
   pub fn as_exception(&self) -> Option<&ExceptionPtr> {
      match self {
         Self::Exception(exception) => Some(exception),
         _ => None,
      }
   }
}
