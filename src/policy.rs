//! Compile-time strategies for reading an alternative that is not stored.
//!
//! A [`Policy<E, X>`] is a zero-sized type selected per instantiation. Every
//! accessor in this crate first validates the cell, then, when the requested
//! alternative is missing but another one is stored, asks the policy what to
//! surface. There is no runtime branching on the policy itself: each
//! instantiation has exactly one behavior baked in.
//!
//! | Policy | value requested, error/exception stored |
//! |---|---|
//! | [`AllNarrow`] | caller bug: panics (the unchecked accessors are the zero-cost path) |
//! | [`ThrowBadResultAccess`] | [`Error::BadResultAccess`] |
//! | [`ErrorCodeThrowAsSystemError`] | [`Error::System`] / rethrown [`Error::Exception`] |
//! | [`ExceptionPtrRethrow`] | rethrown [`Error::Exception`] |
//! | [`Terminate`] | aborts the process |
//!
//! Requests for the error or the exception while the *other* failure is
//! stored yield the [`Error::ExceptionPresent`] / [`Error::ErrorPresent`]
//! markers by default, and [`Error::NoError`] / [`Error::NoException`] when a
//! value is stored.
//!
//! When no policy is named, the error type picks one through
//! [`DefaultPolicy`]: error codes surface as system errors, exception pointers
//! are rethrown, and `()` terminates.

use core::fmt;
use std::io;

use crate::ecosystem::{AsErrorCode, AsExceptionPtr, Errc, ErrorCode, ExceptionPtr, SystemError};
use crate::error::Error;
use crate::status::{Kind, Status};

/// Resolution strategy for missing alternatives.
pub trait Policy<E, X> {
   /// Classifies a freshly stored error; the answer is recorded in the cell's
   /// `ERROR_IS_ERRNO` bit.
   #[inline]
   fn is_errno(_error: &E) -> bool {
      false
   }

   /// A value was requested but `error` is stored.
   fn value_on_error(error: &E, status: Status) -> Error;

   /// A value was requested but `exception` is stored.
   fn value_on_exception(exception: &X) -> Error;

   /// An error was requested but a value is stored.
   #[inline]
   fn error_on_value() -> Error {
      Error::NoError
   }

   /// An error was requested but `exception` is stored.
   #[inline]
   fn error_on_exception(_exception: &X) -> Error {
      Error::ExceptionPresent
   }

   /// An exception was requested but a value is stored.
   #[inline]
   fn exception_on_value() -> Error {
      Error::NoException
   }

   /// An exception was requested but `error` is stored.
   #[inline]
   fn exception_on_error(_error: &E, _status: Status) -> Error {
      Error::ErrorPresent
   }
}

/// Narrow contract: reading a missing alternative is a caller bug.
///
/// The zero-cost path under this policy is the `unsafe` family of unchecked
/// accessors, whose misuse is undefined behavior. The safe accessors still
/// validate, and panic on a violated precondition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AllNarrow;

#[cold]
#[track_caller]
fn narrow_violation(wanted: Kind, found: Kind) -> ! {
   panic!("narrow contract violated: {wanted} requested but {found} is stored")
}

impl<E, X> Policy<E, X> for AllNarrow {
   #[track_caller]
   fn value_on_error(_error: &E, _status: Status) -> Error {
      narrow_violation(Kind::Value, Kind::Error)
   }

   #[track_caller]
   fn value_on_exception(_exception: &X) -> Error {
      narrow_violation(Kind::Value, Kind::Exception)
   }

   #[track_caller]
   fn error_on_value() -> Error {
      narrow_violation(Kind::Error, Kind::Value)
   }

   #[track_caller]
   fn error_on_exception(_exception: &X) -> Error {
      narrow_violation(Kind::Error, Kind::Exception)
   }

   #[track_caller]
   fn exception_on_value() -> Error {
      narrow_violation(Kind::Exception, Kind::Value)
   }

   #[track_caller]
   fn exception_on_error(_error: &E, _status: Status) -> Error {
      narrow_violation(Kind::Exception, Kind::Error)
   }
}

/// Aborts the process without unwinding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Terminate;

#[cold]
fn terminate(wanted: Kind, found: Kind) -> ! {
   tracing::error!(%wanted, %found, "missing alternative under terminate policy, aborting");
   std::process::abort()
}

impl<E, X> Policy<E, X> for Terminate {
   fn value_on_error(_error: &E, _status: Status) -> Error {
      terminate(Kind::Value, Kind::Error)
   }

   fn value_on_exception(_exception: &X) -> Error {
      terminate(Kind::Value, Kind::Exception)
   }

   fn error_on_value() -> Error {
      terminate(Kind::Error, Kind::Value)
   }

   fn error_on_exception(_exception: &X) -> Error {
      terminate(Kind::Error, Kind::Exception)
   }

   fn exception_on_value() -> Error {
      terminate(Kind::Exception, Kind::Value)
   }

   fn exception_on_error(_error: &E, _status: Status) -> Error {
      terminate(Kind::Exception, Kind::Error)
   }
}

/// Surfaces every missing alternative as [`Error::BadResultAccess`], carrying
/// a rendering of whatever is stored instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ThrowBadResultAccess;

fn bad_access(wanted: Kind, found: Kind, payload: Option<&dyn fmt::Debug>) -> Error {
   Error::BadResultAccess {
      wanted,
      found,
      payload: payload.map(|payload| format!("{payload:?}")),
   }
}

impl<E: fmt::Debug, X: fmt::Debug> Policy<E, X> for ThrowBadResultAccess {
   fn value_on_error(error: &E, _status: Status) -> Error {
      bad_access(Kind::Value, Kind::Error, Some(error as &dyn fmt::Debug))
   }

   fn value_on_exception(exception: &X) -> Error {
      bad_access(Kind::Value, Kind::Exception, Some(exception as &dyn fmt::Debug))
   }

   fn error_on_value() -> Error {
      bad_access(Kind::Error, Kind::Value, None)
   }

   fn error_on_exception(exception: &X) -> Error {
      bad_access(Kind::Error, Kind::Exception, Some(exception as &dyn fmt::Debug))
   }

   fn exception_on_value() -> Error {
      bad_access(Kind::Exception, Kind::Value, None)
   }

   fn exception_on_error(error: &E, _status: Status) -> Error {
      bad_access(Kind::Exception, Kind::Error, Some(error as &dyn fmt::Debug))
   }
}

/// Surfaces a stored error code as a [`SystemError`] and rethrows a stored
/// exception verbatim.
///
/// Errno-like codes (see [`ErrorCode::is_errno`](crate::ErrorCode::is_errno))
/// are classified at construction and reported as such.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ErrorCodeThrowAsSystemError;

impl<E: AsErrorCode, X: AsExceptionPtr> Policy<E, X> for ErrorCodeThrowAsSystemError {
   #[inline]
   fn is_errno(error: &E) -> bool {
      error.error_code().is_errno()
   }

   fn value_on_error(error: &E, status: Status) -> Error {
      Error::System(SystemError::with_classification(
         error.error_code(),
         status.error_is_errno(),
      ))
   }

   fn value_on_exception(exception: &X) -> Error {
      Error::Exception(exception.exception_ptr())
   }
}

/// Rethrows both stored errors and stored exceptions as exceptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ExceptionPtrRethrow;

impl<E: AsExceptionPtr, X: AsExceptionPtr> Policy<E, X> for ExceptionPtrRethrow {
   fn value_on_error(error: &E, _status: Status) -> Error {
      Error::Exception(error.exception_ptr())
   }

   fn value_on_exception(exception: &X) -> Error {
      Error::Exception(exception.exception_ptr())
   }
}

/// The policy an error type selects when none is named.
///
/// Used as the default of the `P` parameter of [`Outcome`](crate::Outcome),
/// [`BasicFuture`](crate::BasicFuture) and [`Promise`](crate::Promise). Error
/// types without an implementation must name their policy explicitly.
pub trait DefaultPolicy {
   type Policy;
}

macro_rules! default_policy {
   ($policy:ty => $($error:ty),+ $(,)?) => {
      $(
         impl DefaultPolicy for $error {
            type Policy = $policy;
         }
      )+
   };
}

default_policy!(
   ErrorCodeThrowAsSystemError => ErrorCode, Errc, SystemError, io::Error, io::ErrorKind,
);
default_policy!(ExceptionPtrRethrow => ExceptionPtr);
default_policy!(Terminate => ());
