//! Error-code and exception-pointer types the throwing policies build on.
//!
//! The policies never hardcode a concrete error type. Instead they go through
//! two pass-through traits:
//!
//! - [`AsErrorCode`]: views an error payload as an [`ErrorCode`], which knows
//!   whether it behaves like an errno value and can be wrapped in a
//!   [`SystemError`].
//! - [`AsExceptionPtr`]: views a payload as a shareable, type-erased
//!   [`ExceptionPtr`] that can be rethrown as-is.
//!
//! Implementations are provided for this module's own types, for
//! [`std::io::Error`] and [`std::io::ErrorKind`], and for
//! [`Infallible`](core::convert::Infallible) so disabled alternatives satisfy
//! every bound.

use core::convert::Infallible;
use core::fmt;
use std::any::Any;
use std::error::Error as StdError;
use std::io;
use std::panic::{self, UnwindSafe};
use std::sync::Arc;

use thiserror::Error;

/// The domain an [`ErrorCode`] value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
   /// Portable POSIX `errno` values.
   Generic,
   /// Raw values of the operating system.
   System,
   /// A library-defined domain, identified by name.
   Custom(&'static str),
}

impl Category {
   /// Whether codes of this category are errno values on this platform.
   #[inline]
   pub const fn is_errno(self) -> bool {
      match self {
         Self::Generic => true,
         Self::System => !cfg!(windows),
         Self::Custom(_) => false,
      }
   }

   pub const fn name(self) -> &'static str {
      match self {
         Self::Generic => "generic",
         Self::System => "system",
         Self::Custom(name) => name,
      }
   }
}

impl fmt::Display for Category {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(self.name())
   }
}

/// An integer error value tagged with its [`Category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
   value: i32,
   category: Category,
}

impl ErrorCode {
   #[inline]
   pub const fn new(value: i32, category: Category) -> Self {
      Self { value, category }
   }

   /// A portable errno value.
   #[inline]
   pub const fn generic(value: i32) -> Self {
      Self::new(value, Category::Generic)
   }

   /// A raw operating system value.
   #[inline]
   pub const fn system(value: i32) -> Self {
      Self::new(value, Category::System)
   }

   #[inline]
   pub const fn value(&self) -> i32 {
      self.value
   }

   #[inline]
   pub const fn category(&self) -> Category {
      self.category
   }

   /// Whether this code behaves like an errno value.
   #[inline]
   pub const fn is_errno(&self) -> bool {
      self.category.is_errno()
   }

   /// The portable condition, if the value maps onto one.
   ///
   /// Only [`Category::Generic`] values are portable; [`Category::System`]
   /// values are host numbers and go through the OS instead.
   pub fn errc(&self) -> Option<Errc> {
      match self.category {
         Category::Generic => Errc::from_raw(self.value),
         _ => None,
      }
   }

   /// Human readable description.
   pub fn message(&self) -> String {
      if self.is_errno() {
         match self.errc() {
            Some(errc) => errc.message().to_owned(),
            None => io::Error::from_raw_os_error(self.value).to_string(),
         }
      } else {
         format!("{} error {}", self.category, self.value)
      }
   }

   /// The closest [`io::ErrorKind`].
   pub fn kind(&self) -> io::ErrorKind {
      match self.errc() {
         Some(errc) => errc.kind(),
         None if self.is_errno() => io::Error::from_raw_os_error(self.value).kind(),
         None => io::ErrorKind::Other,
      }
   }
}

impl fmt::Display for ErrorCode {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      write!(f, "{}:{}: {}", self.category, self.value, self.message())
   }
}

/// Portable error conditions, numbered as Linux `errno` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Errc {
   OperationNotPermitted = 1,
   NoSuchFileOrDirectory = 2,
   Interrupted = 4,
   IoError = 5,
   BadFileDescriptor = 9,
   ResourceUnavailableTryAgain = 11,
   NotEnoughMemory = 12,
   PermissionDenied = 13,
   DeviceOrResourceBusy = 16,
   FileExists = 17,
   InvalidArgument = 22,
   BrokenPipe = 32,
   NotSupported = 95,
   ConnectionRefused = 111,
   TimedOut = 110,
   OperationCanceled = 125,
}

impl Errc {
   const ALL: [Self; 16] = [
      Self::OperationNotPermitted,
      Self::NoSuchFileOrDirectory,
      Self::Interrupted,
      Self::IoError,
      Self::BadFileDescriptor,
      Self::ResourceUnavailableTryAgain,
      Self::NotEnoughMemory,
      Self::PermissionDenied,
      Self::DeviceOrResourceBusy,
      Self::FileExists,
      Self::InvalidArgument,
      Self::BrokenPipe,
      Self::NotSupported,
      Self::ConnectionRefused,
      Self::TimedOut,
      Self::OperationCanceled,
   ];

   pub fn from_raw(value: i32) -> Option<Self> {
      Self::ALL.into_iter().find(|errc| *errc as i32 == value)
   }

   pub const fn message(self) -> &'static str {
      match self {
         Self::OperationNotPermitted => "operation not permitted",
         Self::NoSuchFileOrDirectory => "no such file or directory",
         Self::Interrupted => "interrupted",
         Self::IoError => "io error",
         Self::BadFileDescriptor => "bad file descriptor",
         Self::ResourceUnavailableTryAgain => "resource unavailable try again",
         Self::NotEnoughMemory => "not enough memory",
         Self::PermissionDenied => "permission denied",
         Self::DeviceOrResourceBusy => "device or resource busy",
         Self::FileExists => "file exists",
         Self::InvalidArgument => "invalid argument",
         Self::BrokenPipe => "broken pipe",
         Self::NotSupported => "not supported",
         Self::ConnectionRefused => "connection refused",
         Self::TimedOut => "timed out",
         Self::OperationCanceled => "operation canceled",
      }
   }

   pub const fn kind(self) -> io::ErrorKind {
      match self {
         Self::OperationNotPermitted | Self::PermissionDenied => io::ErrorKind::PermissionDenied,
         Self::NoSuchFileOrDirectory => io::ErrorKind::NotFound,
         Self::Interrupted => io::ErrorKind::Interrupted,
         Self::ResourceUnavailableTryAgain => io::ErrorKind::WouldBlock,
         Self::NotEnoughMemory => io::ErrorKind::OutOfMemory,
         Self::FileExists => io::ErrorKind::AlreadyExists,
         Self::InvalidArgument => io::ErrorKind::InvalidInput,
         Self::BrokenPipe => io::ErrorKind::BrokenPipe,
         Self::NotSupported => io::ErrorKind::Unsupported,
         Self::ConnectionRefused => io::ErrorKind::ConnectionRefused,
         Self::TimedOut => io::ErrorKind::TimedOut,
         Self::IoError
         | Self::BadFileDescriptor
         | Self::DeviceOrResourceBusy
         | Self::OperationCanceled => io::ErrorKind::Other,
      }
   }

   fn from_kind(kind: io::ErrorKind) -> Option<Self> {
      Some(match kind {
         io::ErrorKind::PermissionDenied => Self::PermissionDenied,
         io::ErrorKind::NotFound => Self::NoSuchFileOrDirectory,
         io::ErrorKind::Interrupted => Self::Interrupted,
         io::ErrorKind::WouldBlock => Self::ResourceUnavailableTryAgain,
         io::ErrorKind::OutOfMemory => Self::NotEnoughMemory,
         io::ErrorKind::AlreadyExists => Self::FileExists,
         io::ErrorKind::InvalidInput => Self::InvalidArgument,
         io::ErrorKind::BrokenPipe => Self::BrokenPipe,
         io::ErrorKind::Unsupported => Self::NotSupported,
         io::ErrorKind::ConnectionRefused => Self::ConnectionRefused,
         io::ErrorKind::TimedOut => Self::TimedOut,
         _ => return None,
      })
   }
}

impl From<Errc> for ErrorCode {
   #[inline]
   fn from(errc: Errc) -> Self {
      Self::generic(errc as i32)
   }
}

impl From<&io::Error> for ErrorCode {
   fn from(error: &io::Error) -> Self {
      match error.raw_os_error() {
         Some(raw) => Self::system(raw),
         None => error.kind().error_code(),
      }
   }
}

impl From<io::Error> for ErrorCode {
   #[inline]
   fn from(error: io::Error) -> Self {
      Self::from(&error)
   }
}

/// A system error wrapping an [`ErrorCode`].
///
/// Errno-like codes are reported as such; everything else is a generic system
/// error carrying the code verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code}")]
pub struct SystemError {
   code: ErrorCode,
   errno: bool,
}

impl SystemError {
   /// Wraps `code`, classifying it by its category.
   #[inline]
   pub const fn new(code: ErrorCode) -> Self {
      Self {
         code,
         errno: code.is_errno(),
      }
   }

   /// Wraps `code` with a classification decided by the caller.
   #[inline]
   pub const fn with_classification(code: ErrorCode, errno: bool) -> Self {
      Self { code, errno }
   }

   #[inline]
   pub const fn code(&self) -> ErrorCode {
      self.code
   }

   /// Whether the wrapped code was classified as errno-like.
   #[inline]
   pub const fn is_errno(&self) -> bool {
      self.errno
   }

   #[inline]
   pub fn kind(&self) -> io::ErrorKind {
      self.code.kind()
   }
}

impl From<SystemError> for io::Error {
   fn from(error: SystemError) -> Self {
      if error.errno && error.code.category() == Category::System {
         io::Error::from_raw_os_error(error.code.value())
      } else {
         io::Error::new(error.kind(), error)
      }
   }
}

/// A shareable, type-erased captured exception.
#[derive(Clone)]
pub struct ExceptionPtr(Arc<dyn StdError + Send + Sync + 'static>);

impl ExceptionPtr {
   /// Captures `error`.
   pub fn new<E>(error: E) -> Self
   where
      E: StdError + Send + Sync + 'static,
   {
      Self(Arc::new(error))
   }

   /// Captures a panic payload as returned by [`std::panic::catch_unwind`].
   pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
      let message = match payload.downcast::<String>() {
         Ok(message) => *message,
         Err(payload) => match payload.downcast::<&'static str>() {
            Ok(message) => (*message).to_owned(),
            Err(_) => "unknown panic payload".to_owned(),
         },
      };
      Self::new(Panicked { message })
   }

   /// Runs `f`, capturing a panic as an exception.
   pub fn catch_unwind<T, F>(f: F) -> Result<T, Self>
   where
      F: FnOnce() -> T + UnwindSafe,
   {
      panic::catch_unwind(f).map_err(Self::from_panic)
   }

   /// The captured error.
   #[inline]
   pub fn get(&self) -> &(dyn StdError + Send + Sync + 'static) {
      &*self.0
   }

   #[inline]
   pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
      self.0.downcast_ref::<E>()
   }

   /// True if both pointers refer to the same captured exception.
   #[inline]
   pub fn ptr_eq(&self, other: &Self) -> bool {
      Arc::ptr_eq(&self.0, &other.0)
   }
}

impl fmt::Debug for ExceptionPtr {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.debug_tuple("ExceptionPtr").field(&self.0).finish()
   }
}

impl fmt::Display for ExceptionPtr {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      fmt::Display::fmt(&*self.0, f)
   }
}

impl StdError for ExceptionPtr {
   fn source(&self) -> Option<&(dyn StdError + 'static)> {
      self.0.source()
   }
}

impl PartialEq for ExceptionPtr {
   /// Identity comparison, like comparing two captured exception pointers.
   fn eq(&self, other: &Self) -> bool {
      self.ptr_eq(other)
   }
}

impl From<Arc<dyn StdError + Send + Sync + 'static>> for ExceptionPtr {
   #[inline]
   fn from(error: Arc<dyn StdError + Send + Sync + 'static>) -> Self {
      Self(error)
   }
}

impl From<Box<dyn StdError + Send + Sync + 'static>> for ExceptionPtr {
   #[inline]
   fn from(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
      Self(Arc::from(error))
   }
}

/// A panic captured by [`ExceptionPtr::catch_unwind`].
#[derive(Debug, Clone, Error)]
#[error("panicked: {message}")]
pub struct Panicked {
   message: String,
}

impl Panicked {
   pub fn message(&self) -> &str {
      &self.message
   }
}

/// Views an error payload as an [`ErrorCode`].
pub trait AsErrorCode {
   fn error_code(&self) -> ErrorCode;
}

impl AsErrorCode for ErrorCode {
   #[inline]
   fn error_code(&self) -> ErrorCode {
      *self
   }
}

impl AsErrorCode for Errc {
   #[inline]
   fn error_code(&self) -> ErrorCode {
      ErrorCode::from(*self)
   }
}

impl AsErrorCode for io::Error {
   #[inline]
   fn error_code(&self) -> ErrorCode {
      ErrorCode::from(self)
   }
}

impl AsErrorCode for io::ErrorKind {
   fn error_code(&self) -> ErrorCode {
      Errc::from_kind(*self).unwrap_or(Errc::IoError).into()
   }
}

impl AsErrorCode for SystemError {
   #[inline]
   fn error_code(&self) -> ErrorCode {
      self.code
   }
}

impl AsErrorCode for Infallible {
   fn error_code(&self) -> ErrorCode {
      match *self {}
   }
}

/// Views a payload as a rethrowable [`ExceptionPtr`].
pub trait AsExceptionPtr {
   fn exception_ptr(&self) -> ExceptionPtr;
}

impl AsExceptionPtr for ExceptionPtr {
   #[inline]
   fn exception_ptr(&self) -> ExceptionPtr {
      self.clone()
   }
}

impl AsExceptionPtr for ErrorCode {
   #[inline]
   fn exception_ptr(&self) -> ExceptionPtr {
      ExceptionPtr::new(SystemError::new(*self))
   }
}

impl AsExceptionPtr for Errc {
   #[inline]
   fn exception_ptr(&self) -> ExceptionPtr {
      ErrorCode::from(*self).exception_ptr()
   }
}

impl AsExceptionPtr for Infallible {
   fn exception_ptr(&self) -> ExceptionPtr {
      match *self {}
   }
}
