use std::any::TypeId;
use std::convert::Infallible;
use std::env;
use std::io;
use std::process::{Command, Stdio};

use poly_outcome::{
   AllNarrow, Category, Checked, Errc, Error, ErrorCode, ErrorCodeThrowAsSystemError, ExceptionPtr,
   ExceptionPtrRethrow, Fallible, Kind, Outcome, Panicked, Terminate, ThrowBadResultAccess,
   Unchecked,
};

fn policy_id<T, E, X, P: 'static>(_: &Outcome<T, E, X, P>) -> TypeId {
   TypeId::of::<P>()
}

#[derive(Debug, Clone, PartialEq)]
struct ParseError(&'static str);

#[test]
fn test_success_reads() {
   let mut outcome: Outcome<i32> = Outcome::success(42);
   assert!(outcome.has_value());
   assert!(!outcome.has_failure());
   assert_eq!(*outcome.value().unwrap(), 42);

   *outcome.value_mut().unwrap() += 1;
   assert_eq!(outcome.value().ok(), Some(&43));
   assert_eq!(outcome.into_value().unwrap(), 43);
}

#[test]
fn test_take_value_consumes() {
   let mut outcome: Outcome<String> = Outcome::success("x".to_string());
   assert_eq!(outcome.take_value().unwrap(), "x");
   assert!(outcome.is_consumed());
   assert!(matches!(outcome.value(), Err(Error::NoState)));
   assert!(matches!(outcome.take_value(), Err(Error::NoState)));
   assert!(matches!(outcome.error(), Err(Error::NoState)));
}

#[test]
fn test_errno_error_surfaces_as_system_error() {
   let outcome: Outcome<i32> = Outcome::failure(Errc::TimedOut.into());
   assert!(outcome.status().error_is_errno());

   let error = outcome.value().unwrap_err();
   let system = error.as_system_error().expect("system error");
   assert!(system.is_errno());
   assert_eq!(system.code(), ErrorCode::generic(Errc::TimedOut as i32));
   assert_eq!(system.kind(), io::ErrorKind::TimedOut);
}

#[test]
fn test_custom_category_is_not_errno() {
   let code = ErrorCode::new(7, Category::Custom("app"));
   let outcome: Outcome<i32> = Outcome::failure(code);
   assert!(!outcome.status().error_is_errno());

   match outcome.value() {
      Err(Error::System(system)) => {
         assert!(!system.is_errno());
         assert_eq!(system.code(), code);
      }
      other => panic!("unexpected {other:?}"),
   }
}

#[test]
fn test_consuming_failure_clears_cell() {
   let mut outcome: Outcome<i32> = Outcome::failure(Errc::InvalidArgument.into());
   assert!(matches!(outcome.take_value(), Err(Error::System(_))));
   assert!(outcome.is_consumed());
   assert!(!outcome.has_error());
   assert!(matches!(outcome.take_value(), Err(Error::NoState)));
}

#[test]
fn test_shared_failure_keeps_cell() {
   let mut outcome: Outcome<i32> = Outcome::failure(Errc::InvalidArgument.into());
   assert!(outcome.value_mut().is_err());
   assert!(outcome.value().is_err());
   assert!(outcome.has_error());
   assert_eq!(outcome.error().unwrap().errc(), Some(Errc::InvalidArgument));
}

#[test]
fn test_exception_is_rethrown() {
   let exception = ExceptionPtr::new(io::Error::new(io::ErrorKind::Other, "disk on fire"));
   let outcome: Outcome<i32> = Outcome::exceptional(exception.clone());

   match outcome.value() {
      Err(Error::Exception(rethrown)) => assert!(rethrown.ptr_eq(&exception)),
      other => panic!("unexpected {other:?}"),
   }
   assert!(matches!(outcome.error(), Err(Error::ExceptionPresent)));
   assert!(outcome.exception().unwrap().ptr_eq(&exception));
}

#[test]
fn test_error_on_value_sentinels() {
   let outcome: Outcome<i32> = Outcome::success(1);
   assert!(matches!(outcome.error(), Err(Error::NoError)));
   assert!(matches!(outcome.exception(), Err(Error::NoException)));

   let outcome: Outcome<i32> = Outcome::failure(Errc::IoError.into());
   assert!(matches!(outcome.exception(), Err(Error::ErrorPresent)));
}

#[test]
fn test_bad_result_access_policy() {
   let outcome: Outcome<i32, ParseError, Infallible, ThrowBadResultAccess> =
      Outcome::failure(ParseError("eof"));

   match outcome.value() {
      Err(Error::BadResultAccess {
         wanted,
         found,
         payload,
      }) => {
         assert_eq!(wanted, Kind::Value);
         assert_eq!(found, Kind::Error);
         assert_eq!(payload.as_deref(), Some("ParseError(\"eof\")"));
      }
      other => panic!("unexpected {other:?}"),
   }

   let outcome: Outcome<i32, ParseError, Infallible, ThrowBadResultAccess> = Outcome::success(1);
   assert!(matches!(
      outcome.error(),
      Err(Error::BadResultAccess {
         wanted: Kind::Error,
         found: Kind::Value,
         payload: None,
      })
   ));
}

#[test]
#[should_panic(expected = "narrow contract violated")]
fn test_all_narrow_panics_on_missing_value() {
   let outcome: Outcome<i32, ParseError, Infallible, AllNarrow> =
      Outcome::failure(ParseError("nope"));
   let _ = outcome.value();
}

#[test]
fn test_all_narrow_unchecked_access() {
   let outcome: Outcome<i32, ParseError, Infallible, AllNarrow> = Outcome::success(11);
   assert!(outcome.has_value());
   // SAFETY: `has_value` was checked above.
   assert_eq!(unsafe { *outcome.value_unchecked() }, 11);
}

#[test]
fn test_exception_ptr_rethrow_policy() {
   let outcome: Outcome<i32, ErrorCode, ExceptionPtr, ExceptionPtrRethrow> =
      Outcome::failure(Errc::PermissionDenied.into());

   let exception = match outcome.value() {
      Err(Error::Exception(exception)) => exception,
      other => panic!("unexpected {other:?}"),
   };
   let system = exception
      .downcast_ref::<poly_outcome::SystemError>()
      .expect("wrapped system error");
   assert_eq!(system.code().errc(), Some(Errc::PermissionDenied));
}

#[test]
fn test_from_result_and_into_result() {
   let outcome: Fallible<u8> = Ok::<_, ErrorCode>(3).into();
   assert_eq!(outcome.into_result().unwrap(), Ok(3));

   let outcome: Fallible<u8> = Err(ErrorCode::from(Errc::BrokenPipe)).into();
   assert!(outcome.status().error_is_errno());
   let result = outcome.into_result().unwrap();
   assert_eq!(result.unwrap_err().errc(), Some(Errc::BrokenPipe));

   let outcome: Outcome<u8> = Outcome::exceptional(ExceptionPtr::from_panic(Box::new("lost")));
   assert!(matches!(outcome.into_result(), Err(Error::Exception(_))));
}

#[test]
fn test_with_policy_rebinds() {
   let outcome: Outcome<i32, ParseError, Infallible, AllNarrow> =
      Outcome::failure(ParseError("x"));
   let outcome = outcome.with_policy::<ThrowBadResultAccess>();
   assert!(matches!(outcome.value(), Err(Error::BadResultAccess { .. })));
}

#[test]
fn test_io_error_adapters() {
   let code = ErrorCode::from(io::Error::from(io::ErrorKind::NotFound));
   assert_eq!(code.errc(), Some(Errc::NoSuchFileOrDirectory));
   assert!(code.is_errno());

   let outcome: Outcome<(), io::ErrorKind, Infallible> = Outcome::failure(io::ErrorKind::NotFound);
   let error: io::Error = match outcome.value() {
      Err(Error::System(system)) => system.into(),
      other => panic!("unexpected {other:?}"),
   };
   assert_eq!(error.kind(), io::ErrorKind::NotFound);
}

#[test]
fn test_catch_unwind_captures_panic() {
   let caught = ExceptionPtr::catch_unwind(|| -> i32 { panic!("worker failed") });
   let exception = caught.unwrap_err();
   let panicked = exception.downcast_ref::<Panicked>().expect("panic payload");
   assert_eq!(panicked.message(), "worker failed");

   let outcome: Outcome<i32> = Outcome::exceptional(exception);
   assert!(outcome.has_exception());
}

#[test]
fn test_clone_and_eq() {
   let outcome: Outcome<i32> = Outcome::failure(Errc::Interrupted.into());
   let copy = outcome.clone();
   assert_eq!(copy, outcome);
   assert_eq!(copy.status(), outcome.status());
   assert_ne!(copy, Outcome::success(0));
}

#[test]
fn test_default_policy_follows_error_type() {
   let code: Outcome<i32> = Outcome::success(1);
   assert_eq!(policy_id(&code), TypeId::of::<ErrorCodeThrowAsSystemError>());

   let kind: Outcome<i32, io::ErrorKind> = Outcome::success(1);
   assert_eq!(policy_id(&kind), TypeId::of::<ErrorCodeThrowAsSystemError>());

   let exception = ExceptionPtr::from_panic(Box::new("lost"));
   let outcome: Outcome<i32, ExceptionPtr> = Outcome::failure(exception.clone());
   assert_eq!(policy_id(&outcome), TypeId::of::<ExceptionPtrRethrow>());
   match outcome.value() {
      Err(Error::Exception(rethrown)) => assert!(rethrown.ptr_eq(&exception)),
      other => panic!("unexpected {other:?}"),
   }

   let unit: Outcome<i32, ()> = Outcome::success(2);
   assert_eq!(policy_id(&unit), TypeId::of::<Terminate>());
   assert_eq!(*unit.value().unwrap(), 2);
}

#[test]
fn test_checked_and_unchecked_aliases() {
   let checked: Checked<i32, ParseError, Infallible> = Outcome::failure(ParseError("eof"));
   assert_eq!(policy_id(&checked), TypeId::of::<ThrowBadResultAccess>());
   assert!(matches!(checked.value(), Err(Error::BadResultAccess { .. })));

   let unchecked: Unchecked<i32, ParseError, Infallible> = Outcome::success(8);
   assert_eq!(policy_id(&unchecked), TypeId::of::<AllNarrow>());
   assert!(unchecked.has_value());
   // SAFETY: `has_value` was checked above.
   assert_eq!(unsafe { *unchecked.value_unchecked() }, 8);
}

#[test]
fn test_errc_only_for_generic_codes() {
   assert_eq!(
      ErrorCode::generic(11).errc(),
      Some(Errc::ResourceUnavailableTryAgain)
   );

   let system = ErrorCode::system(11);
   assert_eq!(system.errc(), None);
   #[cfg(unix)]
   {
      let os = io::Error::from_raw_os_error(11);
      assert_eq!(system.kind(), os.kind());
      assert_eq!(system.message(), os.to_string());
   }
}

#[test]
fn test_terminate_aborts_process() {
   const CHILD: &str = "POLY_OUTCOME_TERMINATE_CHILD";

   if env::var_os(CHILD).is_some() {
      let outcome: Outcome<i32, ErrorCode, ExceptionPtr, Terminate> =
         Outcome::failure(Errc::IoError.into());
      let _ = outcome.value();
      unreachable!("terminate returned");
   }

   let status = Command::new(env::current_exe().unwrap())
      .args(["test_terminate_aborts_process", "--exact", "--test-threads=1"])
      .env(CHILD, "1")
      .stdout(Stdio::null())
      .stderr(Stdio::null())
      .status()
      .unwrap();
   assert!(!status.success());
   #[cfg(unix)]
   {
      use std::os::unix::process::ExitStatusExt;
      assert_eq!(status.signal(), Some(6));
   }
}
