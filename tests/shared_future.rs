use std::convert::Infallible;
use std::fmt;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;

use poly_outcome::{
   channel, make_ready_future, Errc, Error, Future, Kind, Promise, SharedFuture,
   ThrowBadResultAccess,
};

/// An error whose `Debug` output reads the future it is stored in.
#[derive(Clone)]
struct Reentrant;

type ReentrantFuture = SharedFuture<i32, Reentrant, Infallible, ThrowBadResultAccess>;

static OBSERVED: OnceLock<ReentrantFuture> = OnceLock::new();

impl fmt::Debug for Reentrant {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let has_error = OBSERVED.get().map(|future| future.has_error());
      write!(f, "Reentrant(has_error: {has_error:?})")
   }
}

#[test]
fn test_share_invalidates_source() {
   let mut promise: Promise<String> = Promise::new();
   let mut future = promise.get_future().unwrap();

   let shared = future.share().unwrap();
   assert!(!future.valid());
   assert!(shared.valid());
   assert!(!shared.is_consuming());
   assert!(matches!(future.get(), Err(Error::NoState)));
   assert!(matches!(future.share(), Err(Error::NoState)));

   promise.set_value("x".to_string()).unwrap();
   assert_eq!(shared.get().unwrap(), "x");
}

#[test]
fn test_shared_reads_do_not_consume() {
   let mut future: Future<i32> = make_ready_future(5);
   let shared = future.share().unwrap();

   assert_eq!(*shared.get().unwrap(), 5);
   assert_eq!(*shared.get().unwrap(), 5);
   assert!(shared.has_value());
}

#[test]
fn test_shared_failure_is_repeatable() {
   let (promise, mut future): (Promise<i32>, Future<i32>) = channel();
   let shared: SharedFuture<i32> = future.share().unwrap();
   promise.set_error(Errc::NotSupported.into()).unwrap();

   for _ in 0..3 {
      assert!(matches!(shared.get(), Err(Error::System(_))));
   }
   assert_eq!(shared.get_error().unwrap().errc(), Some(Errc::NotSupported));
   assert!(matches!(shared.get_exception(), Err(Error::ErrorPresent)));
}

#[test]
fn test_concurrent_readers_see_same_payload() {
   let mut promise: Promise<String> = Promise::new();
   let shared = promise.get_future().unwrap().share().unwrap();

   let readers: Vec<_> = (0..2)
      .map(|_| {
         let shared = shared.clone();
         thread::spawn(move || shared.get().unwrap().clone())
      })
      .collect();

   thread::sleep(Duration::from_millis(10));
   promise.set_value("x".to_string()).unwrap();

   for reader in readers {
      assert_eq!(reader.join().unwrap(), "x");
   }
   // The original handle still observes the payload.
   assert_eq!(shared.get().unwrap(), "x");
}

#[test]
fn test_shared_references_are_stable() {
   let mut future: Future<Vec<u8>> = make_ready_future(vec![1, 2, 3]);
   let first = future.share().unwrap();
   let second = first.clone();

   let a = first.get().unwrap();
   let b = second.get().unwrap();
   assert!(std::ptr::eq(a, b));
}

#[test]
fn test_shared_broken_promise() {
   let mut promise: Promise<i32> = Promise::new();
   let shared = promise.get_future().unwrap().share().unwrap();
   drop(promise);

   assert!(matches!(shared.wait(), Err(Error::BrokenPromise)));
   assert!(matches!(shared.clone().get(), Err(Error::BrokenPromise)));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shared_get_async() {
   let mut promise: Promise<u32> = Promise::new();
   let shared = promise.get_future().unwrap().share().unwrap();

   let reader = {
      let shared = shared.clone();
      tokio::spawn(async move { *shared.get_async().await.unwrap() })
   };

   tokio::time::sleep(Duration::from_millis(5)).await;
   promise.set_value(21).unwrap();

   assert_eq!(reader.await.unwrap(), 21);
   assert_eq!(*shared.get_async().await.unwrap(), 21);
}

#[test]
fn test_policy_may_read_the_same_future() {
   let (promise, mut future) = channel::<i32, Reentrant, Infallible, ThrowBadResultAccess>();
   let shared = future.share().unwrap();
   assert!(OBSERVED.set(shared.clone()).is_ok());
   promise.set_error(Reentrant).unwrap();

   match shared.get() {
      Err(Error::BadResultAccess {
         wanted,
         found,
         payload,
      }) => {
         assert_eq!(wanted, Kind::Value);
         assert_eq!(found, Kind::Error);
         assert_eq!(payload.as_deref(), Some("Reentrant(has_error: Some(true))"));
      }
      other => panic!("unexpected {other:?}"),
   }
   assert!(shared.has_error());
}
