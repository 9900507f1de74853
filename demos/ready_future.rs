use poly_outcome::{make_errored_future, make_ready_future, Errc, Error, Future, Outcome};

fn main() {
   let mut ready: Future<u32> = make_ready_future(42);
   println!("Ready future holds: {}", ready.get().unwrap());

   // The payload was moved out by the first read
   match ready.get() {
      Err(Error::NoState) => println!("Second read: no associated state"),
      other => panic!("Unexpected second read: {:?}", other),
   }

   let mut failed: Future<u32> = make_errored_future(Errc::TimedOut.into());
   match failed.get() {
      Err(Error::System(error)) => {
         println!("Errored future: {} (errno: {})", error, error.is_errno());
         assert!(error.is_errno());
      }
      other => panic!("Expected a system error, got {:?}", other),
   }

   let outcome: Outcome<&str> = Outcome::success("settled");
   let future: Future<&str> = outcome.into();
   assert_eq!(future.into_value().unwrap(), "settled");
}
