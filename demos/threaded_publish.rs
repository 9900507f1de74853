use std::thread;
use std::time::{Duration, Instant};

use poly_outcome::{FutureStatus, Promise};

fn main() {
   let mut promise: Promise<u64> = Promise::new();
   let mut future = promise.get_future().unwrap();

   let producer = thread::spawn(move || {
      println!("Producer computing...");
      // Simulate work
      thread::sleep(Duration::from_millis(50));
      promise.set_value(7).unwrap();
      println!("Producer published");
   });

   let status = future.wait_for(Duration::from_millis(5)).unwrap();
   println!("After 5ms: {:?}", status);

   let started = Instant::now();
   let value = future.get().unwrap();
   println!("Consumer got {} after {:?}", value, started.elapsed());
   assert_eq!(value, 7);
   assert_eq!(future.wait_for(Duration::ZERO).unwrap(), FutureStatus::Ready);

   producer.join().unwrap();
}
