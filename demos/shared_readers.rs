use poly_outcome::Promise;
use tokio::time::{sleep, Duration};

#[tokio::main]
async fn main() {
   let mut promise: Promise<String> = Promise::new();
   let shared = promise.get_future().unwrap().share().unwrap();

   let tasks: Vec<_> = (0..5)
      .map(|i| {
         let shared = shared.clone();
         tokio::spawn(async move {
            let config = shared.get_async().await.unwrap();
            println!("Reader {} sees: {}", i, config);
            config.len()
         })
      })
      .collect();

   sleep(Duration::from_millis(20)).await;
   promise.set_value("production".to_string()).unwrap();

   for t in tasks {
      assert_eq!(t.await.unwrap(), "production".len());
   }

   // Every holder observes the same payload
   assert_eq!(shared.get().unwrap(), "production");
   println!("Final config: {}", shared.get().unwrap());
}
