// examples/batch.rs
use fibre_chantools::{drain_at_least, inspect, Channel, ChannelConfig, MemCopy, TracingSink, TypeTag};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const U64_TAG: TypeTag = TypeTag(0x08);

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::new("fibre_chantools=trace"))
    .init();

  let config = ChannelConfig::from_yaml_str("capacity: 8\nelement_size: 8\nelement_align: 8\n").unwrap();
  let ch = Arc::new(Channel::from_config(&config, Arc::new(MemCopy)).unwrap());

  println!("--- Producer fills the ring while the consumer batches ---");
  let producer = {
    let ch = Arc::clone(&ch);
    thread::spawn(move || {
      for v in 0..32u64 {
        while ch.try_send(&v.to_le_bytes()).is_err() {
          thread::sleep(Duration::from_millis(1));
        }
      }
    })
  };

  let mut received = 0;
  while received < 32 {
    inspect(&ch, U64_TAG, &TracingSink);
    match drain_at_least(&ch, 4) {
      Some(batch) => {
        let values: Vec<u64> = batch
          .iter()
          .map(|b| u64::from_le_bytes(b.try_into().unwrap()))
          .collect();
        println!("[Consumer] Drained batch of {}: {:?}", values.len(), values);
        received += values.len();
      }
      None => {
        // Pick up a short tail once the producer is finished.
        if producer.is_finished() {
          if let Some(tail) = drain_at_least(&ch, 1) {
            println!("[Consumer] Drained tail of {}", tail.len());
            received += tail.len();
          }
        }
        thread::sleep(Duration::from_millis(2));
      }
    }
  }

  producer.join().unwrap();
  println!("Received {} elements in total.", received);
}
