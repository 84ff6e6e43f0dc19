mod common;
use common::*;

use fibre_chantools::{drain_at_least, inspect, Channel, Report, TypeTag};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// A consistent snapshot of a buffered channel always satisfies the ring invariant.
fn assert_consistent(report: &Report) {
  let idx = report.indices.expect("buffered channel reports indices");
  assert!(report.count <= report.capacity, "{report}");
  assert_eq!(
    (idx.receive_index + report.count) % report.capacity,
    idx.send_index,
    "torn snapshot: {report}"
  );
}

#[test]
fn concurrent_inspect_and_drain_see_sequential_states() {
  let ch = Arc::new(u64_channel(16));
  let done = Arc::new(AtomicBool::new(false));
  let sent = Arc::new(AtomicU64::new(0));
  let taken = Arc::new(AtomicU64::new(0));
  let barrier = Arc::new(Barrier::new(5));
  let mut handles = Vec::new();

  // Producer: sends 1..=ITEMS_HIGH, retrying while full.
  {
    let (ch, done, sent, barrier) = (ch.clone(), done.clone(), sent.clone(), barrier.clone());
    handles.push(thread::spawn(move || {
      barrier.wait();
      let mut next = 1u64;
      while next <= ITEMS_HIGH as u64 {
        if ch.try_send(&next.to_le_bytes()).is_ok() {
          sent.fetch_add(next, Ordering::SeqCst);
          next += 1;
        } else {
          thread::yield_now();
        }
      }
      done.store(true, Ordering::SeqCst);
    }));
  }

  // Drainers: every batch must be strictly increasing (enqueue order).
  for min in [1usize, 4] {
    let (ch, done, taken, barrier) = (ch.clone(), done.clone(), taken.clone(), barrier.clone());
    handles.push(thread::spawn(move || {
      barrier.wait();
      loop {
        let finished = done.load(Ordering::SeqCst);
        if let Some(batch) = drain_at_least(&ch, min) {
          let values = drained_u64s(&batch);
          assert!(values.windows(2).all(|w| w[0] < w[1]), "out of order: {values:?}");
          taken.fetch_add(values.iter().sum::<u64>(), Ordering::SeqCst);
        }
        if finished && ch.is_empty() {
          break;
        }
        thread::yield_now();
      }
    }));
  }

  // Inspectors.
  for tag in [1u32, 2] {
    let (ch, done, barrier) = (ch.clone(), done.clone(), barrier.clone());
    handles.push(thread::spawn(move || {
      barrier.wait();
      let sink = |report: &Report| assert_consistent(report);
      while !done.load(Ordering::SeqCst) {
        let report = inspect(&ch, TypeTag(tag), &sink);
        assert_consistent(&report);
      }
    }));
  }

  for h in handles {
    h.join().unwrap();
  }

  // Anything the threshold-4 drainer left behind is picked up here.
  if let Some(rest) = drain_at_least(&ch, 0) {
    taken.fetch_add(drained_u64s(&rest).iter().sum::<u64>(), Ordering::SeqCst);
  }
  let expected = (ITEMS_HIGH as u64) * (ITEMS_HIGH as u64 + 1) / 2;
  assert_eq!(sent.load(Ordering::SeqCst), expected);
  assert_eq!(taken.load(Ordering::SeqCst), expected);
}

#[test]
fn distinct_channels_drain_in_parallel() {
  let channels: Vec<Arc<Channel>> = (0..4).map(|_| Arc::new(u64_channel(ITEMS_MEDIUM))).collect();
  let handles: Vec<_> = channels
    .iter()
    .cloned()
    .enumerate()
    .map(|(i, ch)| {
      thread::spawn(move || {
        let base = (i * ITEMS_MEDIUM) as u64;
        for v in 0..ITEMS_MEDIUM as u64 {
          send_u64(&ch, base + v);
        }
        let batch = drain_at_least(&ch, ITEMS_MEDIUM).unwrap();
        assert_eq!(drained_u64s(&batch), (base..base + ITEMS_MEDIUM as u64).collect::<Vec<_>>());
      })
    })
    .collect();
  for h in handles {
    h.join().unwrap();
  }
  assert!(channels.iter().all(|ch| ch.is_empty()));
}
