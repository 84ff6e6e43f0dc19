#![allow(dead_code)]

use fibre_chantools::{Channel, Drained, ElementLayout};

pub const ITEMS_LOW: usize = 50;
pub const ITEMS_MEDIUM: usize = 200;
pub const ITEMS_HIGH: usize = 1000;

pub fn u64_channel(capacity: usize) -> Channel {
  Channel::with_memcopy(capacity, ElementLayout::of::<u64>()).unwrap()
}

pub fn send_u64(ch: &Channel, value: u64) {
  ch.try_send(&value.to_le_bytes()).unwrap();
}

pub fn recv_u64(ch: &Channel) -> u64 {
  let mut out = [0u8; 8];
  ch.try_recv(&mut out).unwrap();
  u64::from_le_bytes(out)
}

pub fn drained_u64s(drained: &Drained) -> Vec<u64> {
  drained
    .iter()
    .map(|b| u64::from_le_bytes(b.try_into().unwrap()))
    .collect()
}

/// `(count, send_index, receive_index, closed)` under one lock acquisition.
pub fn state_of(ch: &Channel) -> (usize, usize, usize, bool) {
  let guard = ch.acquire();
  (guard.count(), guard.send_index(), guard.receive_index(), guard.is_closed())
}
