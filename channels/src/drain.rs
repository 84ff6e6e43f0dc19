// src/drain.rs

//! Conditional, all-or-nothing draining of a channel's buffer.
//!
//! [`drain_at_least`] takes every buffered element at once, but only when at least
//! `min_count` are present. The lock is held from the count check through the copy
//! and the index reset, so the drained elements are exactly those present when the
//! lock was taken and no send or receive can slip in between.

use crate::core::Channel;

/// Supplies destination buffers for drained elements.
pub trait DrainAllocator {
  /// Returns a buffer of exactly `len` bytes.
  fn allocate(&self, len: usize) -> Vec<u8>;
}

/// Allocates destination buffers on the heap.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapAllocator;

impl DrainAllocator for HeapAllocator {
  fn allocate(&self, len: usize) -> Vec<u8> {
    vec![0u8; len]
  }
}

/// Elements removed from a channel, oldest first, packed back to back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drained {
  bytes: Vec<u8>,
  element_size: usize,
  len: usize,
}

impl Drained {
  /// Number of elements.
  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn element_size(&self) -> usize {
    self.element_size
  }

  pub fn get(&self, index: usize) -> Option<&[u8]> {
    (index < self.len).then(|| &self.bytes[index * self.element_size..(index + 1) * self.element_size])
  }

  /// Iterates the elements in enqueue order. Works for zero-sized elements too.
  pub fn iter(&self) -> impl ExactSizeIterator<Item = &[u8]> + '_ {
    let size = self.element_size;
    (0..self.len).map(move |i| &self.bytes[i * size..(i + 1) * size])
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.bytes
  }

  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }
}

/// Drains the whole buffer if it holds at least `min_count` elements.
///
/// See [`drain_at_least_with`].
pub fn drain_at_least(channel: &Channel, min_count: usize) -> Option<Drained> {
  drain_at_least_with(channel, min_count, &HeapAllocator)
}

/// Drains the whole buffer if it holds at least `min_count` elements, taking the
/// destination buffer from `allocator`.
///
/// Returns `None` without allocating or mutating anything when fewer than
/// `min_count` elements are buffered. `min_count` is only an admission threshold:
/// a successful drain always takes every element and resets both indices and the
/// count to zero. Never blocks on producers.
///
/// An unbuffered channel always yields `None`. The destination buffer is still
/// requested from `allocator` once the threshold passes, and then discarded.
pub fn drain_at_least_with(
  channel: &Channel,
  min_count: usize,
  allocator: &dyn DrainAllocator,
) -> Option<Drained> {
  let mut guard = channel.acquire();

  let observed = guard.count();
  tracing::trace!(channel = %channel.id(), min_count, count = observed, "{} <= {}?", min_count, observed);
  if observed < min_count {
    return None;
  }

  let element_size = guard.element_size();
  let mut bytes = allocator.allocate(observed * element_size);

  let capacity = guard.capacity();
  if capacity < 1 {
    // FIXME: the admission check passed but nothing is returned. Unreachable while
    // unbuffered channels keep `count == 0`; left as is pending a decision on what an
    // unbuffered drain should yield.
    tracing::debug!(channel = %channel.id(), "Cannot peek on an unbuffered channel");
    return None;
  }

  let receive_index = guard.receive_index();
  tracing::trace!(
    channel = %channel.id(),
    recv = receive_index,
    send = guard.send_index(),
    count = observed,
    capacity,
    "draining"
  );

  // Oldest run: from receive_index up to the end of the buffer (or the last element).
  // Wrapped run: from slot 0 for whatever remains.
  let first_run = observed.min(capacity - receive_index);
  let slots = (receive_index..receive_index + first_run).chain(0..observed - first_run);
  let algorithm = channel.algorithm();
  for (j, slot) in slots.enumerate() {
    let dst = &mut bytes[j * element_size..(j + 1) * element_size];
    algorithm.copy(element_size, dst, guard.slot(slot));
  }

  guard.state.receive_index = 0;
  guard.state.send_index = 0;
  guard.state.count = 0;
  drop(guard);

  Some(Drained {
    bytes,
    element_size,
    len: observed,
  })
}
