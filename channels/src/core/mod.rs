// src/core/mod.rs

//! The circular-buffer channel core.
//!
//! A `Channel` owns a fixed byte buffer of `capacity * element_size` bytes, the send
//! and receive indices into it, the element count, the closed flag and the two wait
//! queues. A single `parking_lot::Mutex` guards all of it; every reader and writer
//! goes through a `ChannelGuard` obtained from [`Channel::acquire`], and the lock is
//! released when that guard drops.
//!
//! ### Invariants (hold whenever the lock is free):
//!
//! 1.  `count <= capacity`.
//! 2.  `send_index` and `receive_index` lie in `[0, capacity)`, and are both `0`
//!     for an unbuffered channel.
//! 3.  `(receive_index + count) % capacity == send_index` for a buffered channel.
//!     The logical content is the `count` slots starting at `receive_index`,
//!     wrapping at `capacity`.

mod algorithm;

pub use algorithm::{ElementAlgorithm, MemCopy};

use crate::config::ChannelConfig;
use crate::error::{CloseError, Result, TryRecvError, TrySendError};
use crate::internal::waiter::{WaitQueue, Waiter};
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_CHANNEL_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique channel identity, for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u64);

impl ChannelId {
  fn next() -> Self {
    ChannelId(NEXT_CHANNEL_ID.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_u64(&self) -> u64 {
    self.0
  }
}

impl fmt::Display for ChannelId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Size and alignment of the stored element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementLayout {
  pub size: usize,
  pub align: usize,
}

impl ElementLayout {
  pub fn new(size: usize, align: usize) -> Self {
    Self { size, align }
  }

  /// Layout of a statically known type.
  pub fn of<T>() -> Self {
    Self {
      size: std::mem::size_of::<T>(),
      align: std::mem::align_of::<T>(),
    }
  }
}

/// Lock-protected state of a channel.
pub(crate) struct ChannelState {
  /// `None` for unbuffered channels.
  pub(crate) buffer: Option<Box<[u8]>>,
  pub(crate) count: usize,
  pub(crate) send_index: usize,
  pub(crate) receive_index: usize,
  pub(crate) closed: bool,
  pub(crate) send_waiters: WaitQueue,
  pub(crate) receive_waiters: WaitQueue,
}

/// A bounded circular-buffer queue of fixed-size elements.
pub struct Channel {
  id: ChannelId,
  capacity: usize,
  layout: ElementLayout,
  algorithm: Arc<dyn ElementAlgorithm>,
  state: Mutex<ChannelState>,
}

impl fmt::Debug for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Channel")
      .field("id", &self.id)
      .field("capacity", &self.capacity)
      .field("layout", &self.layout)
      .finish_non_exhaustive()
  }
}

impl Channel {
  /// Creates a channel with `capacity` slots of `layout`-shaped elements.
  ///
  /// A capacity of `0` creates an unbuffered channel with no backing storage.
  pub fn new(
    capacity: usize,
    layout: ElementLayout,
    algorithm: Arc<dyn ElementAlgorithm>,
  ) -> Result<Self> {
    let config = ChannelConfig::new(capacity, layout.size).with_element_align(layout.align);
    Self::from_config(&config, algorithm)
  }

  /// Creates a channel whose elements are copied with [`MemCopy`].
  pub fn with_memcopy(capacity: usize, layout: ElementLayout) -> Result<Self> {
    Self::new(capacity, layout, Arc::new(MemCopy))
  }

  pub fn from_config(config: &ChannelConfig, algorithm: Arc<dyn ElementAlgorithm>) -> Result<Self> {
    let buffer_len = config.validate()?;
    let buffer = (config.capacity > 0).then(|| vec![0u8; buffer_len].into_boxed_slice());
    let channel = Channel {
      id: ChannelId::next(),
      capacity: config.capacity,
      layout: ElementLayout::new(config.element_size, config.element_align),
      algorithm,
      state: Mutex::new(ChannelState {
        buffer,
        count: 0,
        send_index: 0,
        receive_index: 0,
        closed: false,
        send_waiters: WaitQueue::new(),
        receive_waiters: WaitQueue::new(),
      }),
    };
    tracing::debug!(channel = %channel.id, capacity = channel.capacity, element_size = config.element_size, "channel created");
    Ok(channel)
  }

  pub fn id(&self) -> ChannelId {
    self.id
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn element_size(&self) -> usize {
    self.layout.size
  }

  pub fn element_align(&self) -> usize {
    self.layout.align
  }

  pub fn layout(&self) -> ElementLayout {
    self.layout
  }

  pub fn algorithm(&self) -> &dyn ElementAlgorithm {
    &*self.algorithm
  }

  /// Locks the channel. The lock is held until the returned guard is dropped.
  pub fn acquire(&self) -> ChannelGuard<'_> {
    ChannelGuard {
      channel: self,
      state: self.state.lock(),
    }
  }

  /// Buffers one element without blocking.
  ///
  /// `elem` must be exactly `element_size` bytes. Waiting receivers are not
  /// consulted; handing elements to blocked tasks is the scheduler's job.
  pub fn try_send<'a>(&self, elem: &'a [u8]) -> std::result::Result<(), TrySendError<&'a [u8]>> {
    assert_eq!(elem.len(), self.layout.size, "element length does not match the channel's element size");
    let mut guard = self.acquire();
    if guard.state.closed {
      return Err(TrySendError::Closed(elem));
    }
    if guard.state.count >= self.capacity {
      return Err(TrySendError::Full(elem));
    }

    let index = guard.state.send_index;
    let size = self.layout.size;
    self.algorithm.copy(size, guard.slot_mut(index), elem);
    guard.state.send_index = (index + 1) % self.capacity;
    guard.state.count += 1;
    Ok(())
  }

  /// Takes the oldest buffered element into `out` without blocking.
  pub fn try_recv(&self, out: &mut [u8]) -> std::result::Result<(), TryRecvError> {
    assert_eq!(out.len(), self.layout.size, "output length does not match the channel's element size");
    let mut guard = self.acquire();
    if guard.state.count == 0 {
      return Err(if guard.state.closed {
        TryRecvError::Closed
      } else {
        TryRecvError::Empty
      });
    }

    let index = guard.state.receive_index;
    self.algorithm.copy(self.layout.size, out, guard.slot(index));
    guard.state.receive_index = (index + 1) % self.capacity;
    guard.state.count -= 1;
    Ok(())
  }

  /// Marks the channel closed and hands back every queued waiter so the caller can
  /// resume those tasks once the lock is released.
  ///
  /// Buffered elements stay readable after closing.
  pub fn close(&self) -> std::result::Result<Vec<Waiter>, CloseError> {
    let mut guard = self.acquire();
    if guard.state.closed {
      return Err(CloseError);
    }
    guard.state.closed = true;
    let mut waiters = guard.state.receive_waiters.take_all();
    waiters.extend(guard.state.send_waiters.take_all());
    tracing::debug!(channel = %self.id, released = waiters.len(), "channel closed");
    Ok(waiters)
  }

  pub fn is_closed(&self) -> bool {
    self.acquire().is_closed()
  }

  /// Snapshot of the element count. Stale as soon as it returns.
  pub fn len(&self) -> usize {
    self.acquire().count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Exclusive access to a channel's state. Dropping it releases the lock.
pub struct ChannelGuard<'a> {
  channel: &'a Channel,
  pub(crate) state: MutexGuard<'a, ChannelState>,
}

impl<'a> ChannelGuard<'a> {
  pub fn channel(&self) -> &'a Channel {
    self.channel
  }

  pub fn capacity(&self) -> usize {
    self.channel.capacity
  }

  pub fn element_size(&self) -> usize {
    self.channel.layout.size
  }

  pub fn count(&self) -> usize {
    self.state.count
  }

  pub fn send_index(&self) -> usize {
    self.state.send_index
  }

  pub fn receive_index(&self) -> usize {
    self.state.receive_index
  }

  pub fn is_closed(&self) -> bool {
    self.state.closed
  }

  /// Bytes of slot `index`.
  ///
  /// # Panics
  /// If the channel is unbuffered or `index >= capacity`.
  pub fn slot(&self, index: usize) -> &[u8] {
    let range = self.slot_range(index);
    match self.state.buffer.as_deref() {
      Some(buffer) => &buffer[range],
      None => panic!("unbuffered channel has no slots"),
    }
  }

  /// Mutable bytes of slot `index`. Same panics as [`ChannelGuard::slot`].
  pub fn slot_mut(&mut self, index: usize) -> &mut [u8] {
    let range = self.slot_range(index);
    match self.state.buffer.as_deref_mut() {
      Some(buffer) => &mut buffer[range],
      None => panic!("unbuffered channel has no slots"),
    }
  }

  fn slot_range(&self, index: usize) -> std::ops::Range<usize> {
    assert!(
      index < self.channel.capacity,
      "slot index {} out of bounds for capacity {}",
      index,
      self.channel.capacity
    );
    let size = self.channel.layout.size;
    index * size..(index + 1) * size
  }

  pub fn send_waiters(&mut self) -> &mut WaitQueue {
    &mut self.state.send_waiters
  }

  pub fn receive_waiters(&mut self) -> &mut WaitQueue {
    &mut self.state.receive_waiters
  }
}
