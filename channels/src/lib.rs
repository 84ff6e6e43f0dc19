//! Lock-protected circular-buffer channel core.
//!
//! A [`Channel`] is a bounded queue of fixed-size elements stored in a ring buffer
//! and guarded by one mutex. On top of it this crate provides two operations that
//! only ever see a consistent channel state:
//!
//! - [`inspect`]: a read-only snapshot of the buffer shape and indices, delivered
//!   to an injected [`ReportSink`].
//! - [`drain_at_least`]: atomically removes every buffered element, provided at
//!   least a minimum number are present.
//!
//! ```
//! use fibre_chantools::{drain_at_least, Channel, ElementLayout};
//!
//! let ch = Channel::with_memcopy(4, ElementLayout::of::<u32>()).unwrap();
//! for v in [1u32, 2, 3] {
//!   ch.try_send(&v.to_le_bytes()).unwrap();
//! }
//! assert!(drain_at_least(&ch, 4).is_none());
//! let batch = drain_at_least(&ch, 2).unwrap();
//! assert_eq!(batch.len(), 3);
//! assert!(ch.is_empty());
//! ```

pub mod config;
pub mod core;
pub mod drain;
pub mod error;
pub mod inspect;

// Internal utilities - not part of public API but exposed for crate use
mod internal;

pub use crate::config::ChannelConfig;
pub use crate::core::{Channel, ChannelGuard, ChannelId, ElementAlgorithm, ElementLayout, MemCopy};
pub use crate::drain::{drain_at_least, drain_at_least_with, DrainAllocator, Drained, HeapAllocator};
pub use crate::error::{ChannelError, CloseError, TryRecvError, TrySendError};
pub use crate::inspect::{inspect, IndexSnapshot, MemorySink, Report, ReportSink, TracingSink, TypeTag};
pub use crate::internal::waiter::{TaskArena, TaskRef, WaitQueue, Waiter};
