// src/inspect.rs

//! Read-only structural snapshots of a channel.
//!
//! [`inspect`] locks the channel, copies its shape and indices into a [`Report`],
//! releases the lock and hands the report to a [`ReportSink`]. Nothing in the
//! channel is modified.

use crate::core::{Channel, ChannelId};
use parking_lot::Mutex;
use std::fmt;

/// Opaque caller-supplied type identifier, carried through for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TypeTag(pub u32);

impl fmt::Display for TypeTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:x}", self.0)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSnapshot {
  pub receive_index: usize,
  pub send_index: usize,
}

/// Point-in-time view of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
  pub type_tag: TypeTag,
  pub channel_id: ChannelId,
  pub capacity: usize,
  pub element_size: usize,
  pub count: usize,
  /// `None` for unbuffered channels, which have no indices to peek at.
  pub indices: Option<IndexSnapshot>,
}

impl Report {
  pub fn is_unbuffered(&self) -> bool {
    self.capacity < 1
  }
}

impl fmt::Display for Report {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Type: {}, Channel: {}", self.type_tag, self.channel_id)?;
    writeln!(f, "QSize:{}, Elem:{}", self.capacity, self.element_size)?;
    writeln!(f, "Value count: {}", self.count)?;
    match self.indices {
      None => write!(f, "Cannot peek on an unbuffered channel"),
      Some(idx) => write!(
        f,
        "Peeking at [recv:{} send:{} {}/{}]",
        idx.receive_index, idx.send_index, self.count, self.capacity
      ),
    }
  }
}

/// Destination for inspection reports.
pub trait ReportSink {
  fn emit(&self, report: &Report);
}

impl<F> ReportSink for F
where
  F: Fn(&Report),
{
  fn emit(&self, report: &Report) {
    self(report)
  }
}

/// Logs reports through `tracing` at INFO.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
  fn emit(&self, report: &Report) {
    match report.indices {
      None => tracing::info!(
        type_tag = %report.type_tag,
        channel = %report.channel_id,
        capacity = report.capacity,
        element_size = report.element_size,
        count = report.count,
        "Cannot peek on an unbuffered channel"
      ),
      Some(idx) => tracing::info!(
        type_tag = %report.type_tag,
        channel = %report.channel_id,
        capacity = report.capacity,
        element_size = report.element_size,
        count = report.count,
        recv = idx.receive_index,
        send = idx.send_index,
        "channel snapshot"
      ),
    }
  }
}

/// Keeps every report it receives.
#[derive(Debug, Default)]
pub struct MemorySink {
  reports: Mutex<Vec<Report>>,
}

impl MemorySink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn reports(&self) -> Vec<Report> {
    self.reports.lock().clone()
  }

  pub fn take(&self) -> Vec<Report> {
    std::mem::take(&mut *self.reports.lock())
  }

  pub fn len(&self) -> usize {
    self.reports.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl ReportSink for MemorySink {
  fn emit(&self, report: &Report) {
    self.reports.lock().push(report.clone());
  }
}

/// Takes a consistent snapshot of `channel` and emits it to `sink`.
///
/// The report is built while the lock is held; the sink is called after it is
/// released, so a sink may touch the same channel.
pub fn inspect(channel: &Channel, type_tag: TypeTag, sink: &dyn ReportSink) -> Report {
  let report = {
    let guard = channel.acquire();
    let mut report = Report {
      type_tag,
      channel_id: channel.id(),
      capacity: guard.capacity(),
      element_size: guard.element_size(),
      count: guard.count(),
      indices: None,
    };
    if guard.capacity() >= 1 {
      report.indices = Some(IndexSnapshot {
        receive_index: guard.receive_index(),
        send_index: guard.send_index(),
      });
    }
    report
  };

  sink.emit(&report);
  report
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::ElementLayout;
  use pretty_assertions::assert_eq;

  #[test]
  fn renders_buffered_report() {
    let ch = Channel::with_memcopy(4, ElementLayout::of::<u32>()).unwrap();
    ch.try_send(&1u32.to_le_bytes()).unwrap();
    let sink = MemorySink::new();
    let report = inspect(&ch, TypeTag(0xbeef), &sink);

    let expected = format!(
      "Type: beef, Channel: {}\nQSize:4, Elem:4\nValue count: 1\nPeeking at [recv:0 send:1 1/4]",
      ch.id()
    );
    assert_eq!(report.to_string(), expected);
    assert_eq!(sink.reports(), vec![report]);
  }

  #[test]
  fn renders_unbuffered_notice() {
    let ch = Channel::with_memcopy(0, ElementLayout::of::<u32>()).unwrap();
    let report = inspect(&ch, TypeTag(1), &TracingSink);
    assert!(report.is_unbuffered());
    assert!(report.indices.is_none());
    assert!(report.to_string().ends_with("Cannot peek on an unbuffered channel"));
  }

  #[test]
  fn sink_may_reenter_channel() {
    let ch = Channel::with_memcopy(2, ElementLayout::of::<u8>()).unwrap();
    let seen = Mutex::new(None);
    let sink = |_: &Report| {
      *seen.lock() = Some(ch.len());
    };
    inspect(&ch, TypeTag::default(), &sink);
    assert_eq!(*seen.lock(), Some(0));
  }
}
