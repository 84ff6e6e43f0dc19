//! Blocked-endpoint records for the channel's wait queues.
//!
//! A waiter refers to its task through a `TaskRef`: a slot index into a `TaskArena`
//! plus the generation the slot had when the task was registered. Once a task is
//! removed its slot generation moves on, so every outstanding `TaskRef` to it stops
//! resolving, even after the slot is reused for another task.

use std::collections::VecDeque;
use std::fmt;

/// A generation-checked handle to a task record in a `TaskArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskRef {
  index: usize,
  generation: u64,
}

impl TaskRef {
  pub fn index(&self) -> usize {
    self.index
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }
}

#[derive(Debug)]
struct ArenaSlot<T> {
  generation: u64,
  value: Option<T>,
}

/// Slot arena of task records.
#[derive(Debug)]
pub struct TaskArena<T> {
  slots: Vec<ArenaSlot<T>>,
  free: Vec<usize>,
  live: usize,
}

impl<T> Default for TaskArena<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> TaskArena<T> {
  pub fn new() -> Self {
    Self {
      slots: Vec::new(),
      free: Vec::new(),
      live: 0,
    }
  }

  pub fn len(&self) -> usize {
    self.live
  }

  pub fn is_empty(&self) -> bool {
    self.live == 0
  }

  pub fn insert(&mut self, value: T) -> TaskRef {
    self.live += 1;
    if let Some(index) = self.free.pop() {
      let slot = &mut self.slots[index];
      slot.value = Some(value);
      return TaskRef {
        index,
        generation: slot.generation,
      };
    }
    self.slots.push(ArenaSlot {
      generation: 0,
      value: Some(value),
    });
    TaskRef {
      index: self.slots.len() - 1,
      generation: 0,
    }
  }

  /// Removes the task and invalidates every `TaskRef` pointing at it.
  pub fn remove(&mut self, task: TaskRef) -> Option<T> {
    let slot = self.slots.get_mut(task.index)?;
    if slot.generation != task.generation {
      return None;
    }
    let value = slot.value.take()?;
    slot.generation += 1;
    self.free.push(task.index);
    self.live -= 1;
    Some(value)
  }

  pub fn get(&self, task: TaskRef) -> Option<&T> {
    self
      .slots
      .get(task.index)
      .filter(|slot| slot.generation == task.generation)
      .and_then(|slot| slot.value.as_ref())
  }

  pub fn get_mut(&mut self, task: TaskRef) -> Option<&mut T> {
    self
      .slots
      .get_mut(task.index)
      .filter(|slot| slot.generation == task.generation)
      .and_then(|slot| slot.value.as_mut())
  }

  pub fn is_live(&self, task: TaskRef) -> bool {
    self.get(task).is_some()
  }
}

/// One blocked task's pending transfer.
#[derive(Clone, PartialEq, Eq)]
pub struct Waiter {
  pub task: TaskRef,
  /// The element a blocked sender is offering, or the element delivered to a
  /// blocked receiver. `None` while nothing has been transferred.
  pub elem: Option<Vec<u8>>,
}

impl Waiter {
  pub fn new(task: TaskRef) -> Self {
    Self { task, elem: None }
  }

  pub fn with_elem(task: TaskRef, elem: Vec<u8>) -> Self {
    Self {
      task,
      elem: Some(elem),
    }
  }
}

impl fmt::Debug for Waiter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Waiter")
      .field("task", &self.task)
      .field("elem_len", &self.elem.as_ref().map(Vec::len))
      .finish()
  }
}

/// FIFO of waiters. Not synchronized itself; it lives inside the channel's lock.
#[derive(Debug, Default)]
pub struct WaitQueue {
  waiters: VecDeque<Waiter>,
}

impl WaitQueue {
  pub fn new() -> Self {
    Self {
      waiters: VecDeque::new(),
    }
  }

  pub fn len(&self) -> usize {
    self.waiters.len()
  }

  pub fn is_empty(&self) -> bool {
    self.waiters.is_empty()
  }

  pub fn push_back(&mut self, waiter: Waiter) {
    self.waiters.push_back(waiter);
  }

  pub fn pop_front(&mut self) -> Option<Waiter> {
    self.waiters.pop_front()
  }

  pub fn peek_front(&self) -> Option<&Waiter> {
    self.waiters.front()
  }

  /// Pops the first waiter whose task is still registered in `arena`.
  /// Stale waiters in front of it are discarded.
  pub fn pop_live<T>(&mut self, arena: &TaskArena<T>) -> Option<Waiter> {
    while let Some(waiter) = self.waiters.pop_front() {
      if arena.is_live(waiter.task) {
        return Some(waiter);
      }
      tracing::trace!(index = waiter.task.index, generation = waiter.task.generation, "discarding stale waiter");
    }
    None
  }

  /// Removes the waiter registered for `task`, if queued.
  pub fn remove_task(&mut self, task: TaskRef) -> Option<Waiter> {
    let pos = self.waiters.iter().position(|w| w.task == task)?;
    self.waiters.remove(pos)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Waiter> {
    self.waiters.iter()
  }

  pub(crate) fn take_all(&mut self) -> Vec<Waiter> {
    self.waiters.drain(..).collect()
  }
}
