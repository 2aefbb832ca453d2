// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use priority_oracle::PriorityKey;

use crate::command::Command;

/// A command together with the key it was enqueued under. `None` sorts below every `Some`, so
/// `Shutdown` (enqueued with no key) only surfaces once every real command has drained.
struct QueuedCommand(Option<PriorityKey>, Command);

impl PartialEq for QueuedCommand {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for QueuedCommand {}
impl PartialOrd for QueuedCommand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for QueuedCommand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// A priority queue of pending commands shared between the coordinator and every worker.
///
/// Ordering is maintained in a [`BinaryHeap`] behind a lock, the same pattern the pack's build
/// observability tracer uses for its span heap; waking blocked workers is a separate unbounded
/// channel carrying no payload, the pattern the pack's filesystem watcher uses for its
/// background-thread loop. A worker that finds the heap empty blocks on the wake channel instead
/// of busy-polling.
pub struct CommandQueue {
    heap: Mutex<BinaryHeap<QueuedCommand>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = unbounded();
        CommandQueue { heap: Mutex::new(BinaryHeap::new()), wake_tx, wake_rx }
    }

    pub fn push(&self, key: PriorityKey, command: Command) {
        self.heap.lock().push(QueuedCommand(Some(key), command));
        let _ = self.wake_tx.send(());
    }

    pub fn push_shutdown(&self) {
        self.heap.lock().push(QueuedCommand(None, Command::Shutdown));
        let _ = self.wake_tx.send(());
    }

    /// Blocks until a command is available and returns it. Never returns `None` in practice:
    /// the queue always eventually receives one `Shutdown` per worker.
    pub fn pop_blocking(&self) -> Command {
        loop {
            if let Some(queued) = self.heap.lock().pop() {
                return queued.1;
            }
            let _ = self.wake_rx.recv();
        }
    }
}
