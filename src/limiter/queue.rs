use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tokio::sync::oneshot;

/// Lower values are served first.
pub type Priority = i32;

/// Priority used when the caller has no particular urgency.
pub const DEFAULT_PRIORITY: Priority = 0;

/// A request that was denied immediate admission and is waiting for a
/// replenishment cycle to let it through.
#[derive(Debug)]
pub struct QueueEntry {
    pub priority: Priority,
    pub sequence: u64,
    completion: oneshot::Sender<()>,
}

impl QueueEntry {
    /// True once the waiting side has gone away (cancelled, timed out, dropped).
    pub fn is_abandoned(&self) -> bool {
        self.completion.is_closed()
    }

    /// Wakes the owner. Consumes the entry so a handle can never fire twice.
    /// Returns false if nobody was listening anymore.
    pub fn release(self) -> bool {
        self.completion.send(()).is_ok()
    }
}

// BinaryHeap is a max-heap, so "greater" means "served sooner":
// lowest priority value first, then lowest sequence.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for QueueEntry {}

/// Unbounded priority queue of blocked requests.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    heap: BinaryHeap<QueueEntry>,
    next_sequence: u64,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request and hands back the receiver its owner should await.
    pub fn push(&mut self, priority: Priority) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.heap.push(QueueEntry {
            priority,
            sequence,
            completion: tx,
        });
        rx
    }

    /// Next entry in service order, abandoned ones included.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.heap.pop()
    }

    /// Drops entries whose waiter is gone. Sequence numbers of the survivors
    /// are untouched, so FIFO order within a priority still holds.
    pub fn purge_abandoned(&mut self) -> usize {
        let before = self.heap.len();
        self.heap.retain(|entry| !entry.is_abandoned());
        before - self.heap.len()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
