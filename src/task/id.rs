//! Task identifiers.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

//------------ TaskId ---------------------------------------------------------

/// The identifier of a task.
///
/// Identifiers are only used to correlate log lines of concurrent tasks.
/// Their order reflects the order of construction but carries no
/// guarantee about the order of completion.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TaskId(u64);

impl TaskId {
    /// Returns the raw value of the identifier.
    pub fn into_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<TaskId> for u64 {
    fn from(id: TaskId) -> u64 {
        id.0
    }
}

//------------ TaskIdAllocator ------------------------------------------------

/// Issues unique, strictly increasing task identifiers.
///
/// All task types share one allocator per environment so that identifiers
/// are unique regardless of the kind of task. The allocator can be used
/// from several threads at once.
#[derive(Debug, Default)]
pub struct TaskIdAllocator {
    next: AtomicU64,
}

impl TaskIdAllocator {
    /// Creates a new allocator starting at zero.
    pub const fn new() -> Self {
        TaskIdAllocator {
            next: AtomicU64::new(0),
        }
    }

    /// Returns the allocator shared by the whole process.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<TaskIdAllocator>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(TaskIdAllocator::new())).clone()
    }

    /// Returns a fresh identifier.
    ///
    /// The identifier is greater than all identifiers previously returned
    /// by this allocator.
    pub fn next(&self) -> TaskId {
        TaskId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

//============ Tests =========================================================
