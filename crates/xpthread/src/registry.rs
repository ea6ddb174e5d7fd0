//! Thread control block registry
//!
//! A fixed-capacity slot arena behind a spinlock. Handles pack the slot
//! index with a per-slot generation; the generation is bumped every time a
//! slot is reclaimed, so a stale handle misses cleanly instead of aliasing
//! the slot's next occupant. Freed slots are reused LIFO.
//!
//! Critical sections here are short and never block: callers that need to
//! wait do so outside the lock (two-phase join protocol in `thread.rs`).

use xpthread_core::spinlock::SpinLockGuard;
use xpthread_core::{SpinLock, TaskRef, ThreadId, ThreadState};

/// Per-thread record, owned by the registry until reclaimed
pub(crate) struct Tcb {
    /// Backend task, committed after spawn succeeds. A reserved slot that
    /// has not been committed yet holds `None`.
    pub task: Option<TaskRef>,

    /// Task blocked in join on this thread, if any
    pub join_waiter: Option<TaskRef>,

    pub state: ThreadState,
    pub detached: bool,
}

impl Tcb {
    fn reserved() -> Self {
        Self {
            task: None,
            join_waiter: None,
            state: ThreadState::Running,
            detached: false,
        }
    }

    /// Backend id of the committed task, 0 while still reserved
    pub fn task_id(&self) -> u64 {
        self.task.as_ref().map(|t| t.id()).unwrap_or(0)
    }
}

/// One arena slot
struct Slot {
    /// Bumped on reclaim; 0 is never a live generation
    generation: u32,
    tcb: Option<Tcb>,
}

struct Slots {
    entries: Vec<Slot>,
    /// LIFO stack of free slot indexes
    free: Vec<u32>,
    live: u32,
    capacity: u32,
}

/// Lock-protected arena of thread records
pub(crate) struct Registry {
    slots: SpinLock<Slots>,
}

impl Registry {
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: SpinLock::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
                live: 0,
                capacity,
            }),
        }
    }

    pub fn lock(&self) -> RegistryGuard<'_> {
        RegistryGuard {
            slots: self.slots.lock(),
        }
    }
}

/// Exclusive view of the arena for one critical section
pub(crate) struct RegistryGuard<'a> {
    slots: SpinLockGuard<'a, Slots>,
}

impl RegistryGuard<'_> {
    /// Claim a slot and hand out its handle, `None` when the arena is full
    ///
    /// The record starts reserved (no task); `commit` fills it in.
    pub fn reserve(&mut self) -> Option<ThreadId> {
        let slots = &mut *self.slots;
        let index = match slots.free.pop() {
            Some(i) => i,
            None => {
                if slots.entries.len() as u32 >= slots.capacity {
                    return None;
                }
                slots.entries.push(Slot {
                    generation: 1,
                    tcb: None,
                });
                (slots.entries.len() - 1) as u32
            }
        };

        let slot = &mut slots.entries[index as usize];
        debug_assert!(slot.tcb.is_none());
        slot.tcb = Some(Tcb::reserved());
        slots.live += 1;
        Some(ThreadId::new(index, slot.generation))
    }

    /// Attach the spawned task to a reserved record
    ///
    /// Panics if the handle no longer names a live record; the creator is
    /// the only party that knows the handle between reserve and commit, so
    /// a miss means the registry was corrupted.
    pub fn commit(&mut self, id: ThreadId, task: TaskRef) {
        match self.get_mut(id) {
            Some(tcb) => tcb.task = Some(task),
            None => panic!("commit to a reclaimed thread record {}", id),
        }
    }

    pub fn get(&self, id: ThreadId) -> Option<&Tcb> {
        let slot = self.slots.entries.get(id.slot() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.tcb.as_ref()
    }

    pub fn get_mut(&mut self, id: ThreadId) -> Option<&mut Tcb> {
        let slot = self.slots.entries.get_mut(id.slot() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.tcb.as_mut()
    }

    /// Detach the record from the arena and bump the slot generation
    pub fn remove(&mut self, id: ThreadId) -> Option<Tcb> {
        let slots = &mut *self.slots;
        let slot = slots.entries.get_mut(id.slot() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let tcb = slot.tcb.take()?;

        slot.generation = slot.generation.wrapping_add(1);
        if slot.generation == 0 {
            slot.generation = 1;
        }
        slots.free.push(id.slot());
        slots.live -= 1;
        Some(tcb)
    }

    /// Reverse lookup: handle of the record owning a backend task
    pub fn find_by_task(&self, task_id: u64) -> Option<ThreadId> {
        if task_id == 0 {
            return None;
        }
        for (index, slot) in self.slots.entries.iter().enumerate() {
            if let Some(tcb) = &slot.tcb {
                if tcb.task_id() == task_id {
                    return Some(ThreadId::new(index as u32, slot.generation));
                }
            }
        }
        None
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.live as usize
    }
}
