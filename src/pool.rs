//! `CommandPool`: a mutex-guarded free list of [`CommandInner`] records.
//!
//! Grounded on the teacher's `channel.rs::ChannelInner` shape (mutex-guarded
//! shared state behind `Arc`, `AtomicUsize`-flavored counters) adapted from
//! "per-producer rings" to "free list of pooled records".

use crate::command::{CommandInner, CommandKind, CommandRef};
use crate::config::PoolConfig;
use crate::invariants::debug_assert_pool_accounting;
use std::cell::{Cell, UnsafeCell};
use std::ptr::NonNull;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

struct PoolState {
    free_list: Vec<NonNull<CommandInner>>,
    total: usize,
}

// SAFETY: `NonNull<CommandInner>` pointers in the free list are exclusively
// owned by the pool while resident there (no live `CommandRef` exists for a
// free-listed slot); access is always taken under `PoolInner::state`.
unsafe impl Send for PoolState {}

pub(crate) struct PoolInner {
    state: Mutex<PoolState>,
    max_size: usize,
}

impl PoolInner {
    pub(crate) fn return_to_free_list(&self, ptr: NonNull<CommandInner>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.free_list.push(ptr);
        let total = state.total;
        let free = state.free_list.len();
        debug_assert_pool_accounting!(total, free, total - free);
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
        debug_assert_eq!(
            state.free_list.len(),
            state.total,
            "CommandPool dropped with {} Command(s) still outstanding",
            state.total - state.free_list.len()
        );
        for ptr in state.free_list.drain(..) {
            // SAFETY: every pointer in the free list was allocated by this
            // pool via `Box::leak` and is not referenced by any live
            // `CommandRef` (those hold a ptr only while refcount > 0, which
            // removes them from the free list).
            unsafe {
                drop(Box::from_raw(ptr.as_ptr()));
            }
        }
    }
}

/// A pool of pre-allocated, reusable [`CommandRef`] records. `max_size == 0`
/// means growth is uncapped; otherwise `acquire` returns `None` once `total`
/// reaches `max_size` and the free list is empty (spec.md §4.5, §8 S5).
pub struct CommandPool {
    inner: Arc<PoolInner>,
}

impl CommandPool {
    /// Pre-allocates `config.initial` records. `config.max_size == 0` means
    /// uncapped growth.
    pub fn new(config: PoolConfig) -> Self {
        let inner = Arc::new(PoolInner {
            state: Mutex::new(PoolState {
                free_list: Vec::with_capacity(config.initial),
                total: 0,
            }),
            max_size: config.max_size,
        });
        {
            let mut state = inner.state.lock().unwrap_or_else(|e| e.into_inner());
            for _ in 0..config.initial {
                let ptr = Self::allocate(&inner);
                state.free_list.push(ptr);
                state.total += 1;
            }
        }
        Self { inner }
    }

    fn allocate(pool: &Arc<PoolInner>) -> NonNull<CommandInner> {
        let boxed = Box::new(CommandInner {
            kind: Cell::new(CommandKind::None),
            payload: UnsafeCell::new(None),
            pts: Cell::new(0),
            dts: Cell::new(0),
            flags: Cell::new(0),
            stream_index: Cell::new(0),
            user_data: Cell::new(0),
            pool: Arc::downgrade(pool),
            refcount: AtomicUsize::new(0),
        });
        NonNull::from(Box::leak(boxed))
    }

    /// Acquires a Command: pops the free list if non-empty, otherwise
    /// allocates a new record if under `max_size` (or uncapped). Returns
    /// `None` if the pool is capped and exhausted.
    pub fn acquire(&self) -> Option<CommandRef> {
        let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        let ptr = if let Some(ptr) = state.free_list.pop() {
            ptr
        } else if self.inner.max_size == 0 || state.total < self.inner.max_size {
            let ptr = Self::allocate(&self.inner);
            state.total += 1;
            ptr
        } else {
            return None;
        };
        let total = state.total;
        let free = state.free_list.len();
        debug_assert_pool_accounting!(total, free, total - free);
        drop(state);
        // SAFETY: `ptr` was just removed from the free list (or freshly
        // allocated), so no other `CommandRef` can observe it yet.
        unsafe { ptr.as_ref().reset_for_acquire() };
        Some(CommandRef::from_raw(ptr))
    }

    pub fn total_count(&self) -> usize {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner()).total
    }

    pub fn free_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .free_list
            .len()
    }

    pub fn in_use_count(&self) -> usize {
        let state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
        state.total - state.free_list.len()
    }

    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s5_pool_cap_returns_none_not_blocks() {
        let pool = CommandPool::new(PoolConfig::new(2, 2));
        let a = pool.acquire();
        let b = pool.acquire();
        assert!(a.is_some());
        assert!(b.is_some());
        assert!(pool.acquire().is_none());

        drop(a);
        let c = pool.acquire();
        assert!(c.is_some());
        assert_eq!(pool.total_count(), 2);
    }

    #[test]
    fn in_use_equals_total_minus_free() {
        let pool = CommandPool::new(PoolConfig::new(3, 0));
        let a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();
        assert_eq!(pool.total_count(), 3);
        assert_eq!(pool.free_count(), 1);
        assert_eq!(pool.in_use_count(), 2);
        drop(a);
        assert_eq!(pool.free_count(), 2);
        assert_eq!(pool.in_use_count(), 1);
    }

    #[test]
    fn uncapped_pool_grows_past_initial() {
        let pool = CommandPool::new(PoolConfig::new(1, 0));
        let _a = pool.acquire().unwrap();
        let b = pool.acquire();
        assert!(b.is_some());
        assert_eq!(pool.total_count(), 2);
    }

    #[test]
    fn acquired_command_starts_fresh() {
        let pool = CommandPool::new(PoolConfig::new(1, 0));
        let cmd = pool.acquire().unwrap();
        assert_eq!(cmd.kind(), CommandKind::None);
        assert!(!cmd.has_payload());
        assert_eq!(cmd.pts(), 0);
        assert_eq!(cmd.ref_count(), 1);
    }

    #[test]
    fn released_slot_is_reused_reset() {
        let pool = CommandPool::new(PoolConfig::new(1, 1));
        let cmd = pool.acquire().unwrap();
        cmd.set_pts(42);
        cmd.init(CommandKind::Frame);
        drop(cmd);
        let cmd2 = pool.acquire().unwrap();
        assert_eq!(cmd2.pts(), 0);
        assert_eq!(cmd2.kind(), CommandKind::None);
    }
}
