//! `Command`: a pooled, reference-counted record for carrying heterogeneous
//! pipeline events through a [`crate::command_fifo::CommandFifo`].
//!
//! `CommandRef` is a manual intrusive-refcounted handle
//! (`NonNull<CommandInner>` + atomic refcount), not an `Arc` — `Arc::drop`
//! frees memory outright, and it cannot hand the slot back to a pool free
//! list. The same shape systems crates like `bytes`/`triomphe` use for
//! pool-backed refcounted handles.

use crate::pool::PoolInner;
use crate::refcounted::RefCounted;
use std::cell::{Cell, UnsafeCell};
use std::fmt;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

/// Command type tag. Values mirror the stable integers in spec.md §6: 0
/// None, 1 Frame, 2 Packet, 3 Flush, 4 EndOfStream, 5 Seek, 6 Config,
/// 0x1000+ User.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    None,
    Frame,
    Packet,
    Flush,
    EndOfStream,
    Seek,
    Config,
    User(u32),
}

impl CommandKind {
    /// The stable ABI-compatible tag value for this kind.
    pub fn code(self) -> u32 {
        match self {
            CommandKind::None => 0,
            CommandKind::Frame => 1,
            CommandKind::Packet => 2,
            CommandKind::Flush => 3,
            CommandKind::EndOfStream => 4,
            CommandKind::Seek => 5,
            CommandKind::Config => 6,
            CommandKind::User(n) => 0x1000 + n,
        }
    }

    pub fn is_sentinel(self) -> bool {
        matches!(self, CommandKind::Flush | CommandKind::EndOfStream)
    }

    pub fn is_media(self) -> bool {
        matches!(self, CommandKind::Frame | CommandKind::Packet)
    }
}

pub(crate) struct CommandInner {
    pub(crate) kind: Cell<CommandKind>,
    pub(crate) payload: UnsafeCell<Option<Box<dyn RefCounted>>>,
    pub(crate) pts: Cell<i64>,
    pub(crate) dts: Cell<i64>,
    pub(crate) flags: Cell<u32>,
    pub(crate) stream_index: Cell<i32>,
    pub(crate) user_data: Cell<u64>,
    /// Back-pointer to the owning pool. A `Weak` reference, not `Arc` — an
    /// `Arc` here would keep the pool alive for as long as any leaked,
    /// free-list-resident `CommandInner` exists, and the pool's own `Drop`
    /// is what reclaims those — a cycle that would leak the whole pool.
    pub(crate) pool: Weak<PoolInner>,
    pub(crate) refcount: AtomicUsize,
}

// SAFETY: every field is written through `&self` with no synchronization
// (`Cell`/`UnsafeCell`), so this must not be `Sync` — granting that would let
// safe code call `&self` mutators from two threads at once and race on the
// same memory. `Send` alone lets a live Command move from producer to
// consumer thread (e.g. through a FIFO), which is the intended usage; the
// type system then enforces the documented one-thread-at-a-time contract
// (spec.md §5) instead of merely asserting it here.
unsafe impl Send for CommandInner {}

impl CommandInner {
    pub(crate) fn reset_for_acquire(&self) {
        self.kind.set(CommandKind::None);
        unsafe {
            *self.payload.get() = None;
        }
        self.pts.set(0);
        self.dts.set(0);
        self.flags.set(0);
        self.stream_index.set(0);
        self.user_data.set(0);
        self.refcount.store(1, Ordering::Release);
    }
}

/// A reference to a pooled [`CommandInner`]. Cloning via [`CommandRef::add_ref`]
/// increments the refcount; dropping the last reference releases the
/// payload and returns the slot to its owning pool's free list.
pub struct CommandRef {
    ptr: NonNull<CommandInner>,
}

// `Sync` is deliberately not implemented: `CommandInner` isn't `Sync` either,
// for the same reason (see above). `CircularBuffer<T>`/`WaitableFifo<T>`
// only ever need `T: Send` for their own `Sync` (see `SpscRing`'s
// `unsafe impl<T: Send> Sync` in ring.rs), so `CommandFifo` is already `Sync`
// with `CommandRef: Send` alone.
unsafe impl Send for CommandRef {}

impl CommandRef {
    pub(crate) fn from_raw(ptr: NonNull<CommandInner>) -> Self {
        Self { ptr }
    }

    fn inner(&self) -> &CommandInner {
        // SAFETY: a live CommandRef always points at an in-use slot; the
        // slot is only returned to the free list after the last CommandRef
        // drops (refcount reaches 0), so no CommandRef ever observes a
        // reclaimed slot.
        unsafe { self.ptr.as_ref() }
    }

    /// Produces a new, independent reference to the same record, incrementing
    /// the refcount (spec.md §4.4: "AddRef returns new count (≥1)").
    pub fn add_ref(&self) -> CommandRef {
        self.inner().refcount.fetch_add(1, Ordering::AcqRel);
        CommandRef { ptr: self.ptr }
    }

    pub fn kind(&self) -> CommandKind {
        self.inner().kind.get()
    }

    /// Clears the current payload (Releasing it if present), then sets the
    /// new type. Leaves the refcount alone (spec.md §4.5 `init`).
    pub fn init(&self, kind: CommandKind) {
        self.clear_data();
        self.inner().kind.set(kind);
    }

    pub fn is_sentinel(&self) -> bool {
        self.kind().is_sentinel()
    }

    pub fn is_media(&self) -> bool {
        self.kind().is_media()
    }

    /// Binds a new payload by AddRef-ing it through its own [`RefCounted`]
    /// impl — the "caller wants to hand a fresh reference" case from spec.md
    /// §4.5's Frame-ref/Packet-ref design note.
    pub fn set_payload(&self, payload: &dyn RefCounted) {
        self.clear_data();
        let cloned = payload.add_ref();
        // SAFETY: exclusive field access is the caller's contract (spec.md §5).
        unsafe {
            *self.inner().payload.get() = Some(cloned);
        }
    }

    /// Binds a new payload the caller already owns a distinct reference to
    /// (no additional AddRef) — the "pass it without re-cloning" case.
    pub fn set_payload_owned(&self, payload: Box<dyn RefCounted>) {
        self.clear_data();
        unsafe {
            *self.inner().payload.get() = Some(payload);
        }
    }

    /// Releases the current payload, if any, and clears both fields.
    pub fn clear_data(&self) {
        unsafe {
            *self.inner().payload.get() = None;
        }
    }

    pub fn has_payload(&self) -> bool {
        unsafe { (*self.inner().payload.get()).is_some() }
    }

    pub fn pts(&self) -> i64 {
        self.inner().pts.get()
    }
    pub fn set_pts(&self, pts: i64) {
        self.inner().pts.set(pts);
    }
    pub fn dts(&self) -> i64 {
        self.inner().dts.get()
    }
    pub fn set_dts(&self, dts: i64) {
        self.inner().dts.set(dts);
    }
    pub fn flags(&self) -> u32 {
        self.inner().flags.get()
    }
    pub fn set_flags(&self, flags: u32) {
        self.inner().flags.set(flags);
    }
    pub fn stream_index(&self) -> i32 {
        self.inner().stream_index.get()
    }
    pub fn set_stream_index(&self, stream_index: i32) {
        self.inner().stream_index.set(stream_index);
    }
    pub fn user_data(&self) -> u64 {
        self.inner().user_data.get()
    }
    pub fn set_user_data(&self, user_data: u64) {
        self.inner().user_data.set(user_data);
    }

    pub fn ref_count(&self) -> usize {
        self.inner().refcount.load(Ordering::Acquire)
    }
}

impl fmt::Debug for CommandRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRef")
            .field("kind", &self.kind())
            .field("refcount", &self.ref_count())
            .finish()
    }
}

impl Drop for CommandRef {
    fn drop(&mut self) {
        let inner = self.inner();
        if inner.refcount.fetch_sub(1, Ordering::AcqRel) != 1 {
            return;
        }
        // Last reference: clear payload, clear type, return to the free list.
        unsafe {
            *inner.payload.get() = None;
        }
        inner.kind.set(CommandKind::None);
        match inner.pool.upgrade() {
            Some(pool) => pool.return_to_free_list(self.ptr),
            None => {
                // The pool was dropped while this Command was still
                // outstanding — a caller contract violation (spec.md §3:
                // "destroyed only once every outstanding Command has
                // returned"). Free the slot directly rather than leak it.
                unsafe { drop(Box::from_raw(self.ptr.as_ptr())) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::pool::CommandPool;

    struct TestPayload(Arc<AtomicUsize>);
    impl RefCounted for TestPayload {
        fn add_ref(&self) -> Box<dyn RefCounted> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Box::new(TestPayload(Arc::clone(&self.0)))
        }
    }
    impl Drop for TestPayload {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn init_clears_prior_payload() {
        let pool = CommandPool::new(PoolConfig::new(1, 0));
        let cmd = pool.acquire().unwrap();
        let count = Arc::new(AtomicUsize::new(1));
        cmd.set_payload_owned(Box::new(TestPayload(Arc::clone(&count))));
        assert!(cmd.has_payload());
        cmd.init(CommandKind::Flush);
        assert!(!cmd.has_payload());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(cmd.kind(), CommandKind::Flush);
    }

    #[test]
    fn set_payload_add_refs_through_interface() {
        let pool = CommandPool::new(PoolConfig::new(1, 0));
        let cmd = pool.acquire().unwrap();
        let count = Arc::new(AtomicUsize::new(1));
        let original = TestPayload(Arc::clone(&count));
        cmd.set_payload(&original);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        drop(original);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        cmd.clear_data();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn command_kind_codes_match_spec() {
        assert_eq!(CommandKind::None.code(), 0);
        assert_eq!(CommandKind::Frame.code(), 1);
        assert_eq!(CommandKind::Packet.code(), 2);
        assert_eq!(CommandKind::Flush.code(), 3);
        assert_eq!(CommandKind::EndOfStream.code(), 4);
        assert_eq!(CommandKind::Seek.code(), 5);
        assert_eq!(CommandKind::Config.code(), 6);
        assert_eq!(CommandKind::User(1).code(), 0x1001);
    }

    #[test]
    fn sentinel_and_media_classification() {
        assert!(CommandKind::Flush.is_sentinel());
        assert!(CommandKind::EndOfStream.is_sentinel());
        assert!(!CommandKind::Frame.is_sentinel());
        assert!(CommandKind::Frame.is_media());
        assert!(CommandKind::Packet.is_media());
        assert!(!CommandKind::Seek.is_media());
    }
}
