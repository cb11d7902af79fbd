//! `CircularBuffer<T>`: a bounded ring with two concurrency modes.
//!
//! `Spsc` is lock-free (single producer, single consumer); `Mpmc` is guarded
//! by one mutex. Both share a head-monitor callback and high/low water-mark
//! handlers. See spec.md §4.2 and DESIGN.md for the adaptations from the
//! teacher's `Ring<T>` (monotonic sequence numbers instead of a reserved
//! "capacity+1" slot; `% capacity` indexing instead of a power-of-two mask,
//! since this spec's own worked scenarios use non-power-of-two capacities).

use crate::config::RingConfig;
use crate::invariants::{debug_assert_bounded_count, debug_assert_monotonic};
use std::cell::UnsafeCell;
use std::collections::VecDeque;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Selects a `CircularBuffer`'s concurrency backend. Chosen once at
/// construction; there is no setter, so switching modes after the fact is a
/// compile-time impossibility rather than a documented-but-possible misuse
/// (spec.md §9, Open Question 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingMode {
    /// Exactly one producer thread, exactly one consumer thread. Lock-free.
    Spsc,
    /// Any number of producer/consumer threads. Guarded by one mutex.
    Mpmc,
}

type HeadMonitor = Arc<dyn Fn(u64, i64) + Send + Sync>;
type WaterHandler = Arc<dyn Fn(u64) + Send + Sync>;

struct WaterMarks {
    high: Option<(usize, WaterHandler)>,
    low: Option<(usize, WaterHandler)>,
}

/// A bounded ring buffer for `T`. See the module docs for the two modes.
pub struct CircularBuffer<T> {
    capacity: usize,
    backend: Backend<T>,
    head_monitor: Mutex<Option<HeadMonitor>>,
    water: Mutex<WaterMarks>,
    user_data: u64,
    tag: i64,
}

enum Backend<T> {
    Spsc(SpscRing<T>),
    Mpmc(Mutex<VecDeque<T>>),
}

/// Lock-free single-producer/single-consumer ring, grounded on the teacher's
/// `Ring<T>` (monotonic `u64` sequence numbers avoid the ABA problem; at any
/// realistic rate wraparound takes decades).
struct SpscRing<T> {
    tail: AtomicU64,
    head: AtomicU64,
    buffer: UnsafeCell<Box<[MaybeUninit<T>]>>,
    capacity: usize,
}

unsafe impl<T: Send> Send for SpscRing<T> {}
unsafe impl<T: Send> Sync for SpscRing<T> {}

impl<T> SpscRing<T> {
    fn new(capacity: usize) -> Self {
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, MaybeUninit::uninit);
        Self {
            tail: AtomicU64::new(0),
            head: AtomicU64::new(0),
            buffer: UnsafeCell::new(buffer.into_boxed_slice()),
            capacity,
        }
    }

    fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head) as usize
    }

    /// Only the single producer may call this. Returns the occupancy
    /// observed immediately before the push (for head-monitor/water-mark
    /// firing), so callers never need a second, separately-synchronized
    /// `len()` read that could race a concurrent pop.
    fn push(&self, item: T) -> Option<usize> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        let before = tail.wrapping_sub(head) as usize;
        if before >= self.capacity {
            return None;
        }
        let idx = (tail as usize) % self.capacity;
        // SAFETY: only the producer writes slots at/after `tail`; the
        // consumer never touches an index until `head` passes it.
        unsafe {
            let buf = &mut *self.buffer.get();
            buf[idx] = MaybeUninit::new(item);
        }
        let new_tail = tail.wrapping_add(1);
        debug_assert_bounded_count!(new_tail.wrapping_sub(head) as usize, self.capacity);
        debug_assert_monotonic!("tail", tail, new_tail);
        self.tail.store(new_tail, Ordering::Release);
        Some(before)
    }

    /// Only the single consumer may call this. Returns the popped item
    /// alongside the occupancy observed immediately before the pop.
    fn pop(&self) -> Option<(T, usize)> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        let before = tail.wrapping_sub(head) as usize;
        if before == 0 {
            return None;
        }
        let idx = (head as usize) % self.capacity;
        // SAFETY: slots in [head, tail) were published by the producer's
        // Release store on tail, synchronized by our Acquire load above.
        let item = unsafe {
            let buf = &mut *self.buffer.get();
            std::mem::replace(&mut buf[idx], MaybeUninit::uninit()).assume_init()
        };
        let new_head = head.wrapping_add(1);
        debug_assert_monotonic!("head", head, new_head);
        self.head.store(new_head, Ordering::Release);
        Some((item, before))
    }
}

impl<T> Drop for SpscRing<T> {
    fn drop(&mut self) {
        let head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        let count = tail.wrapping_sub(head) as usize;
        let buf = self.buffer.get_mut();
        for i in 0..count {
            let idx = (head as usize).wrapping_add(i) % self.capacity;
            unsafe { ptr::drop_in_place(buf[idx].as_mut_ptr()) };
        }
    }
}

impl<T> CircularBuffer<T> {
    /// Creates a new ring from a [`RingConfig`].
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is 0 (disallowed by spec.md §4.2).
    pub fn new(config: RingConfig) -> Self {
        assert!(config.capacity > 0, "CircularBuffer capacity must be > 0");
        let backend = match config.mode {
            RingMode::Spsc => Backend::Spsc(SpscRing::new(config.capacity)),
            RingMode::Mpmc => {
                Backend::Mpmc(Mutex::new(VecDeque::with_capacity(config.capacity)))
            }
        };
        Self {
            capacity: config.capacity,
            backend,
            head_monitor: Mutex::new(None),
            water: Mutex::new(WaterMarks { high: None, low: None }),
            user_data: 0,
            tag: 0,
        }
    }

    /// Sets the opaque `(user_data, tag)` pair passed through to callbacks.
    pub fn set_opaque(&mut self, user_data: u64, tag: i64) {
        self.user_data = user_data;
        self.tag = tag;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn stored_count(&self) -> usize {
        match &self.backend {
            Backend::Spsc(r) => r.len(),
            Backend::Mpmc(q) => q.lock().unwrap_or_else(|e| e.into_inner()).len(),
        }
    }

    pub fn mode(&self) -> RingMode {
        match &self.backend {
            Backend::Spsc(_) => RingMode::Spsc,
            Backend::Mpmc(_) => RingMode::Mpmc,
        }
    }

    /// Registers (or clears, with `None`) the head-monitor callback. Fires
    /// when the ring transitions empty→non-empty on push, or on a pop that
    /// leaves the ring non-empty. Runs outside any internal lock on the push
    /// path. Must be idempotent and must not call back into this ring — there
    /// is no reentrancy guard (spec.md §9, Open Question 1).
    pub fn set_head_monitor(&self, monitor: Option<HeadMonitor>) {
        *self.head_monitor.lock().unwrap_or_else(|e| e.into_inner()) = monitor;
    }

    /// Registers high/low water-mark handlers. High fires when a push leaves
    /// occupancy == `high+1` (crossed upward); low fires when a pop leaves
    /// occupancy == `low-1` (crossed downward). One call per crossing.
    pub fn set_water_mark(
        &self,
        high: usize,
        low: usize,
        on_high: WaterHandler,
        on_low: WaterHandler,
    ) {
        let mut w = self.water.lock().unwrap_or_else(|e| e.into_inner());
        w.high = Some((high, on_high));
        w.low = Some((low, on_low));
    }

    fn fire_head_monitor_if(&self, became_nonempty_or_nonempty_pop: bool) {
        if !became_nonempty_or_nonempty_pop {
            return;
        }
        let monitor = self
            .head_monitor
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if let Some(m) = monitor {
            m(self.user_data, self.tag);
        }
    }

    /// High-water fires when a push leaves occupancy at `high+1` (crossed
    /// upward); low-water fires when a pop leaves occupancy at `low-1`
    /// (crossed downward). Since each push/pop moves occupancy by exactly
    /// one, `after` hitting the threshold value is itself the crossing —
    /// reaching it again later is necessarily a fresh crossing, since
    /// occupancy must first have left it.
    fn fire_water_marks(&self, after: usize, pushed: bool) {
        let w = self.water.lock().unwrap_or_else(|e| e.into_inner());
        if pushed {
            if let Some((high, handler)) = &w.high {
                if after == high + 1 {
                    handler(self.user_data);
                }
            }
        } else if let Some((low, handler)) = &w.low {
            if after + 1 == *low {
                handler(self.user_data);
            }
        }
    }

    /// Pushes at the tail. Returns `false` if the ring is full. The
    /// occupancy used to decide callback firing is taken from the same
    /// locked/atomic operation that performs the placement, not a second,
    /// separately-synchronized read — otherwise a concurrent pop between the
    /// two reads could make an empty→non-empty transition go unreported
    /// (spec.md §4.2, §5).
    pub fn push(&self, item: T) -> bool {
        let before = match &self.backend {
            Backend::Spsc(r) => match r.push(item) {
                Some(before) => before,
                None => return false,
            },
            Backend::Mpmc(q) => {
                let mut q = q.lock().unwrap_or_else(|e| e.into_inner());
                let before = q.len();
                if before >= self.capacity {
                    return false;
                }
                q.push_back(item);
                before
            }
        };
        let after = before + 1;
        self.fire_head_monitor_if(before == 0);
        self.fire_water_marks(after, true);
        true
    }

    /// Inserts at the head so the next `pop()` returns `item` first. Accepted
    /// in `Mpmc` mode (under the mutex). In `Spsc` mode this would require
    /// the producer to write the consumer-owned `head` index, breaking the
    /// single-writer invariant that makes `Spsc` lock-free — so it returns
    /// `false` there instead (spec.md §9, single-producer/single-consumer
    /// safety is a mode contract, not a defect).
    pub fn preempt(&self, item: T) -> bool {
        match &self.backend {
            Backend::Spsc(_) => false,
            Backend::Mpmc(q) => {
                let before;
                let ok;
                {
                    let mut q = q.lock().unwrap_or_else(|e| e.into_inner());
                    before = q.len();
                    if before >= self.capacity {
                        ok = false;
                    } else {
                        q.push_front(item);
                        ok = true;
                    }
                }
                if ok {
                    self.fire_head_monitor_if(true);
                    self.fire_water_marks(before + 1, true);
                }
                ok
            }
        }
    }

    /// Pops from the head. Returns `None` if the ring is empty. As with
    /// [`CircularBuffer::push`], the pre-pop occupancy comes from the same
    /// locked/atomic operation that removes the item.
    pub fn pop(&self) -> Option<T> {
        let (item, before) = match &self.backend {
            Backend::Spsc(r) => match r.pop() {
                Some((item, before)) => (item, before),
                None => return None,
            },
            Backend::Mpmc(q) => {
                let mut q = q.lock().unwrap_or_else(|e| e.into_inner());
                let before = q.len();
                match q.pop_front() {
                    Some(item) => (item, before),
                    None => return None,
                }
            }
        };
        let after = before - 1;
        self.fire_head_monitor_if(after > 0);
        self.fire_water_marks(after, false);
        Some(item)
    }
}
