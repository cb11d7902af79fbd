//! Loom-based concurrency test for the flow-disable wakeup race
//! (spec.md §5, "cancellation": a blocked writer must be woken by
//! `set_flow_enabled(false)` under every possible interleaving).
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom needs its own synchronization primitives to instrument every
//! interleaving, so this models the write-semaphore-plus-flow-flag protocol
//! at a reduced scale rather than driving `CountingSemaphore`/`WaitableFifo`
//! directly — the same reduction the teacher's own `loom_tests.rs` makes for
//! its ring.

#![cfg(feature = "loom")]

use loom::sync::atomic::{AtomicBool, Ordering};
use loom::sync::{Arc, Condvar, Mutex};
use loom::thread;

/// A reduced model of `CountingSemaphore` + the flow-enabled flag together:
/// exactly the two pieces of state `set_flow_enabled(false)` must touch
/// atomically enough that a concurrently blocked waiter always wakes.
struct FlowGate {
    count: Mutex<u64>,
    changed: Condvar,
    flow_enabled: AtomicBool,
}

impl FlowGate {
    fn new() -> Self {
        Self {
            count: Mutex::new(0),
            changed: Condvar::new(),
            flow_enabled: AtomicBool::new(true),
        }
    }

    /// Blocks until either a permit is posted or flow is disabled.
    /// Returns `true` if a permit was taken, `false` if it observed
    /// flow-disabled instead.
    fn wait_for_space_or_disable(&self) -> bool {
        let mut count = self.count.lock().unwrap();
        loop {
            if *count > 0 {
                *count -= 1;
                return true;
            }
            if !self.flow_enabled.load(Ordering::Acquire) {
                return false;
            }
            count = self.changed.wait(count).unwrap();
        }
    }

    /// Mirrors `WaitableFifo::set_flow_enabled(false)`'s writer-wake step:
    /// flip the flag, then Post+Reset once to guarantee a blocked waiter
    /// observes the change rather than sleeping forever.
    fn disable(&self) {
        self.flow_enabled.store(false, Ordering::Release);
        let mut count = self.count.lock().unwrap();
        *count = 1;
        self.changed.notify_all();
        *count = 0;
    }
}

#[test]
fn disable_always_wakes_a_blocked_writer() {
    loom::model(|| {
        let gate = Arc::new(FlowGate::new());
        let writer_gate = Arc::clone(&gate);

        let writer = thread::spawn(move || writer_gate.wait_for_space_or_disable());

        gate.disable();

        // Under every interleaving loom explores, the writer must return —
        // never hang waiting on a permit that will never come.
        let got_space = writer.join().unwrap();
        assert!(!got_space, "model never posts a real permit, only disables");
    });
}

#[test]
fn post_before_disable_is_still_observed() {
    loom::model(|| {
        let gate = Arc::new(FlowGate::new());
        let writer_gate = Arc::clone(&gate);
        let poster_gate = Arc::clone(&gate);

        let writer = thread::spawn(move || writer_gate.wait_for_space_or_disable());

        let poster = thread::spawn(move || {
            let mut count = poster_gate.count.lock().unwrap();
            *count += 1;
            poster_gate.changed.notify_one();
        });

        poster.join().unwrap();
        gate.disable();

        // Either the writer claimed the real permit (true) or observed
        // disable first (false) — both are valid outcomes, but it must
        // return under every interleaving.
        let _ = writer.join().unwrap();
    });
}
