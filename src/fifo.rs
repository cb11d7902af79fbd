//! `WaitableFifo<T>`: a `CircularBuffer<T>` plus write/read semaphores, a
//! flow-enable gate, and unblock-on-disable semantics.
//!
//! Grounded on the teacher's `ringmpsc-stream` sender/receiver split (gate on
//! a semaphore, re-check a condition after waking) and its `ChannelError`
//! error-enum shape.

use crate::config::RingConfig;
use crate::ring::{CircularBuffer, RingMode};
use crate::semaphore::CountingSemaphore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Stable integer identifiers shared across the FIFO surface (spec.md §6).
/// Preserved so in-process callers that want the raw ABI values can still
/// get them via [`FifoError::code`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FifoError {
    #[error("invalid parameters")]
    InvalidParams,
    #[error("flow disabled")]
    FlowDisabled,
    #[error("fifo full")]
    FifoFull,
    #[error("timed out")]
    Timeout,
}

impl FifoError {
    /// The stable ABI-compatible status code for this error (spec.md §6).
    pub fn code(self) -> i32 {
        match self {
            FifoError::InvalidParams => 1,
            FifoError::FlowDisabled => 13,
            FifoError::FifoFull => 29,
            FifoError::Timeout => -1,
        }
    }
}

/// A bounded FIFO of `T` with semaphore-gated backpressure and cooperative
/// shutdown via [`WaitableFifo::set_flow_enabled`].
pub struct WaitableFifo<T> {
    ring: CircularBuffer<T>,
    write_sem: CountingSemaphore,
    read_sem: Option<CountingSemaphore>,
    flow_enabled: AtomicBool,
    has_been_read: AtomicBool,
    tag: i64,
}

impl<T> WaitableFifo<T> {
    /// Creates a FIFO over a ring built from `config`. `with_read_semaphore`
    /// controls whether `wait_read_data`/family are meaningful (§4.3: "optional
    /// read semaphore"); when `false`, those calls always report as if data is
    /// never awaited and callers should poll `read`/`try_*` directly.
    pub fn new(config: RingConfig, with_read_semaphore: bool, tag: i64) -> Self {
        Self {
            write_sem: CountingSemaphore::new(config.capacity as u64),
            ring: CircularBuffer::new(config),
            read_sem: with_read_semaphore.then(|| CountingSemaphore::new(0)),
            flow_enabled: AtomicBool::new(false),
            has_been_read: AtomicBool::new(false),
            tag,
        }
    }

    pub fn tag(&self) -> i64 {
        self.tag
    }

    pub fn stored_count(&self) -> usize {
        self.ring.stored_count()
    }

    pub fn has_been_read(&self) -> bool {
        self.has_been_read.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Current write-space semaphore count. Diagnostics/tests only — not
    /// part of the write/read/wait contract itself (spec.md §8, property 1).
    pub fn write_space_count(&self) -> u64 {
        self.write_sem.count()
    }

    /// Current read-data semaphore count, if a read semaphore was
    /// configured. Diagnostics/tests only.
    pub fn read_data_count(&self) -> Option<u64> {
        self.read_sem.as_ref().map(CountingSemaphore::count)
    }

    fn flow_is_enabled(&self) -> bool {
        self.flow_enabled.load(Ordering::Acquire)
    }

    /// Registers the ring's head-monitor, re-dispatching `(self, user_data, tag)`
    /// as the translation in spec.md §4.3 describes. `user_data` is opaque and
    /// supplied per call by the caller's closure capture.
    pub fn set_head_monitor(&self, monitor: Option<Arc<dyn Fn(i64) + Send + Sync>>) {
        let tag = self.tag;
        match monitor {
            Some(m) => self
                .ring
                .set_head_monitor(Some(Arc::new(move |_user_data, _tag| m(tag)))),
            None => self.ring.set_head_monitor(None),
        }
    }

    /// Writes `item`. `FlowDisabled` if flow is off; `FifoFull` if the ring
    /// has no room. On success, Posts the read semaphore exactly once.
    pub fn write(&self, item: T) -> Result<(), FifoError> {
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        if !self.ring.push(item) {
            return Err(FifoError::FifoFull);
        }
        if let Some(read_sem) = &self.read_sem {
            read_sem.post();
        }
        Ok(())
    }

    /// As [`WaitableFifo::write`], but inserts at the head (§4.3 "preemption
    /// contract").
    pub fn preempt(&self, item: T) -> Result<(), FifoError> {
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        if !self.ring.preempt(item) {
            return Err(FifoError::FifoFull);
        }
        if let Some(read_sem) = &self.read_sem {
            read_sem.post();
        }
        Ok(())
    }

    /// Pops an item, Posting the write semaphore on success. Not gated by
    /// flow: a consumer may still drain a flow-disabled FIFO (spec.md §5).
    pub fn read(&self) -> Option<T> {
        let item = self.ring.pop();
        if item.is_some() {
            self.write_sem.post();
            self.has_been_read.store(true, Ordering::Release);
        }
        item
    }

    /// Blocks until write space is available, then re-checks flow. Returns
    /// `FlowDisabled` if flow was off before waiting or went off while
    /// waiting.
    pub fn wait_write_space(&self) -> Result<(), FifoError> {
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        self.write_sem.wait();
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        Ok(())
    }

    /// As [`WaitableFifo::wait_write_space`], bounded by `timeout`.
    pub fn wait_write_space_timed(&self, timeout: Duration) -> Result<(), FifoError> {
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        if !self.write_sem.wait_timed(timeout) {
            return Err(FifoError::Timeout);
        }
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        Ok(())
    }

    /// Non-blocking form of [`WaitableFifo::wait_write_space`].
    pub fn try_wait_write_space(&self) -> Result<(), FifoError> {
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        if !self.write_sem.try_wait() {
            return Err(FifoError::FifoFull);
        }
        if !self.flow_is_enabled() {
            return Err(FifoError::FlowDisabled);
        }
        Ok(())
    }

    /// Blocks on the read-data semaphore, if one was configured. Returns
    /// `Ok(())` regardless of flow state — consumers drain after producers
    /// shut down (spec.md §5).
    pub fn wait_read_data(&self) -> Result<(), FifoError> {
        match &self.read_sem {
            Some(sem) => {
                sem.wait();
                Ok(())
            }
            None => Err(FifoError::InvalidParams),
        }
    }

    /// As [`WaitableFifo::wait_read_data`], bounded by `timeout`.
    pub fn wait_read_data_timed(&self, timeout: Duration) -> Result<(), FifoError> {
        match &self.read_sem {
            Some(sem) => {
                if sem.wait_timed(timeout) {
                    Ok(())
                } else {
                    Err(FifoError::Timeout)
                }
            }
            None => Err(FifoError::InvalidParams),
        }
    }

    /// Non-blocking form of [`WaitableFifo::wait_read_data`].
    pub fn try_wait_read_data(&self) -> Result<(), FifoError> {
        match &self.read_sem {
            Some(sem) => {
                if sem.try_wait() {
                    Ok(())
                } else {
                    Err(FifoError::Timeout)
                }
            }
            None => Err(FifoError::InvalidParams),
        }
    }

    /// Idempotent flow-enable transition (spec.md §8, property 6). Turning
    /// flow off wakes exactly one blocked writer (if the ring is full) and
    /// exactly one blocked reader (if the ring is empty and a read semaphore
    /// exists), via one Post + Reset each — see spec.md §5.
    pub fn set_flow_enabled(&self, enabled: bool) {
        let was_enabled = self.flow_enabled.swap(enabled, Ordering::AcqRel);
        if was_enabled == enabled {
            return;
        }
        if !enabled {
            if self.ring.stored_count() >= self.ring.capacity() {
                self.write_sem.post();
                self.write_sem.reset();
            }
            if self.ring.stored_count() == 0 {
                if let Some(read_sem) = &self.read_sem {
                    read_sem.post();
                    read_sem.reset();
                }
            }
        }
    }

    pub fn flow_enabled(&self) -> bool {
        self.flow_is_enabled()
    }
}
