//! Typed frame/packet handles and their FIFOs (spec.md §4.7).
//!
//! `FrameHandle`/`PacketHandle` wrap an `Arc` over an opaque backing buffer —
//! the buffer's actual contents (decoded samples, compressed bitstream) are
//! owned by an external codec collaborator this crate does not model (§1
//! Non-goals). The handle shape follows the owned-buffer-over-an-external-
//! source pattern: a cheap, clonable front for data someone else produced.

use crate::config::RingConfig;
use crate::fifo::WaitableFifo;
use crate::refcounted::RefCounted;
use std::sync::Arc;

/// Opaque backing storage for a decoded frame. Freed when the last
/// [`FrameHandle`] referencing it drops.
pub struct FrameData {
    pub bytes: Vec<u8>,
    pub stream_index: i32,
    pub pts: i64,
}

/// A clonable, reference-counted handle over a [`FrameData`] buffer.
#[derive(Clone)]
pub struct FrameHandle {
    data: Arc<FrameData>,
}

impl FrameHandle {
    pub fn new(data: FrameData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn stream_index(&self) -> i32 {
        self.data.stream_index
    }

    pub fn pts(&self) -> i64 {
        self.data.pts
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl RefCounted for FrameHandle {
    fn add_ref(&self) -> Box<dyn RefCounted> {
        Box::new(self.clone())
    }
}

/// Opaque backing storage for a compressed packet.
pub struct PacketData {
    pub bytes: Vec<u8>,
    pub stream_index: i32,
    pub dts: i64,
}

/// A clonable, reference-counted handle over a [`PacketData`] buffer.
#[derive(Clone)]
pub struct PacketHandle {
    data: Arc<PacketData>,
}

impl PacketHandle {
    pub fn new(data: PacketData) -> Self {
        Self {
            data: Arc::new(data),
        }
    }

    pub fn stream_index(&self) -> i32 {
        self.data.stream_index
    }

    pub fn dts(&self) -> i64 {
        self.data.dts
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data.bytes
    }

    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl RefCounted for PacketHandle {
    fn add_ref(&self) -> Box<dyn RefCounted> {
        Box::new(self.clone())
    }
}

/// `WaitableFifo<FrameHandle>`. Write clones the caller's handle in (the
/// caller keeps its own `Arc` strong reference); read hands back a handle
/// the caller now owns. Draining on drop frees any remaining handles.
pub struct FrameFifo {
    inner: WaitableFifo<FrameHandle>,
}

impl FrameFifo {
    pub fn new(config: RingConfig) -> Self {
        let inner = WaitableFifo::new(config, true, 0);
        inner.set_flow_enabled(true);
        Self { inner }
    }

    pub fn write(&self, frame: &FrameHandle) -> Result<(), crate::fifo::FifoError> {
        self.inner.write(frame.clone())
    }

    pub fn read(&self) -> Option<FrameHandle> {
        self.inner.read()
    }

    pub fn wait_write_space(&self) -> Result<(), crate::fifo::FifoError> {
        self.inner.wait_write_space()
    }

    pub fn wait_read_data(&self) -> Result<(), crate::fifo::FifoError> {
        self.inner.wait_read_data()
    }

    pub fn set_flow_enabled(&self, enabled: bool) {
        self.inner.set_flow_enabled(enabled);
    }

    pub fn stored_count(&self) -> usize {
        self.inner.stored_count()
    }
}

impl Drop for FrameFifo {
    fn drop(&mut self) {
        self.inner.set_flow_enabled(false);
        while self.inner.read().is_some() {}
    }
}

/// `WaitableFifo<PacketHandle>`, symmetric to [`FrameFifo`].
pub struct PacketFifo {
    inner: WaitableFifo<PacketHandle>,
}

impl PacketFifo {
    pub fn new(config: RingConfig) -> Self {
        let inner = WaitableFifo::new(config, true, 0);
        inner.set_flow_enabled(true);
        Self { inner }
    }

    pub fn write(&self, packet: &PacketHandle) -> Result<(), crate::fifo::FifoError> {
        self.inner.write(packet.clone())
    }

    pub fn read(&self) -> Option<PacketHandle> {
        self.inner.read()
    }

    pub fn wait_write_space(&self) -> Result<(), crate::fifo::FifoError> {
        self.inner.wait_write_space()
    }

    pub fn wait_read_data(&self) -> Result<(), crate::fifo::FifoError> {
        self.inner.wait_read_data()
    }

    pub fn set_flow_enabled(&self, enabled: bool) {
        self.inner.set_flow_enabled(enabled);
    }

    pub fn stored_count(&self) -> usize {
        self.inner.stored_count()
    }
}

impl Drop for PacketFifo {
    fn drop(&mut self) {
        self.inner.set_flow_enabled(false);
        while self.inner.read().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingMode;

    #[test]
    fn frame_handle_add_ref_shares_backing_buffer() {
        let handle = FrameHandle::new(FrameData {
            bytes: vec![1, 2, 3],
            stream_index: 0,
            pts: 100,
        });
        assert_eq!(handle.strong_count(), 1);
        let cloned = handle.add_ref();
        assert_eq!(handle.strong_count(), 2);
        drop(cloned);
        assert_eq!(handle.strong_count(), 1);
    }

    #[test]
    fn frame_fifo_write_clones_caller_keeps_original() {
        let fifo = FrameFifo::new(RingConfig::new(4, RingMode::Spsc));
        let frame = FrameHandle::new(FrameData {
            bytes: vec![9],
            stream_index: 1,
            pts: 7,
        });
        fifo.write(&frame).unwrap();
        assert_eq!(frame.strong_count(), 2);
        let read_back = fifo.read().unwrap();
        assert_eq!(read_back.pts(), 7);
        assert_eq!(frame.strong_count(), 2);
    }

    #[test]
    fn packet_fifo_round_trip() {
        let fifo = PacketFifo::new(RingConfig::new(2, RingMode::Mpmc));
        let packet = PacketHandle::new(PacketData {
            bytes: vec![0xAB],
            stream_index: 2,
            dts: 50,
        });
        fifo.write(&packet).unwrap();
        let out = fifo.read().unwrap();
        assert_eq!(out.stream_index(), 2);
        assert_eq!(out.dts(), 50);
    }

    #[test]
    fn frame_fifo_drop_frees_remaining_handles() {
        let frame = FrameHandle::new(FrameData {
            bytes: vec![],
            stream_index: 0,
            pts: 0,
        });
        {
            let fifo = FrameFifo::new(RingConfig::new(2, RingMode::Spsc));
            fifo.write(&frame).unwrap();
            assert_eq!(frame.strong_count(), 2);
        }
        assert_eq!(frame.strong_count(), 1);
    }
}
