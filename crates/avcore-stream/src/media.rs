//! Async sugar over [`avcore::FrameFifo`] / [`avcore::PacketFifo`], same
//! shape as [`crate::command::AsyncCommandFifo`].

use crate::error::StreamError;
use avcore::{FrameFifo, FrameHandle, PacketFifo, PacketHandle};
use std::sync::Arc;

/// An async-friendly handle to a [`FrameFifo`].
#[derive(Clone)]
pub struct AsyncFrameFifo {
    inner: Arc<FrameFifo>,
}

impl AsyncFrameFifo {
    pub fn new(fifo: FrameFifo) -> Self {
        Self {
            inner: Arc::new(fifo),
        }
    }

    pub fn inner(&self) -> &FrameFifo {
        &self.inner
    }

    pub async fn write(&self, frame: FrameHandle) -> Result<(), StreamError> {
        let fifo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || -> Result<(), StreamError> {
            fifo.wait_write_space()?;
            fifo.write(&frame)?;
            Ok(())
        })
        .await?
    }

    pub async fn read(&self) -> Result<Option<FrameHandle>, StreamError> {
        let fifo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            fifo.wait_read_data()?;
            Ok::<_, StreamError>(fifo.read())
        })
        .await?
    }

    pub fn set_flow_enabled(&self, enabled: bool) {
        self.inner.set_flow_enabled(enabled);
    }
}

/// An async-friendly handle to a [`PacketFifo`].
#[derive(Clone)]
pub struct AsyncPacketFifo {
    inner: Arc<PacketFifo>,
}

impl AsyncPacketFifo {
    pub fn new(fifo: PacketFifo) -> Self {
        Self {
            inner: Arc::new(fifo),
        }
    }

    pub fn inner(&self) -> &PacketFifo {
        &self.inner
    }

    pub async fn write(&self, packet: PacketHandle) -> Result<(), StreamError> {
        let fifo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || -> Result<(), StreamError> {
            fifo.wait_write_space()?;
            fifo.write(&packet)?;
            Ok(())
        })
        .await?
    }

    pub async fn read(&self) -> Result<Option<PacketHandle>, StreamError> {
        let fifo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            fifo.wait_read_data()?;
            Ok::<_, StreamError>(fifo.read())
        })
        .await?
    }

    pub fn set_flow_enabled(&self, enabled: bool) {
        self.inner.set_flow_enabled(enabled);
    }
}
