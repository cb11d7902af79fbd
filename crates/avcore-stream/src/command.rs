//! `AsyncCommandFifo`: async sugar over [`avcore::CommandFifo`].
//!
//! Per spec.md §9 option (a): "wait-on-background-thread then invoke the
//! sync API" is strictly optional convenience over the blocking core. Each
//! async method hands the blocking call to `spawn_blocking` and awaits it —
//! the core contracts (flow-disable semantics, ownership transfer) are
//! untouched.

use crate::error::StreamError;
use avcore::{CommandFifo, CommandRef};
use std::sync::Arc;

/// An async-friendly handle to a [`CommandFifo`]. Cheap to clone — it's an
/// `Arc` around the shared FIFO.
#[derive(Clone)]
pub struct AsyncCommandFifo {
    inner: Arc<CommandFifo>,
}

impl AsyncCommandFifo {
    pub fn new(fifo: CommandFifo) -> Self {
        Self {
            inner: Arc::new(fifo),
        }
    }

    pub fn inner(&self) -> &CommandFifo {
        &self.inner
    }

    /// Waits for write space, then writes `command`, on a blocking thread.
    pub async fn write(&self, command: CommandRef) -> Result<(), StreamError> {
        let fifo = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || -> Result<(), StreamError> {
            fifo.wait_write_space()?;
            fifo.write(command)?;
            Ok(())
        })
        .await?
    }

    /// Waits for read data, then reads one Command, on a blocking thread.
    pub async fn read(&self) -> Result<Option<CommandRef>, StreamError> {
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

    pub fn stored_count(&self) -> usize {
        self.inner.stored_count()
    }
}
