//! `CommandFifo`: a `WaitableFifo<CommandRef>` with ownership-transfer
//! semantics and drain-on-drop (spec.md §4.6).

use crate::command::CommandRef;
use crate::config::RingConfig;
use crate::fifo::{FifoError, WaitableFifo};

/// `WaitableFifo<CommandRef>`. Write transfers one reference from the caller
/// into the FIFO; read transfers it back out. On drop, flow is disabled and
/// every remaining Command is read out and released (freeing payloads and
/// returning slots to their pools) so no Command is ever silently leaked.
pub struct CommandFifo {
    inner: WaitableFifo<CommandRef>,
}

impl CommandFifo {
    pub fn new(config: RingConfig) -> Self {
        let inner = WaitableFifo::new(config, true, 0);
        inner.set_flow_enabled(true);
        Self { inner }
    }

    /// Transfers ownership of `command` into the FIFO.
    pub fn write(&self, command: CommandRef) -> Result<(), FifoError> {
        self.inner.write(command)
    }

    /// As [`CommandFifo::write`], inserting at the head.
    pub fn preempt(&self, command: CommandRef) -> Result<(), FifoError> {
        self.inner.preempt(command)
    }

    /// Transfers ownership of the next Command to the caller.
    pub fn read(&self) -> Option<CommandRef> {
        self.inner.read()
    }

    pub fn wait_write_space(&self) -> Result<(), FifoError> {
        self.inner.wait_write_space()
    }

    pub fn wait_read_data(&self) -> Result<(), FifoError> {
        self.inner.wait_read_data()
    }

    pub fn set_flow_enabled(&self, enabled: bool) {
        self.inner.set_flow_enabled(enabled);
    }

    pub fn flow_enabled(&self) -> bool {
        self.inner.flow_enabled()
    }

    pub fn stored_count(&self) -> usize {
        self.inner.stored_count()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl Drop for CommandFifo {
    fn drop(&mut self) {
        self.inner.set_flow_enabled(false);
        while let Some(command) = self.inner.read() {
            drop(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandKind;
    use crate::config::PoolConfig;
    use crate::pool::CommandPool;
    use crate::ring::RingMode;

    #[test]
    fn write_then_read_transfers_ownership() {
        let fifo = CommandFifo::new(RingConfig::new(4, RingMode::Mpmc));
        let pool = CommandPool::new(PoolConfig::new(1, 0));
        let cmd = pool.acquire().unwrap();
        cmd.init(CommandKind::Frame);
        fifo.write(cmd).unwrap();
        let read_back = fifo.read().unwrap();
        assert_eq!(read_back.kind(), CommandKind::Frame);
    }

    #[test]
    fn s3_eos_sentinel_drains_a_paused_consumer() {
        let fifo = CommandFifo::new(RingConfig::new(4, RingMode::Mpmc));
        let pool = CommandPool::new(PoolConfig::new(4, 0));

        let frame = pool.acquire().unwrap();
        frame.init(CommandKind::Frame);
        fifo.write(frame).unwrap();

        let eos = pool.acquire().unwrap();
        eos.init(CommandKind::EndOfStream);
        fifo.write(eos).unwrap();

        fifo.set_flow_enabled(false);

        let first = fifo.read().unwrap();
        assert!(first.is_media());
        assert_eq!(first.kind(), CommandKind::Frame);
        drop(first);

        let second = fifo.read().unwrap();
        assert!(second.is_sentinel());
        assert_eq!(second.kind(), CommandKind::EndOfStream);
        drop(second);

        assert_eq!(pool.in_use_count(), 0);
    }

    #[test]
    fn drop_drains_and_releases_remaining_commands() {
        let pool = CommandPool::new(PoolConfig::new(2, 0));
        {
            let fifo = CommandFifo::new(RingConfig::new(4, RingMode::Mpmc));
            let cmd = pool.acquire().unwrap();
            cmd.init(CommandKind::Packet);
            fifo.write(cmd).unwrap();
        }
        assert_eq!(pool.in_use_count(), 0);
    }
}
