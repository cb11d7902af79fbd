//! Bounded, thread-safe, semaphore-gated FIFOs and a pooled,
//! reference-counted command object for shuttling heterogeneous pipeline
//! events (media frames, media packets, flush, end-of-stream, seek,
//! configuration) between producer and consumer threads.
//!
//! The stack, leaves first:
//!
//! - [`semaphore`] — [`semaphore::CountingSemaphore`]: Post/Wait/TryWait/WaitTimed/Reset.
//! - [`ring`] — [`ring::CircularBuffer`]: bounded ring, SPSC lock-free or MPMC mutex-guarded.
//! - [`fifo`] — [`fifo::WaitableFifo`]: ring + write/read semaphores + flow-enable gating.
//! - [`refcounted`] — [`refcounted::RefCounted`]: the trait translation of the AddRef/Release interface.
//! - [`command`], [`pool`] — [`command::CommandRef`] + [`pool::CommandPool`]: pooled, refcounted command records.
//! - [`command_fifo`] — [`command_fifo::CommandFifo`]: `WaitableFifo<CommandRef>` with drain-on-drop.
//! - [`media`] — [`media::FrameFifo`] / [`media::PacketFifo`]: typed payload FIFOs.
//!
//! Out of scope: the codec/demux/scale wrapper, capture/render backends, the
//! CLI harness, build/packaging, and UI layer. Those are external
//! collaborators with interfaces only sketched where they touch this core.

mod command;
mod command_fifo;
mod config;
mod fifo;
mod invariants;
mod media;
mod pool;
mod refcounted;
mod ring;
mod semaphore;

pub use command::{CommandKind, CommandRef};
pub use command_fifo::CommandFifo;
pub use config::{PoolConfig, RingConfig};
pub use fifo::{FifoError, WaitableFifo};
pub use media::{FrameData, FrameFifo, FrameHandle, PacketData, PacketFifo, PacketHandle};
pub use pool::CommandPool;
pub use refcounted::RefCounted;
pub use ring::{CircularBuffer, RingMode};
pub use semaphore::CountingSemaphore;
