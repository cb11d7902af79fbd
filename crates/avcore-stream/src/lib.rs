//! Async sugar over `avcore`'s blocking FIFO API.
//!
//! Each wrapper here hands its blocking call to `tokio::task::spawn_blocking`
//! and awaits it; none of the core contracts in `avcore` change — this crate
//! adds nothing but convenience for callers already on a tokio runtime
//! (spec.md §9, option (a)).

mod command;
mod error;
mod media;

pub use command::AsyncCommandFifo;
pub use error::StreamError;
pub use media::{AsyncFrameFifo, AsyncPacketFifo};
