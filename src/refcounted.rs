//! [`RefCounted`]: the trait translation of the two-function-pointer vtable
//! in spec.md §4.4/§9 — "use a trait/interface with AddRef/Release methods;
//! keep the vtable pointer model if the payload type must be heterogeneous."
//! `CommandFifo` carries `Frame`/`Packet`/sentinel payloads in one FIFO, so
//! the heterogeneous case applies: payloads are boxed as `dyn RefCounted`.

/// A payload that can be shared by reference count across `Command`s and
/// other holders. `add_ref` is the Rust reading of "AddRef returns a new,
/// independent handle sharing the same backing data" (spec.md §9, Open
/// Question 5): both the original and the returned box own a real reference,
/// so releasing either is always safe, and the backing data is freed only
/// when the last one drops.
///
/// `Release` from the source has no explicit analogue here: dropping the
/// `Box<dyn RefCounted>` *is* Release, and the final teardown on the last
/// reference happens in the concrete type's own `Drop`.
pub trait RefCounted: Send + Sync {
    /// Produces a new, independent handle to the same backing data.
    fn add_ref(&self) -> Box<dyn RefCounted>;
}
