//! Topologically-ordered pipeline lifecycle shell (spec.md §4.8).
//!
//! A [`Graph`] wires [`Component`]s by [`Connection`]s between typed
//! [`Port`]s, then sequences `prepare`/`start`/`pause`/`stop` across them
//! using Kahn's algorithm over the connection graph: `start` runs in
//! reverse topological order (sinks ready before sources produce), `pause`
//! and `stop` run forward (sources first). Components expose a
//! [`ParamSet`] addressed by the `componentId.parameterKey` dotted path
//! from spec.md §6.
//!
//! This is a shell only — it knows nothing about FFmpeg, Metal, or HDMI
//! (spec.md §1 Non-goals); a `Component` implementation supplies that.

mod component;
mod error;
mod graph;
mod params;

pub use component::{Component, ComponentRole, MediaKind, Port, PortDirection};
pub use error::GraphError;
pub use graph::{Connection, Graph, GraphState};
pub use params::{ParamSet, ParamValidation, ParamValue};
