//! Space-colonization growth engine for 2-D branching structures.
//!
//! Main components:
//! - [`attractor`]: attraction points and the append-only pool.
//! - [`claims`]: per-node claim sets keyed by attractor identity.
//! - [`tree`]: the node arena, initialization and attractor insertion.
//! - [`phases`]: the attraction and growth phases and the combined step.
//! - [`cull`]: tail culling that bounds rendering cost.
//! - [`run`]: iteration budget for a scheduler driving the growth.
//! - [`config`]: tunables passed to every entry point.
//! - [`error`]: error type and result alias.
//! - [`types`]: shared id aliases.

pub mod attractor;
pub mod claims;
pub mod config;
pub mod cull;
pub mod error;
pub mod phases;
pub mod run;
pub mod tree;
pub mod types;

pub use config::Config;
pub use cull::cull_tail;
pub use error::{Result, SimError};
pub use phases::{StepReport, step};
pub use run::GrowthRun;
pub use tree::{Node, Tree};
