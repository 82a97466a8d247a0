pub mod models;
pub mod reclaim;
pub mod registry;
pub mod runner;

pub use models::create_model;
pub use reclaim::{create_reclaimer, reclaim_best_effort, MemoryReclaimer, NoopReclaimer};
pub use registry::{Capability, CapabilityStatus, ModelRegistry};
pub use runner::InferenceRunner;

pub mod prelude {
    pub use super::{InferenceRunner, MemoryReclaimer, ModelRegistry};
    pub use brief_core::{CapabilityKind, Error, InferenceModel, Result};
}
