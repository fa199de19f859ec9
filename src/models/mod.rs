pub mod config;
pub mod event;
pub mod job;
pub mod plan;
pub mod room;

pub use config::{AdjacencyPreference, MunicipalProfile, NormalizedSpec, ProjectConfig, RoomRequirement};
pub use event::ProgressEvent;
pub use job::{Job, JobProgress, JobStatus};
pub use plan::{Critique, FloorPlanGraph, GeneratedPlan, IterationRecord, PlanScore, Violation};
pub use room::{Classification, EnrichedRoom, Room, Sector};
