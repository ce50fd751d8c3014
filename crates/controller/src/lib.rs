//! Orchestration layer: ties the rules engine, the search backends and
//! the external engine bridge together behind the API the presentation
//! layer drives.

pub mod compute;
pub mod controller;

pub use compute::{
    AiScheduler, Completion, ComputeBackend, ComputeOutcome, ComputeRequest, SearchDiagnostics,
};
pub use controller::{
    ControllerConfig, GameController, GameEvent, GameOverReason, PlayerMode,
};
