//! Model checkpoints and the persisted timesteps counter.

mod manager;
mod metadata;
mod progress;

pub use manager::{
    find_latest_checkpoint, CheckpointManager, CheckpointManagerConfig, ResumeOutcome,
};
pub use metadata::{CheckpointMetadata, CheckpointMetrics, DqnTrainingState, PgTrainingState};
pub use progress::ProgressStore;
