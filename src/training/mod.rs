//! Training driver: the learn loop with its progress/checkpoint callbacks,
//! metrics, the replay buffer, evaluation runs and the status feed to the overlay.

pub mod episode;
pub mod metrics;
pub mod replay_buffer;
pub mod results_log;
pub mod status_feed;
pub mod trainer;
