mod agent;
pub mod algorithms;
pub mod networks;
mod random;
pub mod state_encoding;

pub use agent::{candidate_actions, Agent, EvalState, Experience, TrainableAgent, UpdateMetrics};
pub use algorithms::{new_agent, DqnAgent, DqnConfig, ModelType, PgConfig, PolicyGradientAgent};
pub use networks::{DqnNetwork, DqnNetworkConfig, PolicyValueNetwork, PolicyValueNetworkConfig};
pub use random::RandomAgent;

/// Inference backend. CPU by default, GPU with the `wgpu` feature.
#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu<f32, i32>;
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray<f32>;

pub type TrainBackend = burn::backend::Autodiff<InferBackend>;
