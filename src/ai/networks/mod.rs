mod dqn_network;
mod policy_value_network;

pub use dqn_network::{DqnNetwork, DqnNetworkConfig};
pub use policy_value_network::{PolicyValueNetwork, PolicyValueNetworkConfig};
