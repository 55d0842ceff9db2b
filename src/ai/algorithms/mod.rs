mod dqn;
mod policy_gradient;

pub use dqn::{DqnAgent, DqnConfig};
pub use policy_gradient::{PgConfig, PolicyGradientAgent};

use std::fmt;

use super::agent::TrainableAgent;

/// Learning algorithm chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    Ppo,
    Dqn,
}

impl ModelType {
    /// Case-insensitive; anything other than PPO or DQN is `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "PPO" => Some(ModelType::Ppo),
            "DQN" => Some(ModelType::Dqn),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelType::Ppo => "PPO",
            ModelType::Dqn => "DQN",
        }
    }

    /// File-name prefix shared by every checkpoint of this model.
    pub fn checkpoint_prefix(self) -> String {
        format!("{}_model", self.name())
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fresh, untrained agent for an H x W board.
pub fn new_agent(
    model: ModelType,
    pg: &PgConfig,
    dqn: &DqnConfig,
    height: usize,
    width: usize,
    mask_illegal: bool,
) -> Box<dyn TrainableAgent> {
    match model {
        ModelType::Ppo => {
            Box::new(PolicyGradientAgent::new(pg.clone(), height, width).with_action_masking(mask_illegal))
        }
        ModelType::Dqn => Box::new(DqnAgent::new(dqn.clone(), height, width).with_action_masking(mask_illegal)),
    }
}
