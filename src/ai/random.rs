use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use super::agent::{candidate_actions, Agent};
use crate::env::Observation;

/// Picks uniformly among the offered cells.
pub struct RandomAgent {
    rng: StdRng,
    mask_illegal: bool,
}

impl RandomAgent {
    pub fn new(mask_illegal: bool) -> Self {
        RandomAgent {
            rng: StdRng::from_os_rng(),
            mask_illegal,
        }
    }
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Agent for RandomAgent {
    fn select_action(&mut self, observation: &Observation, _training: bool) -> usize {
        let actions = candidate_actions(observation, self.mask_illegal);
        let idx = self.rng.random_range(0..actions.len());
        actions[idx]
    }

    fn name(&self) -> &str {
        "Random"
    }
}
