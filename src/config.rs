use std::path::Path;

use crate::ai::algorithms::{DqnConfig, PgConfig};
use crate::checkpoint::CheckpointManagerConfig;
use crate::driver::GameConfig;
use crate::env::RewardConfig;
use crate::error::ConfigError;
use crate::logging::LoggingConfig;
use crate::training::trainer::TrainerConfig;
use crate::ui::OverlayConfig;

/// Top-level application configuration, loadable from TOML.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub game: GameConfig,
    pub env: RewardConfig,
    pub pg: PgConfig,
    pub dqn: DqnConfig,
    pub training: TrainerConfig,
    pub checkpoint: CheckpointManagerConfig,
    pub overlay: OverlayConfig,
    pub logging: LoggingConfig,
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Validation(msg.into())
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`AppConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let game = &self.game;
        if game.height == 0 || game.width == 0 {
            return Err(invalid("game.height and game.width must be > 0"));
        }
        if game.mines >= game.height * game.width {
            return Err(invalid("game.mines must be < game.height * game.width"));
        }
        if !game.cell_selector.contains("{row}") || !game.cell_selector.contains("{col}") {
            return Err(invalid("game.cell_selector must contain {row} and {col}"));
        }

        if self.training.total_timesteps == 0 {
            return Err(invalid("training.total_timesteps must be > 0"));
        }
        if self.training.save_freq == 0 {
            return Err(invalid("training.save_freq must be > 0"));
        }
        if self.training.log_interval == 0 {
            return Err(invalid("training.log_interval must be > 0"));
        }
        if self.training.max_episode_steps == 0 {
            return Err(invalid("training.max_episode_steps must be > 0"));
        }
        if self.overlay.queue_capacity == 0 {
            return Err(invalid("overlay.queue_capacity must be > 0"));
        }

        // DQN
        if self.dqn.learning_rate <= 0.0 {
            return Err(invalid("dqn.learning_rate must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.dqn.gamma) {
            return Err(invalid("dqn.gamma must be in [0, 1]"));
        }
        if self.dqn.batch_size == 0 {
            return Err(invalid("dqn.batch_size must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_start) {
            return Err(invalid("dqn.epsilon_start must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.dqn.epsilon_end) {
            return Err(invalid("dqn.epsilon_end must be in [0, 1]"));
        }
        if self.dqn.epsilon_end > self.dqn.epsilon_start {
            return Err(invalid("dqn.epsilon_end must be <= dqn.epsilon_start"));
        }
        if self.dqn.replay_capacity < self.dqn.batch_size {
            return Err(invalid("dqn.replay_capacity must be >= dqn.batch_size"));
        }
        if self.dqn.min_replay_size < self.dqn.batch_size {
            return Err(invalid("dqn.min_replay_size must be >= dqn.batch_size"));
        }
        if self.dqn.target_update_interval == 0 {
            return Err(invalid("dqn.target_update_interval must be > 0"));
        }

        // PPO
        if self.pg.learning_rate <= 0.0 {
            return Err(invalid("pg.learning_rate must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.pg.gamma) {
            return Err(invalid("pg.gamma must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.pg.gae_lambda) {
            return Err(invalid("pg.gae_lambda must be in [0, 1]"));
        }
        if self.pg.ppo_epsilon <= 0.0 {
            return Err(invalid("pg.ppo_epsilon must be > 0"));
        }
        if self.pg.ppo_epochs == 0 {
            return Err(invalid("pg.ppo_epochs must be > 0"));
        }
        if self.pg.entropy_coeff < 0.0 {
            return Err(invalid("pg.entropy_coeff must be >= 0"));
        }
        if self.pg.value_coeff < 0.0 {
            return Err(invalid("pg.value_coeff must be >= 0"));
        }
        if self.pg.max_grad_norm <= 0.0 {
            return Err(invalid("pg.max_grad_norm must be > 0"));
        }

        Ok(())
    }

    /// TOML with every default filled in, for writing a starter config file.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&AppConfig::default()).expect("default config serializes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ClassScheme;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        AppConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = AppConfig::default();
        assert_eq!((config.game.height, config.game.width, config.game.mines), (8, 8, 10));
        assert_eq!(config.training.total_timesteps, 10_000_000);
        assert_eq!(config.training.save_freq, 100_000);
        assert_eq!(config.dqn.replay_capacity, 10_000);
        assert_eq!(config.env.win_reward, 1000.0);
        assert_eq!(config.logging.level, "warn");
        assert!(!config.training.mask_illegal_actions);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let toml_str = r#"
[game]
height = 16
width = 30
mines = 99
class_scheme = "hd"

[dqn]
learning_rate = 0.001
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.game.width, 30);
        assert_eq!(config.game.class_scheme, ClassScheme::Hd);
        assert!((config.dqn.learning_rate - 0.001).abs() < 1e-9);
        assert!((config.dqn.gamma - 0.99).abs() < 1e-6);
        assert_eq!(config.training.save_freq, 100_000);
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        let default = AppConfig::default();
        assert_eq!(config.training.total_timesteps, default.training.total_timesteps);
        assert_eq!(config.game.url(), default.game.url());
    }

    #[test]
    fn test_unknown_class_scheme_is_parse_error() {
        let err = toml::from_str::<AppConfig>("[game]\nclass_scheme = \"fancy\"\n").unwrap_err();
        assert!(err.to_string().contains("fancy"));
    }

    #[test]
    fn test_validation_rejects_empty_grid() {
        let mut config = AppConfig::default();
        config.game.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_too_many_mines() {
        let mut config = AppConfig::default();
        config.game.mines = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_selector_without_placeholders() {
        let mut config = AppConfig::default();
        config.game.cell_selector = "#cell".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_save_freq() {
        let mut config = AppConfig::default();
        config.training.save_freq = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_queue_capacity() {
        let mut config = AppConfig::default();
        config.overlay.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_negative_lr() {
        let mut config = AppConfig::default();
        config.dqn.learning_rate = -0.001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_invalid_gamma() {
        let mut config = AppConfig::default();
        config.pg.gamma = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_epsilon_end_gt_start() {
        let mut config = AppConfig::default();
        config.dqn.epsilon_start = 0.1;
        config.dqn.epsilon_end = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_min_replay_lt_batch() {
        let mut config = AppConfig::default();
        config.dqn.min_replay_size = 10;
        config.dqn.batch_size = 64;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_ppo_epochs_zero() {
        let mut config = AppConfig::default();
        config.pg.ppo_epochs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_max_grad_norm_zero() {
        let mut config = AppConfig::default();
        config.pg.max_grad_norm = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(config.training.total_timesteps, 10_000_000);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
[training]
save_freq = 500
mask_illegal_actions = true

[checkpoint]
checkpoint_dir = "runs"
"#
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.training.save_freq, 500);
        assert!(config.training.mask_illegal_actions);
        assert_eq!(config.checkpoint.checkpoint_dir, Path::new("runs"));
        assert!((config.dqn.learning_rate - 1e-4).abs() < 1e-9);
    }

    #[test]
    fn test_load_invalid_file_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[game]\nmines = 1000\n").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_default_toml_roundtrips() {
        let toml_str = AppConfig::default_toml();
        let config: AppConfig = toml::from_str(&toml_str).unwrap();
        config.validate().expect("roundtripped config should be valid");
        assert!(toml_str.contains("[overlay]"));
    }
}
