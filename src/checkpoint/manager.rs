use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ai::{ModelType, TrainableAgent};
use crate::checkpoint::metadata::{CheckpointMetadata, CheckpointMetrics};
use crate::checkpoint::progress::{write_atomic, ProgressStore};
use crate::error::CheckpointError;

const WEIGHTS_EXT: &str = "mpk";
const STEPS_SUFFIX: &str = "_steps";

/// `[checkpoint]` section.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CheckpointManagerConfig {
    /// Root; each model type gets its own subdirectory.
    pub checkpoint_dir: PathBuf,
    /// Periodic checkpoints to keep. 0 keeps all.
    pub keep_last_n: usize,
}

impl Default for CheckpointManagerConfig {
    fn default() -> Self {
        CheckpointManagerConfig {
            checkpoint_dir: PathBuf::from("checkpoints"),
            keep_last_n: 5,
        }
    }
}

/// How [`CheckpointManager::resume_or_fresh`] came by its agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeOutcome {
    Resumed(PathBuf),
    NoCheckpoint,
    /// The agent is fresh but the progress counter keeps its stored value.
    LoadFailed(PathBuf),
}

impl ResumeOutcome {
    pub fn is_resumed(&self) -> bool {
        matches!(self, ResumeOutcome::Resumed(_))
    }
}

/// Saves, finds, loads and prunes one model type's checkpoints.
///
/// Layout inside `dir`:
/// ```text
/// progress.json
/// PPO_model_100000_steps.mpk    weights
/// PPO_model_100000_steps.json   metadata + training state
/// PPO_model_final_200000.mpk    end-of-cycle snapshot
/// ```
pub struct CheckpointManager {
    dir: PathBuf,
    prefix: String,
    keep_last_n: usize,
}

impl CheckpointManager {
    pub fn new(config: &CheckpointManagerConfig, model: ModelType) -> Self {
        Self::with_dir(
            config.checkpoint_dir.join(model.name()),
            model.checkpoint_prefix(),
            config.keep_last_n,
        )
    }

    pub fn with_dir(dir: impl Into<PathBuf>, prefix: impl Into<String>, keep_last_n: usize) -> Self {
        CheckpointManager {
            dir: dir.into(),
            prefix: prefix.into(),
            keep_last_n,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The cumulative-timesteps counter kept beside the checkpoints.
    pub fn progress(&self) -> ProgressStore {
        ProgressStore::in_dir(&self.dir)
    }

    /// Periodic save named after the callback's call count.
    pub fn save_checkpoint(
        &self,
        agent: &dyn TrainableAgent,
        metrics: &CheckpointMetrics,
        n_calls: u64,
    ) -> Result<PathBuf, CheckpointError> {
        let stem = self.dir.join(format!("{}_{}{}", self.prefix, n_calls, STEPS_SUFFIX));
        let path = self.save_as(&stem, agent, metrics, n_calls)?;
        self.prune()?;
        Ok(path)
    }

    /// End-of-cycle snapshot named after the progress counter. Never pruned.
    pub fn save_final(
        &self,
        agent: &dyn TrainableAgent,
        metrics: &CheckpointMetrics,
        progress: u64,
    ) -> Result<PathBuf, CheckpointError> {
        let stem = self.dir.join(format!("{}_final_{}", self.prefix, progress));
        self.save_as(&stem, agent, metrics, progress)
    }

    fn save_as(
        &self,
        stem: &Path,
        agent: &dyn TrainableAgent,
        metrics: &CheckpointMetrics,
        timesteps: u64,
    ) -> Result<PathBuf, CheckpointError> {
        fs::create_dir_all(&self.dir)?;

        agent
            .save_weights(stem)
            .map_err(|e| CheckpointError::ModelSave(e.to_string()))?;

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let metadata = CheckpointMetadata {
            algorithm: agent.algorithm_name().to_string(),
            timesteps,
            timestamp,
            metrics: metrics.clone(),
            training_state: agent.training_state()?,
        };
        let meta_json = serde_json::to_string_pretty(&metadata)?;
        write_atomic(&stem.with_extension("json"), meta_json.as_bytes())?;

        let weights = stem.with_extension(WEIGHTS_EXT);
        tracing::info!(path = %weights.display(), timesteps, "checkpoint saved");
        Ok(weights)
    }

    /// Most recently modified weights file for this model, if any.
    pub fn latest(&self) -> Result<Option<PathBuf>, CheckpointError> {
        find_latest_checkpoint(&self.dir, &self.prefix)
    }

    /// Load weights and, when the sidecar exists, training state.
    pub fn load_into(
        &self,
        agent: &mut dyn TrainableAgent,
        path: &Path,
    ) -> Result<Option<CheckpointMetadata>, CheckpointError> {
        if !path.exists() {
            return Err(CheckpointError::NotFound {
                dir: self.dir.clone(),
                prefix: path.display().to_string(),
            });
        }
        agent
            .load_weights(path)
            .map_err(|e| CheckpointError::ModelLoad(e.to_string()))?;

        let sidecar = path.with_extension("json");
        let content = match fs::read_to_string(&sidecar) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %sidecar.display(), "no training state beside checkpoint");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let metadata: CheckpointMetadata = serde_json::from_str(&content)?;
        agent.restore_training_state(metadata.training_state.clone())?;
        Ok(Some(metadata))
    }

    /// Agent loaded from the latest checkpoint, or a fresh one from `fresh`.
    ///
    /// Load failures are logged and never propagated. A half-loaded agent is
    /// discarded, and the progress counter is left alone.
    pub fn resume_or_fresh<F>(&self, fresh: F) -> (Box<dyn TrainableAgent>, ResumeOutcome)
    where
        F: Fn() -> Box<dyn TrainableAgent>,
    {
        let path = match self.latest() {
            Ok(Some(path)) => path,
            Ok(None) => {
                tracing::info!(dir = %self.dir.display(), "no checkpoint found, starting fresh");
                return (fresh(), ResumeOutcome::NoCheckpoint);
            }
            Err(e) => {
                tracing::error!(dir = %self.dir.display(), error = %e, "listing checkpoints");
                return (fresh(), ResumeOutcome::NoCheckpoint);
            }
        };
        let progress = self.progress().load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "progress counter unreadable");
            0
        });

        let mut agent = fresh();
        match self.load_into(agent.as_mut(), &path) {
            Ok(_) => {
                tracing::info!(path = %path.display(), progress, "resumed from checkpoint");
                (agent, ResumeOutcome::Resumed(path))
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "loading checkpoint");
                tracing::warn!(
                    progress,
                    "model restarts from scratch while the progress counter is kept"
                );
                (fresh(), ResumeOutcome::LoadFailed(path))
            }
        }
    }

    /// Periodic checkpoints, oldest first.
    pub fn list_checkpoints(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        let mut found: Vec<(SystemTime, u64, PathBuf)> = matching_weights(&self.dir, &self.prefix)?
            .into_iter()
            .filter_map(|(mtime, path)| {
                let steps = self.steps_of(&path)?;
                Some((mtime, steps, path))
            })
            .collect();
        found.sort();
        Ok(found.into_iter().map(|(_, _, p)| p).collect())
    }

    fn steps_of(&self, path: &Path) -> Option<u64> {
        let stem = path.file_stem()?.to_str()?;
        stem.strip_prefix(self.prefix.as_str())?
            .strip_prefix('_')?
            .strip_suffix(STEPS_SUFFIX)?
            .parse()
            .ok()
    }

    fn prune(&self) -> Result<(), CheckpointError> {
        if self.keep_last_n == 0 {
            return Ok(());
        }
        let checkpoints = self.list_checkpoints()?;
        let excess = checkpoints.len().saturating_sub(self.keep_last_n);
        for path in &checkpoints[..excess] {
            tracing::debug!(path = %path.display(), "pruning checkpoint");
            fs::remove_file(path)?;
            let sidecar = path.with_extension("json");
            if sidecar.exists() {
                fs::remove_file(sidecar)?;
            }
        }
        Ok(())
    }
}

/// Every `<prefix>*.mpk` file in `dir` with its modification time.
fn matching_weights(dir: &Path, prefix: &str) -> Result<Vec<(SystemTime, PathBuf)>, CheckpointError> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if !name.starts_with(prefix) || path.extension().map_or(true, |ext| ext != WEIGHTS_EXT) {
            continue;
        }
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }
        found.push((meta.modified()?, path));
    }
    Ok(found)
}

/// The most recently modified file in `dir` whose name starts with `prefix`
/// and ends in `.mpk`. `Ok(None)` when there is none or `dir` is missing.
pub fn find_latest_checkpoint(dir: &Path, prefix: &str) -> Result<Option<PathBuf>, CheckpointError> {
    Ok(matching_weights(dir, prefix)?
        .into_iter()
        .max()
        .map(|(_, path)| path))
}
