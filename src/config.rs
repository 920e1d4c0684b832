//! Loading game configuration (round/option counts, storage, optional catalog) from TOML.
//!
//! See `GameConfig` for the expected schema. Every section is optional.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

use crate::catalog::Catalog;
use crate::domain::BuildingBlock;
use crate::error::QuizError;
use crate::logic::{check_option_count, DEFAULT_POINTS_PER_CORRECT};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct GameConfig {
  #[serde(default)]
  pub game: GameSettings,
  #[serde(default)]
  pub storage: StorageConfig,
  #[serde(default)]
  pub sessions: SessionLimits,
  /// Replaces the built-in catalog when non-empty.
  #[serde(default)]
  pub blocks: Vec<BuildingBlock>,
}

/// Per-session parameters handed to the round engine.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GameSettings {
  pub round_count: usize,
  pub option_count: usize,
  pub points_per_correct: u32,
}

impl Default for GameSettings {
  fn default() -> Self {
    Self { round_count: 4, option_count: 4, points_per_correct: DEFAULT_POINTS_PER_CORRECT }
  }
}

impl GameSettings {
  /// Both counts must fit the catalog, since rounds never repeat a block.
  pub fn validate(&self, catalog: &Catalog) -> Result<(), QuizError> {
    if self.round_count == 0 {
      return Err(QuizError::config("round_count must be at least 1"));
    }
    if self.round_count > catalog.len() {
      return Err(QuizError::config(format!(
        "round_count {} exceeds catalog size {}",
        self.round_count,
        catalog.len()
      )));
    }
    check_option_count(catalog, self.option_count)?;
    if self.points_per_correct == 0 {
      return Err(QuizError::config("points_per_correct must be positive"));
    }
    let max_score = u32::try_from(self.round_count)
      .ok()
      .and_then(|rounds| rounds.checked_mul(self.points_per_correct));
    if max_score.is_none() {
      return Err(QuizError::config(format!(
        "{} rounds of {} points overflow the score",
        self.round_count, self.points_per_correct
      )));
    }
    Ok(())
  }
}

/// Bounds on the in-memory session table.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionLimits {
  /// Sessions untouched for this long are dropped on the next sweep.
  pub idle_ttl_secs: u64,
  /// Hard cap; the least recently touched session is evicted to make room.
  pub max_sessions: usize,
}

impl Default for SessionLimits {
  fn default() -> Self {
    Self { idle_ttl_secs: 30 * 60, max_sessions: 10_000 }
  }
}

impl SessionLimits {
  pub fn idle_ttl(&self) -> Duration {
    Duration::from_secs(self.idle_ttl_secs)
  }

  pub fn validate(&self) -> Result<(), QuizError> {
    if self.max_sessions == 0 {
      return Err(QuizError::config("max_sessions must be at least 1"));
    }
    Ok(())
  }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
  /// Append-only JSON array on local disk.
  #[default]
  JsonFile,
  /// Row insert into a hosted REST table.
  RestTable,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  pub backend: StorageBackend,
  pub data_dir: PathBuf,
  pub file_name: String,
  pub table_url: Option<String>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      backend: StorageBackend::JsonFile,
      data_dir: PathBuf::from("data"),
      file_name: "users.json".into(),
      table_url: None,
    }
  }
}

impl GameConfig {
  /// Resolve the catalog: config-supplied blocks if any, else the built-in set.
  pub fn catalog(&self) -> Result<Catalog, QuizError> {
    if self.blocks.is_empty() {
      Ok(Catalog::builtin())
    } else {
      Catalog::from_blocks(self.blocks.clone())
    }
  }

  /// Apply env overrides (DATA_DIR) on top of file/default values.
  pub fn with_env_overrides(mut self) -> Self {
    if let Ok(dir) = std::env::var("DATA_DIR") {
      if !dir.trim().is_empty() {
        self.storage.data_dir = PathBuf::from(dir);
      }
    }
    self
  }
}

/// Attempt to load `GameConfig` from GAME_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_game_config_from_env() -> Option<GameConfig> {
  let path = std::env::var("GAME_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_game_config(&s) {
      Ok(cfg) => {
        info!(target: "blockquiz_backend", %path, "Loaded game config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "blockquiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "blockquiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_game_config(s: &str) -> Result<GameConfig, toml::de::Error> {
  toml::from_str::<GameConfig>(s)
}
