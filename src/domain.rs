//! Domain models: building blocks, rounds, and attempt outcomes.

use serde::{Deserialize, Serialize};

/// One catalog entry shown to the player. Immutable once the catalog is built.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildingBlock {
  pub id: String,
  pub name: String,
  pub description: String,
  pub category: String,
  pub image_ref: String,
}

/// One question instance: the block to identify plus the drag candidates.
/// `options` holds `target` exactly once and no duplicate ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
  pub target: BuildingBlock,
  pub options: Vec<BuildingBlock>,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Correct,
  Incorrect,
}

/// Result of scoring a single attempt against a target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Evaluation {
  pub outcome: Outcome,
  pub score_delta: u32,
}

/// What the engine reports back after `submit_attempt`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptResult {
  pub outcome: Outcome,
  pub score_delta: u32,
  pub score: u32,
  pub current_index: usize,
  pub completed: bool,
}
