//! Core quiz behaviors used by the round engine:
//!   - selecting the ordered list of rounds for a session
//!   - building the drag candidates (target + distractors) for a round
//!   - evaluating an attempt against the round's target
//!
//! All randomness comes from the caller-supplied `rng`; these functions never
//! touch a global generator, so tests can pin a seed.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, instrument};

use crate::catalog::Catalog;
use crate::domain::{BuildingBlock, Evaluation, Outcome};
use crate::error::QuizError;

/// Default reward for a correct answer.
pub const DEFAULT_POINTS_PER_CORRECT: u32 = 10;

/// Uniform random permutation of the catalog (Fisher-Yates), truncated to `round_count`.
#[instrument(level = "debug", skip(catalog, rng), fields(catalog_len = catalog.len()))]
pub fn select_rounds<R: Rng + ?Sized>(
  catalog: &Catalog,
  round_count: usize,
  rng: &mut R,
) -> Result<Vec<BuildingBlock>, QuizError> {
  if round_count > catalog.len() {
    return Err(QuizError::config(format!(
      "round_count {} exceeds catalog size {}",
      round_count,
      catalog.len()
    )));
  }
  let mut order = catalog.all().to_vec();
  order.shuffle(rng);
  order.truncate(round_count);
  debug!(target: "quiz", rounds = ?order.iter().map(|b| b.id.as_str()).collect::<Vec<_>>(), "Rounds selected");
  Ok(order)
}

/// Target plus `option_count - 1` distinct distractors, uniformly shuffled.
#[instrument(level = "debug", skip(catalog, target, rng), fields(target = %target.id))]
pub fn build_options<R: Rng + ?Sized>(
  catalog: &Catalog,
  target: &BuildingBlock,
  option_count: usize,
  rng: &mut R,
) -> Result<Vec<BuildingBlock>, QuizError> {
  check_option_count(catalog, option_count)?;

  let pool: Vec<&BuildingBlock> = catalog.all().iter().filter(|b| b.id != target.id).collect();
  let mut options: Vec<BuildingBlock> = pool
    .choose_multiple(rng, option_count - 1)
    .map(|b| (*b).clone())
    .collect();
  options.push(target.clone());
  options.shuffle(rng);
  Ok(options)
}

/// `Correct` iff the ids match. Ids outside the round are simply `Incorrect`.
pub fn evaluate(attempted_id: &str, target_id: &str, points_per_correct: u32) -> Evaluation {
  if attempted_id == target_id {
    Evaluation { outcome: Outcome::Correct, score_delta: points_per_correct }
  } else {
    Evaluation { outcome: Outcome::Incorrect, score_delta: 0 }
  }
}

pub fn check_option_count(catalog: &Catalog, option_count: usize) -> Result<(), QuizError> {
  if option_count == 0 {
    return Err(QuizError::config("option_count must be at least 1"));
  }
  if option_count > catalog.len() {
    return Err(QuizError::config(format!(
      "option_count {} exceeds catalog size {}",
      option_count,
      catalog.len()
    )));
  }
  Ok(())
}
