//! Round engine: the state machine that drives one quiz session.
//!
//! States: `NotStarted` -> `InRound(i)` -> ... -> `Completed`.
//!
//! - `start` fixes the round list once and enters round 0.
//! - `submit_attempt` scores against the active target; a correct answer adds
//!   points and advances, a wrong one leaves everything untouched.
//! - Options for a round are built on entry and kept until the round is left,
//!   so retries see the same tiles in the same order.
//!
//! The engine owns its random source and is driven synchronously by the caller.
//! It holds no locks: callers sharing one engine across tasks must serialize access.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::config::GameSettings;
use crate::domain::{AttemptResult, BuildingBlock, Outcome, Round};
use crate::error::QuizError;
use crate::logic::{build_options, evaluate, select_rounds};

#[derive(Clone, Debug)]
enum Phase {
  NotStarted,
  InRound { index: usize, round: Round },
  Completed,
}

impl Phase {
  fn name(&self) -> &'static str {
    match self {
      Phase::NotStarted => "not started",
      Phase::InRound { .. } => "in round",
      Phase::Completed => "completed",
    }
  }
}

/// Read-only view of a session for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
  pub current_index: usize,
  pub round_count: usize,
  pub score: u32,
  pub completed: bool,
  pub round: Option<Round>,
}

pub struct RoundEngine<R> {
  catalog: Arc<Catalog>,
  settings: GameSettings,
  rng: R,
  round_list: Vec<BuildingBlock>,
  score: u32,
  phase: Phase,
}

impl<R: Rng> RoundEngine<R> {
  pub fn new(catalog: Arc<Catalog>, settings: GameSettings, rng: R) -> Self {
    Self {
      catalog,
      settings,
      rng,
      round_list: Vec::new(),
      score: 0,
      phase: Phase::NotStarted,
    }
  }

  /// `NotStarted -> InRound(0)`. Validates settings against the catalog first.
  #[instrument(level = "debug", skip(self), fields(rounds = self.settings.round_count, options = self.settings.option_count))]
  pub fn start(&mut self) -> Result<(), QuizError> {
    if !matches!(self.phase, Phase::NotStarted) {
      return Err(QuizError::invalid_state("start", self.phase.name()));
    }
    self.settings.validate(&self.catalog)?;

    self.round_list = select_rounds(&self.catalog, self.settings.round_count, &mut self.rng)?;
    self.phase = self.build_round(0)?;
    info!(target: "quiz", rounds = self.round_list.len(), "Session started");
    Ok(())
  }

  /// Score one drop. Only valid while a round is active.
  #[instrument(level = "debug", skip_all, fields(%attempted_id))]
  pub fn submit_attempt(&mut self, attempted_id: &str) -> Result<AttemptResult, QuizError> {
    let (index, target_id) = match &self.phase {
      Phase::InRound { index, round } => (*index, round.target.id.clone()),
      other => return Err(QuizError::invalid_state("submit an attempt", other.name())),
    };

    let ev = evaluate(attempted_id, &target_id, self.settings.points_per_correct);
    if ev.outcome == Outcome::Correct {
      let score = self
        .score
        .checked_add(ev.score_delta)
        .ok_or_else(|| QuizError::config("score overflow"))?;
      // Next round is built before score or phase change.
      let next = index + 1;
      let phase = if next < self.round_list.len() {
        self.build_round(next)?
      } else {
        Phase::Completed
      };
      self.score = score;
      self.phase = phase;
      if self.is_completed() {
        info!(target: "quiz", score = self.score, "Session completed");
      }
    } else {
      debug!(target: "quiz", index, "Incorrect attempt; round stays active");
    }

    Ok(AttemptResult {
      outcome: ev.outcome,
      score_delta: ev.score_delta,
      score: self.score,
      current_index: self.current_index(),
      completed: self.is_completed(),
    })
  }

  fn build_round(&mut self, index: usize) -> Result<Phase, QuizError> {
    let target = self.round_list[index].clone();
    let options = build_options(&self.catalog, &target, self.settings.option_count, &mut self.rng)?;
    debug!(target: "quiz", index, target = %target.id, "Round built");
    Ok(Phase::InRound { index, round: Round { target, options } })
  }
}

impl<R> RoundEngine<R> {
  /// Active round (target + memoized options). Only valid while in a round.
  pub fn current_round(&self) -> Result<&Round, QuizError> {
    match &self.phase {
      Phase::InRound { round, .. } => Ok(round),
      other => Err(QuizError::invalid_state("read the current round", other.name())),
    }
  }

  pub fn current_index(&self) -> usize {
    match &self.phase {
      Phase::NotStarted => 0,
      Phase::InRound { index, .. } => *index,
      Phase::Completed => self.round_list.len(),
    }
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  pub fn is_completed(&self) -> bool {
    matches!(self.phase, Phase::Completed)
  }

  /// Configured number of rounds for this session.
  pub fn round_count(&self) -> usize {
    self.settings.round_count
  }

  pub fn snapshot(&self) -> SessionSnapshot {
    SessionSnapshot {
      current_index: self.current_index(),
      round_count: self.round_count(),
      score: self.score,
      completed: self.is_completed(),
      round: self.current_round().ok().cloned(),
    }
  }
}
