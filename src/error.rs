//! Error taxonomy for the quiz core and the submission step.
//!
//! Wrong answers are not errors: they come back as `Outcome::Incorrect` from
//! the engine. Everything here signals caller misuse or an infrastructure fault.

use thiserror::Error;

/// Errors raised by the quiz core (catalog, selector, option builder, engine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuizError {
  /// Session parameters do not fit the catalog. Fatal at start.
  #[error("Configuration error: {0}")]
  Configuration(String),

  /// Operation invoked in a state that does not permit it.
  #[error("Invalid state: cannot {operation} while {state}")]
  InvalidState {
    operation: &'static str,
    state: &'static str,
  },
}

impl QuizError {
  pub fn config(message: impl Into<String>) -> Self {
    Self::Configuration(message.into())
  }

  pub fn invalid_state(operation: &'static str, state: &'static str) -> Self {
    Self::InvalidState { operation, state }
  }
}

/// Errors raised by the session store around the engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
  #[error("Player name must not be empty")]
  EmptyName,

  #[error("Unknown session: {0}")]
  NotFound(String),

  #[error("Session {0} has already been submitted")]
  AlreadySubmitted(String),

  #[error(transparent)]
  Quiz(#[from] QuizError),
}

/// Errors raised while validating or persisting a submission record.
#[derive(Error, Debug)]
pub enum SubmissionError {
  #[error("Missing required field: {0}")]
  MissingField(&'static str),

  #[error("Invalid email address")]
  InvalidEmail,

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error("Storage error: {0}")]
  Storage(String),

  #[error("Upstream store error: {0}")]
  Upstream(String),
}

impl From<std::io::Error> for SubmissionError {
  fn from(e: std::io::Error) -> Self {
    Self::Storage(e.to_string())
  }
}

impl From<serde_json::Error> for SubmissionError {
  fn from(e: serde_json::Error) -> Self {
    Self::Storage(format!("JSON: {e}"))
  }
}
