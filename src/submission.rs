//! Submission records: validation plus the two persistence backends.
//!
//! - `JsonFile`: append to a JSON array on disk (`<data_dir>/users.json`).
//! - `RestTable`: insert one row into a hosted REST table (PostgREST style).
//!
//! Persistence failures are returned to the caller and never touch quiz state.
//! The photo itself is never stored, only whether the player provided one.

use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{QuizError, SubmissionError};
use crate::util::{mask_email, trunc_for_log};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email)
}

/// Stored shape of one completed playthrough.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
  pub id: String,
  pub name: String,
  pub email: String,
  pub score: u32,
  pub date: String,
  pub photo_provided: bool,
}

impl SubmissionRecord {
  /// Validate and assemble a record. `date` defaults to now (RFC 3339, UTC).
  pub fn new(
    name: &str,
    email: &str,
    score: u32,
    date: Option<String>,
    photo_provided: bool,
  ) -> Result<Self, SubmissionError> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
      return Err(SubmissionError::MissingField("name"));
    }
    if email.is_empty() {
      return Err(SubmissionError::MissingField("email"));
    }
    if !is_valid_email(email) {
      return Err(SubmissionError::InvalidEmail);
    }
    let date = date
      .filter(|d| !d.trim().is_empty())
      .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
    Ok(Self {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      email: email.to_string(),
      score,
      date,
      photo_provided,
    })
  }
}

pub enum SubmissionStore {
  JsonFile(JsonFileStore),
  RestTable(RestTableStore),
}

impl SubmissionStore {
  /// Build the configured backend. The REST backend needs `table_url` in config
  /// and `SUBMISSION_API_KEY` in the environment.
  pub fn from_config(cfg: &StorageConfig) -> Result<Self, QuizError> {
    match cfg.backend {
      StorageBackend::JsonFile => Ok(Self::JsonFile(JsonFileStore::new(cfg.data_dir.join(&cfg.file_name)))),
      StorageBackend::RestTable => {
        let url = cfg
          .table_url
          .clone()
          .filter(|u| !u.trim().is_empty())
          .ok_or_else(|| QuizError::config("storage.table_url is required for the rest_table backend"))?;
        let api_key = std::env::var("SUBMISSION_API_KEY")
          .map_err(|_| QuizError::config("SUBMISSION_API_KEY must be set for the rest_table backend"))?;
        let store = RestTableStore::new(url, api_key)
          .map_err(|e| QuizError::config(format!("HTTP client: {e}")))?;
        Ok(Self::RestTable(store))
      }
    }
  }

  pub fn describe(&self) -> String {
    match self {
      Self::JsonFile(s) => format!("json_file:{}", s.path().display()),
      Self::RestTable(s) => format!("rest_table:{}", s.url),
    }
  }

  #[instrument(level = "info", skip(self, rec), fields(id = %rec.id, email = %mask_email(&rec.email), score = rec.score))]
  pub async fn persist(&self, rec: &SubmissionRecord) -> Result<(), SubmissionError> {
    let res = match self {
      Self::JsonFile(s) => s.append(rec).await,
      Self::RestTable(s) => s.insert(rec).await,
    };
    match &res {
      Ok(()) => info!(target: "submission", id = %rec.id, backend = %self.describe(), "Submission stored"),
      Err(e) => error!(target: "submission", id = %rec.id, error = %e, "Submission not stored"),
    }
    res
  }
}

/// Append-only JSON array on local disk. Writes are serialized in-process.
pub struct JsonFileStore {
  path: PathBuf,
  write_lock: Mutex<()>,
}

impl JsonFileStore {
  pub fn new(path: PathBuf) -> Self {
    Self { path, write_lock: Mutex::new(()) }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  async fn append(&self, rec: &SubmissionRecord) -> Result<(), SubmissionError> {
    let _guard = self.write_lock.lock().await;

    if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
      tokio::fs::create_dir_all(dir).await?;
    }

    // Foreign entries are kept as raw JSON so older rows survive a rewrite.
    let mut rows: Vec<serde_json::Value> = match tokio::fs::read_to_string(&self.path).await {
      Ok(s) if s.trim().is_empty() => Vec::new(),
      Ok(s) => match serde_json::from_str(&s) {
        Ok(rows) => rows,
        Err(e) => {
          warn!(target: "submission", path = %self.path.display(), error = %e, "Existing store is not a JSON array; starting fresh");
          Vec::new()
        }
      },
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
      Err(e) => return Err(e.into()),
    };
    rows.push(serde_json::to_value(rec)?);

    let body = serde_json::to_string_pretty(&rows)?;
    let tmp = self.path.with_extension("json.tmp");
    tokio::fs::write(&tmp, body).await?;
    tokio::fs::rename(&tmp, &self.path).await?;
    Ok(())
  }
}

/// Row shape for the hosted table (snake_case columns).
#[derive(Serialize)]
struct TableRow<'a> {
  id: &'a str,
  name: &'a str,
  email: &'a str,
  score: u32,
  date: &'a str,
  photo_provided: bool,
}

/// Inserts one row per submission into a hosted REST table.
pub struct RestTableStore {
  client: reqwest::Client,
  url: String,
  api_key: String,
}

impl RestTableStore {
  pub fn new(url: String, api_key: String) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(10)).build()?;
    Ok(Self { client, url, api_key })
  }

  async fn insert(&self, rec: &SubmissionRecord) -> Result<(), SubmissionError> {
    let row = TableRow {
      id: &rec.id,
      name: &rec.name,
      email: &rec.email,
      score: rec.score,
      date: &rec.date,
      photo_provided: rec.photo_provided,
    };

    let res = self
      .client
      .post(&self.url)
      .header(USER_AGENT, "blockquiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("apikey", &self.api_key)
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .header("Prefer", "return=minimal")
      .json(&row)
      .send()
      .await
      .map_err(|e| SubmissionError::Upstream(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      return Err(SubmissionError::Upstream(format!("HTTP {}: {}", status, trunc_for_log(&body, 200))));
    }
    Ok(())
  }
}
