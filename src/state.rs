//! Application state: catalog, validated game settings, player sessions, submission store.
//!
//! This module owns:
//!   - the block catalog (built-in or from TOML)
//!   - the game settings every new session starts with
//!   - live player sessions keyed by id (one `RoundEngine` each)
//!   - the submission store used once a session completes
//!
//! Each session is only ever touched under the store's write lock, which
//! serializes attempts for that session in arrival order.
//!
//! Sessions leave the table when abandoned, once successfully submitted, or
//! when a sweep on session start finds them idle past the TTL or over the cap.

use std::{collections::HashMap, sync::Arc, time::Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::config::{load_game_config_from_env, GameConfig, GameSettings, SessionLimits};
use crate::domain::AttemptResult;
use crate::engine::{RoundEngine, SessionSnapshot};
use crate::error::{QuizError, SessionError, SubmissionError};
use crate::protocol::SubmitIn;
use crate::submission::{SubmissionRecord, SubmissionStore};

pub struct PlayerSession {
    pub player_name: String,
    pub engine: RoundEngine<StdRng>,
    pub submitted: bool,
    pub last_touched: Instant,
}

pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub settings: GameSettings,
    pub sessions: RwLock<HashMap<String, PlayerSession>>,
    pub limits: SessionLimits,
    pub store: SubmissionStore,
}

impl AppState {
    /// Build state from env: load config, resolve catalog, validate settings, open store.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, QuizError> {
        let cfg = load_game_config_from_env()
            .unwrap_or_default()
            .with_env_overrides();
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: GameConfig) -> Result<Self, QuizError> {
        let catalog = cfg.catalog()?;
        cfg.game.validate(&catalog)?;
        cfg.sessions.validate()?;
        let store = SubmissionStore::from_config(&cfg.storage)?;
        Ok(Self::new(catalog, cfg.game, store).with_session_limits(cfg.sessions))
    }

    pub fn new(catalog: Catalog, settings: GameSettings, store: SubmissionStore) -> Self {
        let mut by_category: HashMap<&str, usize> = HashMap::new();
        for b in catalog.all() {
            *by_category.entry(b.category.as_str()).or_default() += 1;
        }
        for (category, count) in &by_category {
            info!(target: "quiz", %category, count, "Catalog inventory");
        }
        info!(
            target: "blockquiz_backend",
            blocks = catalog.len(),
            rounds = settings.round_count,
            options = settings.option_count,
            points = settings.points_per_correct,
            store = %store.describe(),
            "Game state ready"
        );

        Self {
            catalog: Arc::new(catalog),
            settings,
            sessions: RwLock::new(HashMap::new()),
            limits: SessionLimits::default(),
            store,
        }
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        info!(
            target: "blockquiz_backend",
            idle_ttl_secs = limits.idle_ttl_secs,
            max_sessions = limits.max_sessions,
            "Session limits set"
        );
        self.limits = limits;
        self
    }

    /// Drop idle sessions, then evict the least recently touched ones until
    /// there is room for one more.
    fn sweep(&self, sessions: &mut HashMap<String, PlayerSession>, now: Instant) {
        let before = sessions.len();
        let ttl = self.limits.idle_ttl();
        sessions.retain(|_, s| now.saturating_duration_since(s.last_touched) < ttl);
        let expired = before - sessions.len();

        let mut evicted = 0usize;
        while sessions.len() >= self.limits.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_touched)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    evicted += 1;
                }
                None => break,
            }
        }
        if expired + evicted > 0 {
            info!(target: "quiz", expired, evicted, live = sessions.len(), "Swept sessions");
        }
    }

    /// Start a fresh session for `name`. A seed pins the randomness (replays, tests).
    #[instrument(level = "info", skip(self, name), fields(name_len = name.len()))]
    pub async fn start_session(
        &self,
        name: &str,
        seed: Option<u64>,
    ) -> Result<(String, String, SessionSnapshot), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let mut engine = RoundEngine::new(self.catalog.clone(), self.settings, rng);
        engine.start()?;

        let id = Uuid::new_v4().to_string();
        let snap = engine.snapshot();
        let now = Instant::now();
        let session = PlayerSession {
            player_name: name.to_string(),
            engine,
            submitted: false,
            last_touched: now,
        };
        let mut sessions = self.sessions.write().await;
        self.sweep(&mut sessions, now);
        sessions.insert(id.clone(), session);
        drop(sessions);
        info!(target: "quiz", session = %id, seeded = seed.is_some(), "Session created");
        Ok((id, name.to_string(), snap))
    }

    #[instrument(level = "info", skip_all, fields(%session_id, %block_id))]
    pub async fn submit_attempt(
        &self,
        session_id: &str,
        block_id: &str,
    ) -> Result<(AttemptResult, String, SessionSnapshot), SessionError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        if self.catalog.get(block_id).is_none() {
            debug!(target: "quiz", session = %session_id, %block_id, "Attempt with unknown block id");
        }
        s.last_touched = Instant::now();
        let result = s.engine.submit_attempt(block_id)?;
        info!(
            target: "quiz",
            session = %session_id,
            outcome = ?result.outcome,
            score = result.score,
            index = result.current_index,
            completed = result.completed,
            "Attempt evaluated"
        );
        Ok((result, s.player_name.clone(), s.engine.snapshot()))
    }

    pub async fn session_snapshot(&self, session_id: &str) -> Result<(String, SessionSnapshot), SessionError> {
        let mut sessions = self.sessions.write().await;
        let s = sessions
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        s.last_touched = Instant::now();
        Ok((s.player_name.clone(), s.engine.snapshot()))
    }

    /// Drop a session. The engine holds no external resources.
    #[instrument(level = "info", skip_all, fields(%session_id))]
    pub async fn abandon_session(&self, session_id: &str) -> Result<(), SessionError> {
        match self.sessions.write().await.remove(session_id) {
            Some(_) => {
                info!(target: "quiz", session = %session_id, "Session abandoned");
                Ok(())
            }
            None => Err(SessionError::NotFound(session_id.to_string())),
        }
    }

    /// Validate and persist a submission.
    ///
    /// With a `sessionId`, the session must be completed and not yet submitted;
    /// its engine score replaces whatever the client reported. A stored
    /// submission ends the session. Storage failures are returned and leave the
    /// session open for a retry.
    #[instrument(level = "info", skip(self, body), fields(session = ?body.session_id))]
    pub async fn submit_record(&self, body: SubmitIn) -> Result<SubmissionRecord, SubmissionError> {
        let photo_provided = body.photo.as_deref().map_or(false, |p| !p.is_empty());

        // Claim the session before persisting so concurrent submits cannot both pass.
        let score = match &body.session_id {
            Some(sid) => {
                let mut sessions = self.sessions.write().await;
                let s = sessions
                    .get_mut(sid)
                    .ok_or_else(|| SessionError::NotFound(sid.clone()))?;
                if !s.engine.is_completed() {
                    return Err(SessionError::from(QuizError::invalid_state("submit", "in round")).into());
                }
                if s.submitted {
                    return Err(SessionError::AlreadySubmitted(sid.clone()).into());
                }
                if s.engine.score() != body.score {
                    warn!(target: "submission", session = %sid, reported = body.score, actual = s.engine.score(), "Client score differs from session; using session score");
                }
                s.submitted = true;
                s.engine.score()
            }
            None => body.score,
        };

        let stored = match SubmissionRecord::new(&body.name, &body.email, score, body.date, photo_provided) {
            Ok(rec) => self.store.persist(&rec).await.map(|_| rec),
            Err(e) => Err(e),
        };

        if let Some(sid) = &body.session_id {
            let mut sessions = self.sessions.write().await;
            if stored.is_ok() {
                sessions.remove(sid);
                debug!(target: "quiz", session = %sid, "Session closed after submission");
            } else if let Some(s) = sessions.get_mut(sid) {
                s.submitted = false;
            }
        }
        stored
    }
}
