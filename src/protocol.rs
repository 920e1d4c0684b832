//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! The round's target id never leaves the server; clients only see the
//! description to match and the candidate tiles.

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::domain::{AttemptResult, BuildingBlock, Outcome, Round};
use crate::engine::SessionSnapshot;
use crate::util::short_name;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartGame {
        name: String,
        #[serde(default)]
        seed: Option<u64>,
    },
    SubmitAttempt {
        #[serde(rename = "sessionId")]
        session_id: String,
        #[serde(rename = "blockId")]
        block_id: String,
    },
    GetRound {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session {
        session: SessionOut,
    },
    AttemptResult {
        result: AttemptOut,
    },
    Error {
        message: String,
    },
}

/// Tile shown to the player as a drag candidate.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockOut {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub category: String,
    pub image_ref: String,
}

impl From<&BuildingBlock> for BlockOut {
    fn from(b: &BuildingBlock) -> Self {
        Self {
            id: b.id.clone(),
            name: b.name.clone(),
            short_name: short_name(&b.name).to_string(),
            category: b.category.clone(),
            image_ref: b.image_ref.clone(),
        }
    }
}

/// Full catalog entry, for the block listing endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntryOut {
    #[serde(flatten)]
    pub block: BlockOut,
    pub description: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogOut {
    pub blocks: Vec<CatalogEntryOut>,
}

pub fn catalog_out(catalog: &Catalog) -> CatalogOut {
    CatalogOut {
        blocks: catalog
            .all()
            .iter()
            .map(|b| CatalogEntryOut { block: b.into(), description: b.description.clone() })
            .collect(),
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundOut {
    pub index: usize,
    pub description: String,
    pub category: String,
    pub options: Vec<BlockOut>,
}

fn round_out(index: usize, r: &Round) -> RoundOut {
    RoundOut {
        index,
        description: r.target.description.clone(),
        category: r.target.category.clone(),
        options: r.options.iter().map(BlockOut::from).collect(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub session_id: String,
    pub player_name: String,
    pub current_index: usize,
    pub round_count: usize,
    pub score: u32,
    pub completed: bool,
    /// Percentage of rounds cleared, 0..=100.
    pub progress: f32,
    pub round: Option<RoundOut>,
}

pub fn session_out(session_id: &str, player_name: &str, snap: &SessionSnapshot) -> SessionOut {
    let progress = if snap.round_count == 0 {
        0.0
    } else {
        snap.current_index as f32 / snap.round_count as f32 * 100.0
    };
    SessionOut {
        session_id: session_id.to_string(),
        player_name: player_name.to_string(),
        current_index: snap.current_index,
        round_count: snap.round_count,
        score: snap.score,
        completed: snap.completed,
        progress,
        round: snap.round.as_ref().map(|r| round_out(snap.current_index, r)),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub outcome: Outcome,
    pub correct: bool,
    pub score_delta: u32,
    pub session: SessionOut,
}

pub fn attempt_out(result: &AttemptResult, session: SessionOut) -> AttemptOut {
    AttemptOut {
        outcome: result.outcome,
        correct: result.outcome == Outcome::Correct,
        score_delta: result.score_delta,
        session,
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct StartIn {
    pub name: String,
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptIn {
    #[serde(rename = "blockId")]
    pub block_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitIn {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub score: u32,
    #[serde(default)]
    pub date: Option<String>,
    /// Captured photo (data URL). Only its presence is recorded.
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOut {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_out_hides_target_and_reports_progress() {
        let cat = Catalog::builtin();
        let target = cat.all()[0].clone();
        let round = Round { target: target.clone(), options: cat.all()[..4].to_vec() };
        let snap = SessionSnapshot { current_index: 1, round_count: 4, score: 10, completed: false, round: Some(round) };

        let out = session_out("s-1", "Ana", &snap);
        assert_eq!(out.progress, 25.0);
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["sessionId"], "s-1");
        assert_eq!(json["round"]["description"], target.description.as_str());
        assert!(json["round"].get("target").is_none());
        assert_eq!(json["round"]["options"][0]["shortName"], "Educator");
    }

    #[test]
    fn ws_messages_use_snake_case_tags() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"submit_attempt","sessionId":"s","blockId":"ed"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::SubmitAttempt { ref block_id, .. } if block_id == "ed"));

        let out = serde_json::to_value(ServerWsMessage::Pong).unwrap();
        assert_eq!(out["type"], "pong");
    }

    #[test]
    fn submit_in_tolerates_missing_fields() {
        let body: SubmitIn = serde_json::from_str(r#"{"name":"Ana"}"#).unwrap();
        assert_eq!(body.email, "");
        assert_eq!(body.score, 0);
        assert!(body.photo.is_none());
    }
}
