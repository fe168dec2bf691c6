use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::{PromptView, Rgb};

pub type RoomId = String;
/// Derived from the connection the player joined on
pub type PlayerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum RoomPhase {
    Lobby,
    Playing,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: String,
    pub is_host: bool,
}

/// Full room state as broadcast to every member after a change.
///
/// `roundEndCountdown` is set while the grace countdown runs; the phase
/// stays `playing` during that time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub phase: RoomPhase,
    pub host: String,
    pub players: Vec<Player>,
    pub current_prompt: Option<PromptView>,
    pub target_color: Option<Rgb>,
    pub round_number: u32,
    pub max_rounds: u32,
    pub scores: BTreeMap<String, u32>,
    pub guesses: BTreeMap<String, Rgb>,
    pub round_end_countdown: Option<u32>,
    pub round_started_at: Option<String>, // ISO 8601 string
    pub guess_time_limit_secs: u32,
    pub created_at: String,
}

impl RoomSnapshot {
    pub fn player_by_nickname(&self, nickname: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.nickname == nickname)
    }

    pub fn score_of(&self, nickname: &str) -> u32 {
        self.scores.get(nickname).copied().unwrap_or(0)
    }
}
