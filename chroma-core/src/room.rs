use chrono::{DateTime, Utc};
use chroma_types::{ColorPrompt, Player, PlayerId, PromptView, Rgb, RoomId, RoomPhase, RoomSnapshot};
use std::collections::BTreeMap;

use crate::{RoomError, ScoringEngine};

/// Game rules fixed when a room is created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRules {
    pub max_rounds: u32,
    pub min_players_to_start: usize,
    pub guess_time_limit_secs: u32,
}

impl Default for RoomRules {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            min_players_to_start: 2,
            guess_time_limit_secs: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessOutcome {
    /// Every current player has a guess on record for this round
    pub all_guessed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub round: u32,
    pub target: Rgb,
    pub points_awarded: BTreeMap<String, u32>,
    pub game_over: bool,
}

/// Authoritative state of one room. All mutation goes through the methods
/// below; the registry never touches fields directly.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    phase: RoomPhase,
    host: String,
    players: Vec<Player>,
    color_sequence: Vec<ColorPrompt>,
    round_number: u32,
    guesses: BTreeMap<String, Rgb>,
    scores: BTreeMap<String, u32>,
    rules: RoomRules,
    round_end_countdown: Option<u32>,
    round_started_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Room {
    pub fn new(
        id: RoomId,
        host_id: PlayerId,
        host_nickname: String,
        color_sequence: Vec<ColorPrompt>,
        rules: RoomRules,
    ) -> Result<Self, RoomError> {
        if rules.max_rounds == 0 {
            return Err(RoomError::InvariantViolation("A game needs at least one round"));
        }
        if rules.min_players_to_start < 2 {
            return Err(RoomError::InvariantViolation(
                "A game needs at least two players to start",
            ));
        }
        if color_sequence.len() < rules.max_rounds as usize {
            return Err(RoomError::InvariantViolation(
                "Color sequence shorter than the round count",
            ));
        }

        let host = Player {
            id: host_id,
            nickname: host_nickname.clone(),
            is_host: true,
        };

        Ok(Self {
            id,
            phase: RoomPhase::Lobby,
            host: host_nickname,
            players: vec![host],
            color_sequence,
            round_number: 0,
            guesses: BTreeMap::new(),
            scores: BTreeMap::new(),
            rules,
            round_end_countdown: None,
            round_started_at: None,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn max_rounds(&self) -> u32 {
        self.rules.max_rounds
    }

    pub fn guesses(&self) -> &BTreeMap<String, Rgb> {
        &self.guesses
    }

    pub fn scores(&self) -> &BTreeMap<String, u32> {
        &self.scores
    }

    pub fn round_end_countdown(&self) -> Option<u32> {
        self.round_end_countdown
    }

    pub fn current_prompt(&self) -> Option<&ColorPrompt> {
        if self.phase != RoomPhase::Playing || self.round_number == 0 {
            return None;
        }
        self.color_sequence.get(self.round_number as usize - 1)
    }

    pub fn target_color(&self) -> Option<Rgb> {
        self.current_prompt().map(|prompt| prompt.rgb)
    }

    /// Append a non-host player. Joining mid-game starts the newcomer at 0 points.
    pub fn add_player(&mut self, player_id: PlayerId, nickname: String) -> Player {
        let player = Player {
            id: player_id,
            nickname,
            is_host: false,
        };

        if self.phase == RoomPhase::Playing {
            self.scores.entry(player.nickname.clone()).or_insert(0);
        }

        self.players.push(player.clone());
        player
    }

    /// Remove a player. Their guess is dropped unless another player shares the nickname.
    pub fn remove_player(&mut self, player_id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        let player = self.players.remove(index);

        if !self.players.iter().any(|p| p.nickname == player.nickname) {
            self.guesses.remove(&player.nickname);
        }

        Some(player)
    }

    pub fn start_game(&mut self, requester: &str) -> Result<(), RoomError> {
        if self.phase != RoomPhase::Lobby {
            return Err(RoomError::InvariantViolation("Game already started"));
        }
        if requester != self.host {
            return Err(RoomError::Unauthorized);
        }
        if self.players.len() < self.rules.min_players_to_start {
            return Err(RoomError::InvariantViolation("Not enough players to start"));
        }

        self.phase = RoomPhase::Playing;
        self.round_number = 1;
        self.guesses.clear();
        self.scores.clear();
        for player in &self.players {
            self.scores.insert(player.nickname.clone(), 0);
        }
        self.round_started_at = Some(Utc::now());

        Ok(())
    }

    /// Record or overwrite a guess for the current round
    pub fn submit_guess(&mut self, nickname: &str, guess: Rgb) -> Result<GuessOutcome, RoomError> {
        if self.phase != RoomPhase::Playing {
            return Err(RoomError::InvariantViolation(
                "Guesses are only accepted while playing",
            ));
        }
        if !self.players.iter().any(|p| p.nickname == nickname) {
            return Err(RoomError::NotInRoom);
        }

        self.guesses.insert(nickname.to_string(), guess);

        Ok(GuessOutcome {
            all_guessed: self.all_guessed(),
        })
    }

    pub fn all_guessed(&self) -> bool {
        !self.players.is_empty()
            && self
                .players
                .iter()
                .all(|p| self.guesses.contains_key(&p.nickname))
    }

    /// True once every player has guessed and no countdown is pending yet
    pub fn needs_countdown(&self) -> bool {
        self.phase == RoomPhase::Playing && self.round_end_countdown.is_none() && self.all_guessed()
    }

    pub fn set_countdown(&mut self, remaining: u32) {
        self.round_end_countdown = Some(remaining);
    }

    /// Score every recorded guess against the round target and advance.
    /// Players without a guess are left untouched.
    pub fn close_round(&mut self) -> Result<RoundSummary, RoomError> {
        let target = self
            .target_color()
            .ok_or(RoomError::InvariantViolation("No round in progress"))?;

        let mut points_awarded = BTreeMap::new();
        for (nickname, guess) in std::mem::take(&mut self.guesses) {
            let points = ScoringEngine::calculate_score(guess, target);
            *self.scores.entry(nickname.clone()).or_insert(0) += points;
            points_awarded.insert(nickname, points);
        }

        let round = self.round_number;
        self.round_end_countdown = None;

        let game_over = round >= self.rules.max_rounds;
        if game_over {
            self.phase = RoomPhase::Ended;
            self.round_started_at = None;
        } else {
            self.round_number += 1;
            self.round_started_at = Some(Utc::now());
        }

        Ok(RoundSummary {
            round,
            target,
            points_awarded,
            game_over,
        })
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id.clone(),
            phase: self.phase,
            host: self.host.clone(),
            players: self.players.clone(),
            current_prompt: self.current_prompt().map(PromptView::from),
            target_color: self.target_color(),
            round_number: self.round_number,
            max_rounds: self.rules.max_rounds,
            scores: self.scores.clone(),
            guesses: self.guesses.clone(),
            round_end_countdown: self.round_end_countdown,
            round_started_at: self.round_started_at.map(|t| t.to_rfc3339()),
            guess_time_limit_secs: self.rules.guess_time_limit_secs,
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
