use chroma_core::{ColorCatalog, Room, RoomError, RoomRules, RoundSummary};
use chroma_types::{Player, Rgb, RoomId, RoomSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::broadcast::{BroadcastGateway, member_connections};
use crate::round_timer::{CountdownTick, RoundCountdown, run_countdown};
use crate::websocket::connection::{ConnectionId, ConnectionManager};

pub const LOBBY_CLOSED_MESSAGE: &str = "The lobby has been closed by the host.";
pub const HOST_LEFT_MESSAGE: &str = "The host has left the lobby.";

const ROOM_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ROOM_ID_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub rules: RoomRules,
    pub countdown_seconds: u32,
    /// Length of one countdown unit
    pub countdown_tick: Duration,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            rules: RoomRules::default(),
            countdown_seconds: 5,
            countdown_tick: Duration::from_secs(1),
        }
    }
}

impl RoomSettings {
    /// Rejects rules no room could finish a game under
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rules.max_rounds == 0 {
            anyhow::bail!("A game needs at least one round");
        }
        if self.rules.min_players_to_start < 2 {
            anyhow::bail!(
                "A game needs at least two players to start, got {}",
                self.rules.min_players_to_start
            );
        }
        Ok(())
    }
}

struct ActiveRoom {
    room: Room,
    countdown: Option<RoundCountdown>,
}

impl ActiveRoom {
    fn new(room: Room) -> Self {
        Self {
            room,
            countdown: None,
        }
    }

    fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }
}

impl Drop for ActiveRoom {
    fn drop(&mut self) {
        self.cancel_countdown();
    }
}

struct RegistryState {
    rooms: HashMap<RoomId, ActiveRoom>,
    connection_to_room: HashMap<ConnectionId, RoomId>,
    rng: StdRng,
}

impl RegistryState {
    fn bound_room_mut(&mut self, connection_id: ConnectionId) -> Result<&mut ActiveRoom, RoomError> {
        let room_id = self
            .connection_to_room
            .get(&connection_id)
            .ok_or(RoomError::NotInRoom)?;
        self.rooms.get_mut(room_id).ok_or(RoomError::NotInRoom)
    }

    fn generate_room_id(&mut self) -> RoomId {
        loop {
            let id: RoomId = (0..ROOM_ID_LEN)
                .map(|_| ROOM_ID_ALPHABET[self.rng.gen_range(0..ROOM_ID_ALPHABET.len())] as char)
                .collect();
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Owns every live room and the connection -> room binding.
///
/// All state sits behind one async mutex. Each command, countdown tick and
/// disconnect holds it for the whole mutate-then-broadcast step, so commands
/// never interleave and every member of a room sees the same message order.
pub struct RoomRegistry {
    state: Mutex<RegistryState>,
    catalog: ColorCatalog,
    settings: RoomSettings,
    gateway: BroadcastGateway,
    self_ref: Weak<RoomRegistry>,
}

impl RoomRegistry {
    pub fn new(
        catalog: ColorCatalog,
        settings: RoomSettings,
        connection_manager: Arc<ConnectionManager>,
    ) -> anyhow::Result<Arc<Self>> {
        Self::build(catalog, settings, connection_manager, StdRng::from_entropy())
    }

    /// Same as `new` but with reproducible room ids and color sequences
    pub fn with_seed(
        catalog: ColorCatalog,
        settings: RoomSettings,
        connection_manager: Arc<ConnectionManager>,
        seed: u64,
    ) -> anyhow::Result<Arc<Self>> {
        Self::build(
            catalog,
            settings,
            connection_manager,
            StdRng::seed_from_u64(seed),
        )
    }

    fn build(
        catalog: ColorCatalog,
        settings: RoomSettings,
        connection_manager: Arc<ConnectionManager>,
        rng: StdRng,
    ) -> anyhow::Result<Arc<Self>> {
        settings.validate()?;
        catalog.ensure_supports(settings.rules.max_rounds)?;

        Ok(Arc::new_cyclic(|self_ref| Self {
            state: Mutex::new(RegistryState {
                rooms: HashMap::new(),
                connection_to_room: HashMap::new(),
                rng,
            }),
            catalog,
            settings,
            gateway: BroadcastGateway::new(connection_manager),
            self_ref: self_ref.clone(),
        }))
    }

    pub async fn create_room(
        &self,
        connection_id: ConnectionId,
        nickname: String,
    ) -> Result<RoomId, RoomError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        self.detach_connection(state, connection_id).await;

        let room_id = state.generate_room_id();
        let colors = self
            .catalog
            .draw(self.settings.rules.max_rounds as usize, &mut state.rng);
        let room = Room::new(
            room_id.clone(),
            connection_id.into(),
            nickname,
            colors,
            self.settings.rules.clone(),
        )?;

        info!("Room {} created by {} ({})", room_id, room.host(), connection_id);
        self.gateway.room_created(connection_id, &room).await;

        state.connection_to_room.insert(connection_id, room_id.clone());
        state.rooms.insert(room_id.clone(), ActiveRoom::new(room));

        Ok(room_id)
    }

    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
        nickname: String,
    ) -> Result<Player, RoomError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let not_found = || RoomError::RoomNotFound {
            room_id: room_id.to_string(),
        };

        if !state.rooms.contains_key(room_id) {
            return Err(not_found());
        }

        self.detach_connection(state, connection_id).await;

        // Leaving may have destroyed the target, e.g. a host re-joining their own room
        let active = state.rooms.get_mut(room_id).ok_or_else(not_found)?;
        let player = active.room.add_player(connection_id.into(), nickname);
        state
            .connection_to_room
            .insert(connection_id, room_id.to_string());

        info!(
            "{} ({}) joined room {} ({} players)",
            player.nickname,
            connection_id,
            room_id,
            active.room.players().len()
        );
        self.gateway.room_state(&active.room).await;

        Ok(player)
    }

    pub async fn start_game(
        &self,
        connection_id: ConnectionId,
        nickname: &str,
    ) -> Result<(), RoomError> {
        let mut guard = self.state.lock().await;
        let active = guard.bound_room_mut(connection_id)?;

        if !requester(&active.room, connection_id, nickname)?.is_host {
            return Err(RoomError::Unauthorized);
        }
        active.room.start_game(nickname)?;

        info!(
            "Room {} started with {} players",
            active.room.id(),
            active.room.players().len()
        );
        self.gateway.room_state(&active.room).await;

        Ok(())
    }

    pub async fn submit_guess(
        &self,
        connection_id: ConnectionId,
        nickname: &str,
        guess: Rgb,
    ) -> Result<(), RoomError> {
        let mut guard = self.state.lock().await;
        let active = guard.bound_room_mut(connection_id)?;

        requester(&active.room, connection_id, nickname)?;
        let outcome = active.room.submit_guess(nickname, guess)?;
        debug!(
            "Room {} round {}: guess from {} (all guessed: {})",
            active.room.id(),
            active.room.round_number(),
            nickname,
            outcome.all_guessed
        );

        if active.room.needs_countdown() {
            self.arm_countdown(active);
        }
        self.gateway.room_state(&active.room).await;

        Ok(())
    }

    /// Close the current round immediately, cancelling any pending countdown
    pub async fn end_round(&self, connection_id: ConnectionId) -> Result<RoundSummary, RoomError> {
        let mut guard = self.state.lock().await;
        let active = guard.bound_room_mut(connection_id)?;

        let summary = active.room.close_round()?;
        active.cancel_countdown();

        log_round_closed(&active.room, &summary);
        self.gateway.room_state(&active.room).await;

        Ok(summary)
    }

    pub async fn close_room(
        &self,
        connection_id: ConnectionId,
        nickname: &str,
    ) -> Result<(), RoomError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let active = state.bound_room_mut(connection_id)?;

        if !requester(&active.room, connection_id, nickname)?.is_host {
            return Err(RoomError::Unauthorized);
        }
        let room_id = active.room.id().to_string();

        info!("Room {} closed by host {}", room_id, nickname);
        self.destroy_room(state, &room_id, Some(LOBBY_CLOSED_MESSAGE))
            .await;

        Ok(())
    }

    /// Detach a connection from its room, if any. Safe to call repeatedly.
    pub async fn remove_connection(&self, connection_id: ConnectionId) {
        let mut guard = self.state.lock().await;
        self.detach_connection(&mut guard, connection_id).await;
    }

    pub async fn room_snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        let state = self.state.lock().await;
        state.rooms.get(room_id).map(|active| active.room.snapshot())
    }

    pub async fn room_of(&self, connection_id: ConnectionId) -> Option<RoomId> {
        let state = self.state.lock().await;
        state.connection_to_room.get(&connection_id).cloned()
    }

    pub async fn has_pending_countdown(&self, room_id: &str) -> bool {
        let state = self.state.lock().await;
        state
            .rooms
            .get(room_id)
            .is_some_and(|active| active.countdown.is_some())
    }

    pub async fn room_count(&self) -> usize {
        let state = self.state.lock().await;
        state.rooms.len()
    }

    /// Drop every room and cancel every countdown
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let rooms = state.rooms.len();
        state.rooms.clear();
        state.connection_to_room.clear();
        info!("Room registry shut down ({} rooms dropped)", rooms);
    }

    /// One step of a room's round-end countdown, called by the timer task
    pub(crate) async fn countdown_tick(
        &self,
        room_id: &str,
        round: u32,
        remaining: u32,
    ) -> CountdownTick {
        let mut guard = self.state.lock().await;
        let Some(active) = guard.rooms.get_mut(room_id) else {
            return CountdownTick::Finished;
        };
        if active.countdown.as_ref().map(RoundCountdown::round) != Some(round) {
            return CountdownTick::Finished;
        }

        active.room.set_countdown(remaining);
        self.gateway.countdown(&active.room, remaining).await;
        if remaining > 0 {
            return CountdownTick::Continue;
        }

        // The calling task is about to finish; release the handle without aborting it
        active.countdown = None;
        match active.room.close_round() {
            Ok(summary) => log_round_closed(&active.room, &summary),
            Err(e) => warn!("Countdown for room {} could not close the round: {}", room_id, e),
        }
        self.gateway.room_state(&active.room).await;

        CountdownTick::Finished
    }

    fn arm_countdown(&self, active: &mut ActiveRoom) {
        let round = active.room.round_number();
        let seconds = self.settings.countdown_seconds;
        active.room.set_countdown(seconds);

        let task = tokio::spawn(run_countdown(
            self.self_ref.clone(),
            active.room.id().to_string(),
            round,
            seconds,
            self.settings.countdown_tick,
        ));
        active.countdown = Some(RoundCountdown::new(round, task.abort_handle()));

        info!(
            "Room {} round {}: everyone has guessed, closing in {}",
            active.room.id(),
            round,
            seconds
        );
    }

    async fn detach_connection(&self, state: &mut RegistryState, connection_id: ConnectionId) {
        let Some(room_id) = state.connection_to_room.remove(&connection_id) else {
            return;
        };
        let Some(active) = state.rooms.get_mut(&room_id) else {
            return;
        };
        let Some(player) = active.room.remove_player(connection_id.into()) else {
            return;
        };

        info!("{} ({}) left room {}", player.nickname, connection_id, room_id);

        if player.is_host {
            self.destroy_room(state, &room_id, Some(HOST_LEFT_MESSAGE))
                .await;
        } else if active.room.is_empty() {
            self.destroy_room(state, &room_id, None).await;
        } else {
            // The leaver may have been the last one without a guess
            if active.room.needs_countdown() {
                self.arm_countdown(active);
            }
            self.gateway.room_state(&active.room).await;
        }
    }

    async fn destroy_room(&self, state: &mut RegistryState, room_id: &str, alert: Option<&str>) {
        let Some(mut active) = state.rooms.remove(room_id) else {
            return;
        };
        active.cancel_countdown();

        let members = member_connections(&active.room);
        for member in &members {
            if state.connection_to_room.get(member).map(String::as_str) == Some(room_id) {
                state.connection_to_room.remove(member);
            }
        }

        if let Some(text) = alert {
            self.gateway.alert(&members, text).await;
        }

        info!("Room {} destroyed", room_id);
    }
}

/// The player bound to `connection_id`, provided the command names them
fn requester<'a>(
    room: &'a Room,
    connection_id: ConnectionId,
    nickname: &str,
) -> Result<&'a Player, RoomError> {
    room.player(connection_id.into())
        .filter(|player| player.nickname == nickname)
        .ok_or(RoomError::NotInRoom)
}

fn log_round_closed(room: &Room, summary: &RoundSummary) {
    info!(
        "Room {} closed round {} (target {}): {:?}{}",
        room.id(),
        summary.round,
        summary.target.to_css(),
        summary.points_awarded,
        if summary.game_over { ", game over" } else { "" }
    );
}
