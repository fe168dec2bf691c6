use chroma_types::RoomId;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::registry::RoomRegistry;

/// Handle to a room's pending round-end countdown. Owned by the room entry
/// in the registry; dropping the room entry cancels it.
#[derive(Debug)]
pub struct RoundCountdown {
    round: u32,
    handle: AbortHandle,
}

impl RoundCountdown {
    pub fn new(round: u32, handle: AbortHandle) -> Self {
        Self { round, handle }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn cancel(self) {
        self.handle.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    Continue,
    Finished,
}

/// Ticks once per `tick`, reporting `seconds, seconds - 1, ..., 0` to the
/// registry. The registry closes the round on the zero tick.
pub(crate) async fn run_countdown(
    registry: Weak<RoomRegistry>,
    room_id: RoomId,
    round: u32,
    seconds: u32,
    tick: Duration,
) {
    let mut interval = tokio::time::interval(tick.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    let mut remaining = seconds;
    loop {
        interval.tick().await;

        let Some(registry) = registry.upgrade() else {
            return;
        };
        if registry.countdown_tick(&room_id, round, remaining).await == CountdownTick::Finished {
            return;
        }
        remaining = remaining.saturating_sub(1);
    }
}
