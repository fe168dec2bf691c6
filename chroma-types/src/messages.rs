use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::{RoomId, RoomSnapshot, Rgb};

/// Commands sent by a client, framed as `{ "type": ..., "payload": ... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ClientMessage {
    CreateRoom {
        nickname: String,
    },
    JoinRoom {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        nickname: String,
    },
    StartGame {
        nickname: String,
    },
    SubmitGuess {
        nickname: String,
        guess: GuessInput,
    },
    EndRound {},
    CloseLobby {
        nickname: String,
    },
    ExitLobby {
        nickname: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ServerMessage {
    RoomCreated {
        #[serde(rename = "roomId")]
        room_id: RoomId,
        #[serde(rename = "gameState")]
        game_state: RoomSnapshot,
    },
    GameStateUpdate(RoomSnapshot),
    RoundEndCountdown {
        #[serde(rename = "secondsRemaining")]
        seconds_remaining: u32,
    },
    Error {
        message: String,
    },
    Alert {
        message: String,
    },
}

/// A guess as typed into the client form. Channels arrive either as numbers or
/// as the raw input strings; a blank field counts as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessInput {
    #[ts(type = "number | string")]
    pub r: Channel,
    #[ts(type = "number | string")]
    pub g: Channel,
    #[ts(type = "number | string")]
    pub b: Channel,
}

impl From<GuessInput> for Rgb {
    fn from(input: GuessInput) -> Self {
        Rgb::new(input.r.0, input.g.0, input.b.0)
    }
}

impl From<Rgb> for GuessInput {
    fn from(rgb: Rgb) -> Self {
        GuessInput {
            r: Channel(rgb.r),
            g: Channel(rgb.g),
            b: Channel(rgb.b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Channel(pub u8);

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ChannelVisitor)
    }
}

struct ChannelVisitor;

impl<'de> Visitor<'de> for ChannelVisitor {
    type Value = Channel;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a color channel between 0 and 255")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Channel, E> {
        u8::try_from(value)
            .map(Channel)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Channel, E> {
        u8::try_from(value)
            .map(Channel)
            .map_err(|_| E::invalid_value(Unexpected::Signed(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Channel, E> {
        if value.fract() == 0.0 && (0.0..=255.0).contains(&value) {
            Ok(Channel(value as u8))
        } else {
            Err(E::invalid_value(Unexpected::Float(value), &self))
        }
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Channel, E> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Ok(Channel(0));
        }
        trimmed
            .parse::<u8>()
            .map(Channel)
            .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))
    }
}
