//! JSON messages exchanged with room clients.

use serde::{Deserialize, Serialize};

use super::errors::GatewayError;
use crate::game::{PlayerAction, SeatIndex, Settlement, TableSnapshot};

/// Messages a client sends, tagged by `action`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Take a seat. `chips` falls back to the room's default buy-in.
    Join {
        #[serde(default)]
        chips: Option<i64>,
    },
    /// Deal the next hand (host only)
    Start,
    /// Act on the current hand
    Move {
        #[serde(rename = "move")]
        kind: PlayerAction,
        #[serde(default)]
        amount: i64,
    },
    /// Ask for a personal snapshot
    GetState,
}

impl ClientMessage {
    pub fn from_json(text: &str) -> Result<Self, GatewayError> {
        serde_json::from_str(text).map_err(|e| GatewayError::Protocol(e.to_string()))
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Start => "start",
            Self::Move { .. } => "move",
            Self::GetState => "get_state",
        }
    }
}

/// Messages the server pushes, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Joined {
        player_id: SeatIndex,
        players_count: usize,
    },
    PlayerJoined {
        player_id: SeatIndex,
        players_count: usize,
    },
    GameStarted {
        state: Box<TableSnapshot>,
    },
    Update {
        state: Box<TableSnapshot>,
    },
    HandComplete {
        state: Box<TableSnapshot>,
        result: Box<Settlement>,
    },
    State {
        state: Box<TableSnapshot>,
    },
    Error {
        message: String,
    },
    PlayerLeft {
        players_count: usize,
    },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Inbound Parsing Tests ===

    #[test]
    fn test_parse_join() {
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"join","chips":1500}"#).expect("parse"),
            ClientMessage::Join { chips: Some(1500) }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"join"}"#).expect("parse"),
            ClientMessage::Join { chips: None }
        );
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"move","move":"raise","amount":300}"#)
                .expect("parse"),
            ClientMessage::Move {
                kind: PlayerAction::Raise,
                amount: 300
            }
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"move","move":"check"}"#).expect("parse"),
            ClientMessage::Move {
                kind: PlayerAction::Check,
                amount: 0
            }
        );
    }

    #[test]
    fn test_parse_start_and_get_state() {
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"start"}"#).expect("parse"),
            ClientMessage::Start
        );
        assert_eq!(
            ClientMessage::from_json(r#"{"action":"get_state"}"#).expect("parse"),
            ClientMessage::GetState
        );
    }

    #[test]
    fn test_malformed_messages_are_protocol_errors() {
        for text in [
            "not json",
            r#"{"action":"dance"}"#,
            r#"{"action":"move","move":"shove"}"#,
            r#"{"type":"join"}"#,
        ] {
            assert!(
                matches!(ClientMessage::from_json(text), Err(GatewayError::Protocol(_))),
                "{text}"
            );
        }
    }

    // === Outbound Shape Tests ===

    #[test]
    fn test_server_message_tags() {
        let joined = serde_json::to_value(ServerMessage::Joined {
            player_id: 0,
            players_count: 1,
        })
        .expect("serialize");
        assert_eq!(joined["type"], "joined");
        assert_eq!(joined["player_id"], 0);
        assert_eq!(joined["players_count"], 1);

        let left = serde_json::to_value(ServerMessage::PlayerLeft { players_count: 2 })
            .expect("serialize");
        assert_eq!(left["type"], "player_left");

        let error = serde_json::to_value(ServerMessage::error("Not your turn")).expect("serialize");
        assert_eq!(error["type"], "error");
        assert_eq!(error["message"], "Not your turn");
    }
}
