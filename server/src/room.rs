//! Per-room session controller
//!
//! The room is a strictly sequential message processor around one
//! [`GameState`]. It owns no transport: every handler returns the list of
//! [`Outbound`] deliveries the caller must perform, so the same logic is
//! driven by the UDP harness in production and called directly in tests.

use crate::game::{GameError, GameState, PopOutcome};
use log::warn;
use shared::Packet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A delivery decision made by the room. The transport layer maps client
/// ids to addresses and actually sends.
#[derive(Debug, Clone)]
pub enum Outbound {
    Unicast { client_id: u32, packet: Packet },
    Broadcast { packet: Packet, exclude: Option<u32> },
}

/// One isolated game instance: roster, grid, and the message protocol
/// that mutates them.
pub struct Room {
    state: GameState,
}

impl Room {
    pub fn new() -> Self {
        Self {
            state: GameState::new(),
        }
    }

    pub fn with_state(state: GameState) -> Self {
        Self { state }
    }

    /// Committed state, observable by the sync layer after every handler
    /// returns.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Admits a participant. The joiner gets its own record plus the full
    /// roster; everyone else learns about the new player. A duplicate id
    /// is rejected and produces no traffic.
    pub fn handle_join(
        &mut self,
        client_id: u32,
        color: u8,
        username: Option<String>,
    ) -> Result<Vec<Outbound>, GameError> {
        let player = self.state.add_player(client_id, color, username)?.clone();
        let players = self.state.players_snapshot();

        Ok(vec![
            Outbound::Unicast {
                client_id,
                packet: Packet::Connected {
                    player: player.clone(),
                    players,
                },
            },
            Outbound::Broadcast {
                packet: Packet::NewPlayer { player },
                exclude: Some(client_id),
            },
        ])
    }

    pub fn handle_leave(&mut self, client_id: u32) {
        self.state.remove_player(client_id);
    }

    /// Dispatches one inbound message from a connected participant.
    /// Rejected messages are logged and dropped; they never tear down the
    /// room or block the next message.
    pub fn handle_message(&mut self, sender: u32, packet: Packet) -> Vec<Outbound> {
        match packet {
            Packet::Time { time } => vec![Outbound::Unicast {
                client_id: sender,
                packet: Packet::TimeReply {
                    time,
                    delta: server_time_millis(),
                },
            }],

            Packet::Pop { index } => self.handle_pop(sender, index),

            Packet::Move { x, y } => {
                if let Err(e) = self.state.move_player(sender, x, y) {
                    warn!("Rejected move from client {}: {}", sender, e);
                }
                // Position updates are propagated by the sync layer, not
                // rebroadcast here.
                Vec::new()
            }

            Packet::Finish => {
                self.state.force_finish();
                vec![Outbound::Broadcast {
                    packet: Packet::Finished {
                        bubbles: self.state.bubbles_snapshot(),
                    },
                    exclude: None,
                }]
            }

            other => {
                warn!(
                    "Ignoring unexpected message from client {}: {:?}",
                    sender, other
                );
                Vec::new()
            }
        }
    }

    fn handle_pop(&mut self, sender: u32, index: u16) -> Vec<Outbound> {
        let outcome = match self.state.pop_bubble(index, sender) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Rejected pop from client {}: {}", sender, e);
                return Vec::new();
            }
        };

        match outcome {
            PopOutcome::AlreadyPopped => Vec::new(),
            PopOutcome::Popped { points, player } => {
                let mut outbound = vec![Outbound::Broadcast {
                    packet: Packet::Popped {
                        index,
                        player,
                        score: points,
                    },
                    exclude: None,
                }];

                // The reset happens synchronously inside the same message
                // step, so no other message can observe the completed grid.
                if self.state.is_round_complete() {
                    self.state.reset_grid();
                    outbound.push(Outbound::Broadcast {
                        packet: Packet::RoundOver {
                            bubbles: self.state.bubbles_snapshot(),
                            players: self.state.players_snapshot(),
                        },
                        exclude: None,
                    });
                }

                outbound
            }
        }
    }

    /// Full-state snapshot for the periodic synchronization broadcast.
    pub fn sync_packet(&self) -> Packet {
        Packet::Sync {
            players: self.state.players_snapshot(),
            bubbles: self.state.bubbles_snapshot(),
        }
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds since the Unix epoch, the server's time reference for
/// `Time` replies.
pub fn server_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
