use serde::{Deserialize, Serialize};

pub const GRID_COLS: usize = 13;
pub const GRID_ROWS: usize = 10;
pub const GRID_SIZE: usize = GRID_COLS * GRID_ROWS;

/// Colors a player can pick at join time (0..=5).
pub const COLOR_COUNT: u8 = 6;
/// The rare "bomb" color; bubbles only, never selectable by players.
pub const RARE_COLOR: u8 = 6;
/// The minor-bonus color.
pub const COMMON_COLOR: u8 = 0;

pub const SCORE_EXACT_MATCH: i32 = 20;
pub const SCORE_COMMON: i32 = 2;
pub const SCORE_RARE: i32 = -15;
pub const SCORE_MISMATCH: i32 = 10;

/// Guest usernames are `Guest_<n>` with n below this bound.
pub const GUEST_TAG_RANGE: u32 = 3_000_000;

pub const DEFAULT_MAX_PLAYERS: usize = 6;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    // Client -> server
    Connect {
        color: u8,
        username: Option<String>,
    },
    Time {
        time: u64,
    },
    Pop {
        index: u16,
    },
    Move {
        x: f32,
        y: f32,
    },
    Finish,
    Disconnect,

    // Server -> client
    Connected {
        player: Player,
        players: Vec<Player>,
    },
    NewPlayer {
        player: Player,
    },
    TimeReply {
        time: u64,
        delta: u64,
    },
    Popped {
        index: u16,
        player: u32,
        score: i32,
    },
    RoundOver {
        bubbles: Vec<Bubble>,
        players: Vec<Player>,
    },
    Finished {
        bubbles: Vec<Bubble>,
    },
    Sync {
        players: Vec<Player>,
        bubbles: Vec<Bubble>,
    },
    Disconnected {
        reason: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Player {
    pub id: u32,
    pub username: String,
    pub color: u8,
    pub x: f32,
    pub y: f32,
    pub score: i32,
    pub is_playing: bool,
}

impl Player {
    pub fn new(id: u32, color: u8, username: String) -> Self {
        Self {
            id,
            username,
            color,
            x: 0.0,
            y: 0.0,
            score: 0,
            is_playing: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Bubble {
    pub index: u16,
    pub color: u8,
    pub popped: bool,
    pub popped_by: Option<u32>,
}

impl Bubble {
    pub fn new(index: u16, color: u8) -> Self {
        Self {
            index,
            color,
            popped: false,
            popped_by: None,
        }
    }
}

/// Points awarded for popping a bubble of `bubble_color` as a player of
/// `player_color`. The check order is the scoring contract: exact match
/// beats the special colors, the special colors beat the default.
pub fn score_delta(player_color: u8, bubble_color: u8) -> i32 {
    if player_color == bubble_color {
        SCORE_EXACT_MATCH
    } else if bubble_color == COMMON_COLOR {
        SCORE_COMMON
    } else if bubble_color == RARE_COLOR {
        SCORE_RARE
    } else {
        SCORE_MISMATCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, 3, "tester".to_string());
        assert_eq!(player.id, 1);
        assert_eq!(player.color, 3);
        assert_eq!(player.username, "tester");
        assert_eq!(player.x, 0.0);
        assert_eq!(player.y, 0.0);
        assert_eq!(player.score, 0);
        assert!(player.is_playing);
    }

    #[test]
    fn test_bubble_creation() {
        let bubble = Bubble::new(42, 5);
        assert_eq!(bubble.index, 42);
        assert_eq!(bubble.color, 5);
        assert!(!bubble.popped);
        assert_eq!(bubble.popped_by, None);
    }

    #[test]
    fn test_grid_dimensions() {
        assert_eq!(GRID_SIZE, 130);
        assert_eq!(GRID_COLS * GRID_ROWS, GRID_SIZE);
    }

    /// All 42 (player color, bubble color) combinations against the
    /// scoring contract.
    #[test]
    fn test_score_delta_full_table() {
        for player_color in 0..COLOR_COUNT {
            for bubble_color in 0..=RARE_COLOR {
                let expected = if player_color == bubble_color {
                    SCORE_EXACT_MATCH
                } else if bubble_color == COMMON_COLOR {
                    SCORE_COMMON
                } else if bubble_color == RARE_COLOR {
                    SCORE_RARE
                } else {
                    SCORE_MISMATCH
                };

                assert_eq!(
                    score_delta(player_color, bubble_color),
                    expected,
                    "player {} bubble {}",
                    player_color,
                    bubble_color
                );
            }
        }
    }

    #[test]
    fn test_score_delta_match_beats_common() {
        // A player of color 0 popping a color-0 bubble gets the match
        // bonus, not the common-color consolation.
        assert_eq!(score_delta(0, 0), SCORE_EXACT_MATCH);
    }

    #[test]
    fn test_score_delta_rare_always_penalizes() {
        // No player color can match the rare color.
        for player_color in 0..COLOR_COUNT {
            assert_eq!(score_delta(player_color, RARE_COLOR), SCORE_RARE);
        }
    }

    #[test]
    fn test_packet_serialization_connect() {
        let packet = Packet::Connect {
            color: 4,
            username: Some("alice".to_string()),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Connect { color, username } => {
                assert_eq!(color, 4);
                assert_eq!(username.as_deref(), Some("alice"));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_pop() {
        let packet = Packet::Pop { index: 129 };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Pop { index } => assert_eq!(index, 129),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_round_over() {
        let bubbles: Vec<Bubble> = (0..GRID_SIZE as u16).map(|i| Bubble::new(i, 1)).collect();
        let players = vec![
            Player::new(1, 0, "a".to_string()),
            Player::new(2, 5, "b".to_string()),
        ];

        let packet = Packet::RoundOver { bubbles, players };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::RoundOver { bubbles, players } => {
                assert_eq!(bubbles.len(), GRID_SIZE);
                assert_eq!(bubbles[129].index, 129);
                assert_eq!(players.len(), 2);
                assert_eq!(players[1].id, 2);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_popped_negative_score() {
        let packet = Packet::Popped {
            index: 7,
            player: 3,
            score: SCORE_RARE,
        };

        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Popped {
                index,
                player,
                score,
            } => {
                assert_eq!(index, 7);
                assert_eq!(player, 3);
                assert_eq!(score, -15);
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }
}
