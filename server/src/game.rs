use crate::color::{choose_color, guest_username};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{score_delta, Bubble, Player, COLOR_COUNT, GRID_SIZE};
use std::collections::HashMap;
use std::fmt;

/// Number of slots `force_finish` leaves un-popped at the top of the grid.
const FORCE_FINISH_REMAINDER: usize = 2;

/// Rejections for individual state mutations. None of these is fatal to
/// the room; the message that caused one is dropped and the state is
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    DuplicateId(u32),
    UnknownPlayer(u32),
    OutOfRangeIndex(u16),
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::DuplicateId(id) => write!(f, "player {} already joined", id),
            GameError::UnknownPlayer(id) => write!(f, "no player with id {}", id),
            GameError::OutOfRangeIndex(index) => write!(f, "no bubble at index {}", index),
        }
    }
}

impl std::error::Error for GameError {}

/// Result of a pop attempt that passed the lookup guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopOutcome {
    Popped { points: i32, player: u32 },
    /// The bubble was popped earlier this round. Defined no-op, not an
    /// error: nothing changes and nothing is broadcast.
    AlreadyPopped,
}

/// Authoritative state of one room: the player roster and the fixed
/// 130-slot bubble grid. The grid is filled once at construction and only
/// ever reset in place; slot indices never change.
#[derive(Debug)]
pub struct GameState {
    pub players: HashMap<u32, Player>,
    bubbles: Vec<Bubble>,
    rng: StdRng,
}

impl GameState {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Builds the state from a caller-supplied random source. Tests seed
    /// this to make colors and guest names reproducible.
    pub fn with_rng(rng: StdRng) -> Self {
        let mut state = Self {
            players: HashMap::new(),
            bubbles: Vec::with_capacity(GRID_SIZE),
            rng,
        };
        state.initialize_grid();
        state
    }

    /// Fills the empty grid with freshly colored bubbles. Runs exactly
    /// once, from the constructor.
    fn initialize_grid(&mut self) {
        debug_assert!(self.bubbles.is_empty());

        for index in 0..GRID_SIZE as u16 {
            let color = choose_color(&mut self.rng);
            self.bubbles.push(Bubble::new(index, color));
        }
    }

    /// Re-colors every slot and clears its popped state. Slot identity and
    /// count are preserved.
    pub fn reset_grid(&mut self) {
        for bubble in &mut self.bubbles {
            bubble.color = choose_color(&mut self.rng);
            bubble.popped = false;
            bubble.popped_by = None;
        }

        info!("Grid reset, {} bubbles reshuffled", self.bubbles.len());
    }

    /// Inserts a new player. Rejects an id that is already on the roster
    /// rather than overwriting the existing record. A missing or empty
    /// username gets a synthesized guest name; the color is clamped to the
    /// selectable range so a player can never hold the rare color.
    pub fn add_player(
        &mut self,
        id: u32,
        color: u8,
        username: Option<String>,
    ) -> Result<&Player, GameError> {
        if self.players.contains_key(&id) {
            return Err(GameError::DuplicateId(id));
        }

        let username = match username {
            Some(name) if !name.is_empty() => name,
            _ => guest_username(&mut self.rng),
        };
        let color = color.min(COLOR_COUNT - 1);

        let player = Player::new(id, color, username);
        info!(
            "Added player {} ({}) with color {}",
            id, player.username, color
        );

        Ok(self.players.entry(id).or_insert(player))
    }

    /// Removes a player from the roster. Removing an unknown id is a
    /// no-op.
    pub fn remove_player(&mut self, id: u32) {
        if self.players.remove(&id).is_some() {
            info!("Removed player {}", id);
        }
    }

    pub fn move_player(&mut self, id: u32, x: f32, y: f32) -> Result<(), GameError> {
        let player = self
            .players
            .get_mut(&id)
            .ok_or(GameError::UnknownPlayer(id))?;

        player.x = x;
        player.y = y;
        Ok(())
    }

    /// Pops the bubble at `index` on behalf of `player_id` and applies the
    /// scoring rule. Popping an already-popped bubble is a defined no-op;
    /// unknown players and out-of-range indices are rejected without
    /// touching any state.
    pub fn pop_bubble(&mut self, index: u16, player_id: u32) -> Result<PopOutcome, GameError> {
        if index as usize >= self.bubbles.len() {
            return Err(GameError::OutOfRangeIndex(index));
        }
        let player = self
            .players
            .get_mut(&player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;

        let bubble = &mut self.bubbles[index as usize];
        if bubble.popped {
            return Ok(PopOutcome::AlreadyPopped);
        }

        let points = score_delta(player.color, bubble.color);
        player.score += points;
        bubble.popped = true;
        bubble.popped_by = Some(player_id);

        Ok(PopOutcome::Popped {
            points,
            player: player_id,
        })
    }

    /// True once every bubble in the grid has been popped.
    pub fn is_round_complete(&self) -> bool {
        self.bubbles.iter().all(|bubble| bubble.popped)
    }

    /// Authoritative early round end: pops everything except the two
    /// highest slots, regardless of what was popped before.
    pub fn force_finish(&mut self) {
        let cutoff = self.bubbles.len() - FORCE_FINISH_REMAINDER;

        for bubble in &mut self.bubbles {
            bubble.popped = (bubble.index as usize) < cutoff;
        }

        info!("Round force-finished, {} bubbles left", FORCE_FINISH_REMAINDER);
    }

    pub fn bubbles(&self) -> &[Bubble] {
        &self.bubbles
    }

    /// Roster snapshot for broadcast payloads.
    pub fn players_snapshot(&self) -> Vec<Player> {
        self.players.values().cloned().collect()
    }

    pub fn bubbles_snapshot(&self) -> Vec<Bubble> {
        self.bubbles.clone()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
