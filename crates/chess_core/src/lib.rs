pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod movegen;
pub mod nnue;
pub mod perft;
pub mod time_control;
pub mod types;
pub mod uci;
pub mod zobrist;

use std::fmt;
use std::time::Duration;

// Re-export core game logic (not engine-specific)
pub use attacks::*;
pub use bitboard::*;
pub use board::*;
pub use movegen::*;
pub use nnue::{evaluate, load_network, NnueError};
pub use perft::{perft, perft_divide};
pub use time_control::*;
pub use types::*;
pub use uci::*;
pub use zobrist::ZOBRIST;

// =============================================================================
// Engine trait: implemented by every search engine in the workspace
// =============================================================================

/// A score as reported to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawns from the side to move's point of view.
    Cp(i32),
    /// Moves until mate; negative when the side to move is being mated.
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Cp(cp) => write!(f, "cp {cp}"),
            Score::Mate(moves) => write!(f, "mate {moves}"),
        }
    }
}

/// Progress report for one completed iterative-deepening depth.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u8,
    pub seldepth: u8,
    pub elapsed: Duration,
    pub score: Score,
    pub nodes: u64,
    /// Transposition table occupancy in permille.
    pub hashfull: u32,
    pub pv: Vec<Move>,
}

/// Result of a search operation
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found (None if no legal moves)
    pub best_move: Option<Move>,
    /// Score of the last completed depth
    pub score: Score,
    /// Search depth reached
    pub depth: u8,
    /// Number of nodes searched
    pub nodes: u64,
    /// Whether search was stopped early by time, node limit or `stop`
    pub stopped: bool,
    /// Principal variation of the last completed depth
    pub pv: Vec<Move>,
}

/// Called once per completed depth while a search runs.
pub type InfoCallback<'a> = &'a mut dyn FnMut(&SearchInfo);

/// Trait that all chess engines must implement.
///
/// The protocol front end talks to engines only through this trait.
pub trait Engine: Send {
    /// Search the position with the given search limits.
    ///
    /// # Arguments
    /// * `pos` - The current position to analyze
    /// * `limits` - Search limits (depth, nodes, time)
    /// * `on_info` - Receives a report after every completed depth
    ///
    /// # Returns
    /// SearchResult containing best move, score, and statistics
    fn search(&mut self, pos: &Position, limits: SearchLimits, on_info: InfoCallback<'_>)
        -> SearchResult;

    /// Returns the engine's name for UCI identification
    fn name(&self) -> &str;

    /// Returns the engine's author for UCI identification
    fn author(&self) -> &str {
        "ML-chess"
    }

    /// Reset internal state for a new game (clear hash tables, history, etc.)
    fn new_game(&mut self) {}

    /// Hashes of the game's earlier positions, used for repetition detection.
    fn set_game_history(&mut self, _history: &[u64]) {}

    /// Optional: Set a UCI option. Returns true if the option was recognized.
    fn set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }

    /// `option` lines advertised in reply to `uci`.
    fn options(&self) -> Vec<String> {
        Vec::new()
    }
}
