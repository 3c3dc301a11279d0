//! PVS Chess Engine
//!
//! Principal variation search over an NNUE evaluation, with a two-way
//! transposition table, history-driven move ordering and static exchange
//! evaluation. The engine keeps its hash table and histories between
//! searches of the same game; `new_game` wipes them.

pub mod history;
pub mod movepick;
pub mod search;
pub mod see;
pub mod tt;

use chess_core::{Engine, InfoCallback, Position, SearchLimits, SearchResult};
use tracing::debug;

pub use search::{SearchContext, INF, MATE, MATE_BOUND, MAX_PLY};
pub use tt::MAX_HASH_MB;

/// Hash size used when nothing else is configured.
pub const DEFAULT_HASH_MB: usize = 16;

pub struct PvsEngine {
    ctx: SearchContext,
    hash_mb: usize,
}

impl Default for PvsEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_MB)
    }
}

impl PvsEngine {
    pub fn new(hash_mb: usize) -> Self {
        let hash_mb = hash_mb.clamp(1, MAX_HASH_MB);
        Self {
            ctx: SearchContext::new(hash_mb),
            hash_mb,
        }
    }

    pub fn hash_mb(&self) -> usize {
        self.hash_mb
    }

    pub fn resize_hash(&mut self, mb: usize) {
        self.hash_mb = mb.clamp(1, MAX_HASH_MB);
        self.ctx.tt.resize(self.hash_mb);
    }
}

impl Engine for PvsEngine {
    fn search(
        &mut self,
        pos: &Position,
        limits: SearchLimits,
        on_info: InfoCallback<'_>,
    ) -> SearchResult {
        self.ctx.search(pos, limits, on_info)
    }

    fn name(&self) -> &str {
        "PVS NNUE 0.1"
    }

    fn new_game(&mut self) {
        debug!("new game, clearing hash and histories");
        self.ctx.new_game();
    }

    fn set_game_history(&mut self, history: &[u64]) {
        self.ctx.set_game_history(history);
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        match name {
            "Hash" => match value.parse::<usize>() {
                Ok(mb) => {
                    self.resize_hash(mb);
                    true
                }
                Err(_) => false,
            },
            "Clear Hash" => {
                self.ctx.tt.clear();
                true
            }
            _ => false,
        }
    }

    fn options(&self) -> Vec<String> {
        vec![
            format!(
                "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max {MAX_HASH_MB}"
            ),
            "option name Clear Hash type button".to_string(),
        ]
    }
}
