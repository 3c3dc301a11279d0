//! Time control and search limits for chess engines.
//!
//! `SearchParams` is what the protocol's `go` command asked for; `SearchLimits`
//! is what the engine actually obeys: a depth cap, an optional node cap, a soft
//! time budget checked between iterations and a hard deadline enforced by the
//! shared [`TimeControl`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use crate::types::Color;

/// Deepest iteration the engines will start.
pub const MAX_DEPTH: u8 = 64;

/// Moves assumed left in the game when the clock gives no `movestogo`.
const DEFAULT_MOVES_TO_GO: u32 = 20;

/// Parameters of a `go` command, times in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchParams {
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub movetime: Option<u64>,
    pub depth: Option<u8>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

/// Search limits that control when an engine should stop searching.
///
/// Engines should respect both depth and time limits, stopping when either
/// is reached. The hard limit takes precedence: once it passes, the engine
/// must return immediately with the best move of the last completed depth.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    /// Maximum search depth in plies (half-moves)
    pub depth: u8,
    /// Node budget for the whole search
    pub nodes: Option<u64>,
    /// Budget checked between iterations (None = infinite)
    pub soft_time: Option<Duration>,
    /// Time controller for checking if search should stop
    pub time_control: TimeControl,
}

impl SearchLimits {
    /// Create limits with only depth constraint (no time limit).
    pub fn depth(depth: u8) -> Self {
        Self {
            depth,
            nodes: None,
            soft_time: None,
            time_control: TimeControl::new(None),
        }
    }

    /// Create limits with only a node budget.
    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::depth(MAX_DEPTH)
        }
    }

    /// Search until stopped.
    pub fn infinite() -> Self {
        Self::depth(MAX_DEPTH)
    }

    /// Turns a `go` command into limits for the side to move.
    ///
    /// `movetime` is used as-is; a running clock gives a soft budget of
    /// `time / movestogo + 3/4 * increment` capped by a hard budget of half the
    /// remaining time. The move overhead comes off both.
    pub fn from_params(params: &SearchParams, side: Color, overhead: Duration) -> Self {
        let depth = params.depth.unwrap_or(MAX_DEPTH).clamp(1, MAX_DEPTH);
        let (time, inc) = match side {
            Color::White => (params.wtime, params.winc),
            Color::Black => (params.btime, params.binc),
        };

        let (soft, hard) = if params.infinite {
            (None, None)
        } else if let Some(movetime) = params.movetime {
            let budget = Duration::from_millis(movetime).saturating_sub(overhead);
            (Some(budget), Some(budget))
        } else if let Some(time) = time {
            let moves_to_go = u64::from(params.movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(1));
            let inc = inc.unwrap_or(0);
            let hard = Duration::from_millis(time / 2).saturating_sub(overhead);
            let soft = Duration::from_millis(time / moves_to_go + inc * 3 / 4)
                .saturating_sub(overhead)
                .min(hard);
            (Some(soft), Some(hard))
        } else {
            (None, None)
        };

        Self {
            depth,
            nodes: params.nodes,
            soft_time: soft,
            time_control: TimeControl::new(hard),
        }
    }
}

/// Stop flag and hard deadline shared between the searching thread and
/// whoever may interrupt it. Clones share the flag.
#[derive(Debug, Clone)]
pub struct TimeControl {
    /// Shared stop flag
    stopped: Arc<AtomicBool>,
    /// Start time of the search
    start_time: Arc<RwLock<Option<Instant>>>,
    /// Hard time limit for this search (None = infinite)
    time_limit: Option<Duration>,
    /// Nodes between clock reads.
    check_interval: u64,
}

impl TimeControl {
    pub fn new(time_limit: Option<Duration>) -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            start_time: Arc::new(RwLock::new(None)),
            time_limit,
            check_interval: 1024,
        }
    }

    /// A stop requested before the search started is kept.
    pub fn start(&self) {
        let mut start = self.start_time.write().unwrap_or_else(|e| e.into_inner());
        *start = Some(Instant::now());
    }

    /// Force stop the search immediately.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Reads the clock and raises the stop flag once the hard limit has passed.
    pub fn check_time(&self) -> bool {
        if self.is_stopped() {
            return true;
        }

        if let Some(limit) = self.time_limit {
            if self.started() && self.elapsed() >= limit {
                self.stop();
                return true;
            }
        }

        false
    }

    #[inline]
    pub fn should_check_time(&self, nodes: u64) -> bool {
        nodes % self.check_interval == 0
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    fn started(&self) -> bool {
        self.start_time
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// Get elapsed time since search started.
    pub fn elapsed(&self) -> Duration {
        self.start_time
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
#[path = "time_control_tests.rs"]
mod time_control_tests;
