//! UCI command handling.
//!
//! The session owns the game state and the engine. Searches run on a worker
//! thread so `stop`, `isready` and `quit` are answered while the engine thinks.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chess_core::{
    format_bestmove, format_info, move_to_uci, parse_go, parse_position, perft_divide, Engine,
    GameState, GoCommand, SearchInfo, SearchLimits, TimeControl,
};
use pvs_engine::PvsEngine;
use tracing::{debug, error, info};

const MAX_MOVE_OVERHEAD_MS: u64 = 5000;

pub type Output = Arc<Mutex<Box<dyn Write + Send>>>;

/// Lock a mutex, taking over the data if a panicking thread poisoned it.
pub fn lock_or_recover<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!("mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

fn send(out: &Output, line: &str) {
    let mut out = lock_or_recover(out);
    // A closed stdout leaves nobody to talk to; there is nothing useful to do about it.
    let _ = writeln!(out, "{line}");
    let _ = out.flush();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct RunningSearch {
    control: TimeControl,
    handle: JoinHandle<()>,
}

pub struct UciSession {
    engine: Arc<Mutex<PvsEngine>>,
    out: Output,
    game: GameState,
    move_overhead: Duration,
    search: Option<RunningSearch>,
}

impl UciSession {
    pub fn new(engine: PvsEngine, move_overhead: Duration, out: Output) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            out,
            game: GameState::default(),
            move_overhead,
            search: None,
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Flow::Continue;
        };

        match command {
            "uci" => self.uci(),
            "isready" => send(&self.out, "readyok"),
            "setoption" => {
                self.wait();
                self.set_option(args);
            }
            "ucinewgame" => {
                self.wait();
                lock_or_recover(&self.engine).new_game();
                self.game = GameState::default();
            }
            "position" => match parse_position(args) {
                Some(game) => self.game = game,
                None => debug!(%line, "ignoring malformed position command"),
            },
            "go" => self.go(args),
            "stop" => self.stop(),
            "quit" => {
                self.stop();
                return Flow::Quit;
            }
            _ => debug!(%command, "ignoring unknown command"),
        }
        Flow::Continue
    }

    /// Blocks until the running search, if any, has printed its best move.
    pub fn wait(&mut self) {
        if let Some(search) = self.search.take() {
            if search.handle.join().is_err() {
                error!("search thread panicked");
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(search) = &self.search {
            search.control.stop();
        }
        self.wait();
    }

    fn uci(&self) {
        let engine = lock_or_recover(&self.engine);
        send(&self.out, &format!("id name {}", engine.name()));
        send(&self.out, &format!("id author {}", engine.author()));
        for option in engine.options() {
            send(&self.out, &option);
        }
        send(
            &self.out,
            &format!(
                "option name MoveOverhead type spin default {} min 0 max {MAX_MOVE_OVERHEAD_MS}",
                self.move_overhead.as_millis()
            ),
        );
        send(&self.out, "uciok");
    }

    /// `setoption name <name...> [value <value...>]`; names may contain spaces.
    fn set_option(&mut self, args: &[&str]) {
        let Some(("name", rest)) = args.split_first().map(|(k, rest)| (*k, rest)) else {
            debug!(?args, "ignoring malformed setoption");
            return;
        };
        let value_at = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
        let name = rest[..value_at].join(" ");
        let value = rest.get(value_at + 1..).map(|v| v.join(" ")).unwrap_or_default();

        if name == "MoveOverhead" {
            match value.parse::<u64>() {
                Ok(ms) => {
                    self.move_overhead = Duration::from_millis(ms.min(MAX_MOVE_OVERHEAD_MS));
                }
                Err(_) => debug!(%value, "ignoring bad MoveOverhead"),
            }
            return;
        }
        if !lock_or_recover(&self.engine).set_option(&name, &value) {
            debug!(%name, %value, "ignoring unknown option");
        }
    }

    fn go(&mut self, args: &[&str]) {
        self.wait();

        let params = match parse_go(args) {
            GoCommand::Perft(depth) => {
                self.perft(depth);
                return;
            }
            GoCommand::Search(params) => params,
        };

        let position = self.game.position.clone();
        let history = self.game.history.clone();
        let limits =
            SearchLimits::from_params(&params, position.side_to_move(), self.move_overhead);
        let control = limits.time_control.clone();
        let engine = Arc::clone(&self.engine);
        let out = Arc::clone(&self.out);

        let handle = thread::spawn(move || {
            let mut engine = lock_or_recover(&engine);
            engine.set_game_history(&history);
            let result = engine.search(&position, limits, &mut |info: &SearchInfo| {
                send(&out, &format_info(info));
            });
            send(&out, &format_bestmove(result.best_move));
        });
        self.search = Some(RunningSearch { control, handle });
    }

    fn perft(&self, depth: u8) {
        let start = Instant::now();
        let divide = perft_divide(&self.game.position, depth);
        let mut total: u64 = 0;
        for (mv, nodes) in &divide {
            send(&self.out, &format!("{}: {nodes}", move_to_uci(*mv)));
            total += *nodes;
        }
        send(&self.out, "");
        send(&self.out, &format!("Nodes searched: {total}"));
        info!(depth, nodes = total, elapsed_ms = start.elapsed().as_millis() as u64, "perft");
    }
}

impl Drop for UciSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
