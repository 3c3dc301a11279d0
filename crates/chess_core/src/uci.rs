//! Text helpers for the UCI protocol: move notation, `position` and `go`
//! argument parsing, and the `info`/`bestmove` lines.

use std::fmt::Write as _;

use crate::board::Position;
use crate::movegen::legal_moves;
use crate::time_control::SearchParams;
use crate::types::*;
use crate::SearchInfo;

pub fn move_to_uci(mv: Move) -> String {
    let mut s = String::with_capacity(5);
    s.push_str(&sq_to_coord(mv.from()));
    s.push_str(&sq_to_coord(mv.to()));
    if let Some(p) = mv.promotion() {
        let ch = match p {
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            _ => 'q',
        };
        s.push(ch);
    }
    s
}

pub fn parse_uci_move(pos: &Position, txt: &str) -> Option<Move> {
    // We parse and then match against legal moves so flags (castle/ep) are correct.
    if !(4..=5).contains(&txt.len()) || !txt.is_ascii() {
        return None;
    }
    let from = coord_to_sq(&txt[0..2])?;
    let to = coord_to_sq(&txt[2..4])?;
    let promo = match txt.as_bytes().get(4) {
        None => None,
        Some(b'q' | b'Q') => Some(PieceKind::Queen),
        Some(b'r' | b'R') => Some(PieceKind::Rook),
        Some(b'b' | b'B') => Some(PieceKind::Bishop),
        Some(b'n' | b'N') => Some(PieceKind::Knight),
        Some(_) => return None,
    };

    legal_moves(pos)
        .into_iter()
        .find(|m| m.from() == from && m.to() == to && m.promotion() == promo)
}

/// A position set up by the `position` command.
#[derive(Clone, Debug)]
pub struct GameState {
    pub position: Position,
    /// Hashes of every earlier position of the game, oldest first.
    pub history: Vec<u64>,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            position: Position::startpos(),
            history: Vec::new(),
        }
    }
}

/// Parses the arguments of `position startpos|fen <fen> [moves ...]`.
///
/// Any malformed part (bad FEN, unknown keyword, illegal move) rejects the
/// whole command so the caller can leave its state untouched.
pub fn parse_position(args: &[&str]) -> Option<GameState> {
    let (mut position, rest) = match args.split_first()? {
        (&"startpos", rest) => (Position::startpos(), rest),
        (&"fen", rest) => {
            let end = rest.iter().position(|&t| t == "moves").unwrap_or(rest.len());
            let position = Position::from_fen(&rest[..end].join(" ")).ok()?;
            (position, &rest[end..])
        }
        _ => return None,
    };

    let moves = match rest.split_first() {
        None => &[][..],
        Some((&"moves", moves)) => moves,
        Some(_) => return None,
    };

    let mut history = Vec::with_capacity(moves.len());
    for txt in moves {
        let mv = parse_uci_move(&position, txt)?;
        history.push(position.hash());
        position = position.make_move(mv);
    }
    Some(GameState { position, history })
}

/// What a `go` command asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GoCommand {
    Search(SearchParams),
    Perft(u8),
}

/// Parses the arguments of `go`. Unknown tokens and unparsable values are skipped.
pub fn parse_go(args: &[&str]) -> GoCommand {
    fn value<T: std::str::FromStr>(args: &[&str], i: usize) -> Option<T> {
        args.get(i + 1).and_then(|v| v.parse().ok())
    }

    let mut params = SearchParams::default();
    let mut i = 0;
    while i < args.len() {
        match args[i] {
            "perft" => {
                if let Some(depth) = value(args, i) {
                    return GoCommand::Perft(depth);
                }
            }
            "wtime" => params.wtime = value(args, i),
            "btime" => params.btime = value(args, i),
            "winc" => params.winc = value(args, i),
            "binc" => params.binc = value(args, i),
            "movestogo" => params.movestogo = value(args, i),
            "movetime" => params.movetime = value(args, i),
            "depth" => params.depth = value(args, i),
            "nodes" => params.nodes = value(args, i),
            "infinite" => {
                params.infinite = true;
                i += 1;
                continue;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        i += 2;
    }
    GoCommand::Search(params)
}

/// One `info` line for a completed iteration.
pub fn format_info(info: &SearchInfo) -> String {
    let millis = info.elapsed.as_millis() as u64;
    let nps = info.nodes * 1000 / millis.max(1);
    let mut line = format!(
        "info depth {} seldepth {} time {} score {} nodes {} nps {} hashfull {}",
        info.depth, info.seldepth, millis, info.score, info.nodes, nps, info.hashfull
    );
    if !info.pv.is_empty() {
        line.push_str(" pv");
        for mv in &info.pv {
            let _ = write!(line, " {}", move_to_uci(*mv));
        }
    }
    line
}

/// The final `bestmove` line; `0000` when there is no legal move.
pub fn format_bestmove(best: Option<Move>) -> String {
    match best {
        Some(mv) => format!("bestmove {}", move_to_uci(mv)),
        None => "bestmove 0000".to_string(),
    }
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
