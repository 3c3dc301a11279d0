//! Move ordering.
//!
//! All legal moves are generated and scored up front, then handed out best
//! first by a lazy selection sort. Order: hash move, winning captures and
//! promotions, killers, quiets by history, losing captures.

use chess_core::{generate, Bitboard, GenType, Move, PieceKind, Position};

use crate::history::{History, PieceTo};
use crate::see::{see, see_value};

const TT_MOVE_SCORE: i32 = 2_000_000;
const GOOD_NOISY_SCORE: i32 = 1_000_000;
const KILLER_SCORES: [i32; 2] = [900_000, 800_000];
const BAD_NOISY_SCORE: i32 = -1_000_000;

#[derive(Clone, Copy, Debug)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

impl ScoredMove {
    /// Captures and promotions that did not lose material on the exchange.
    pub fn is_good_noisy(&self) -> bool {
        self.mv.is_noisy() && self.score >= GOOD_NOISY_SCORE && self.score < TT_MOVE_SCORE
    }
}

/// What the picker needs to know about the node it orders moves for.
pub struct OrderingContext<'a> {
    pub history: &'a History,
    pub tt_move: Move,
    pub killers: [Move; 2],
    pub threats: Bitboard,
    pub conts: [Option<PieceTo>; 2],
}

pub struct MovePicker {
    moves: Vec<ScoredMove>,
    next: usize,
}

impl MovePicker {
    pub fn new(pos: &Position, gen: GenType, ctx: &OrderingContext<'_>) -> Self {
        let mut raw = Vec::with_capacity(64);
        generate(pos, gen, &mut raw);

        let moves = raw
            .into_iter()
            .map(|mv| ScoredMove {
                mv,
                score: score_move(pos, mv, ctx),
            })
            .collect();
        Self { moves, next: 0 }
    }

    /// Number of legal moves in the list, picked or not.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Iterator for MovePicker {
    type Item = ScoredMove;

    fn next(&mut self) -> Option<ScoredMove> {
        if self.next >= self.moves.len() {
            return None;
        }
        let mut best = self.next;
        for i in self.next + 1..self.moves.len() {
            if self.moves[i].score > self.moves[best].score {
                best = i;
            }
        }
        self.moves.swap(self.next, best);
        self.next += 1;
        Some(self.moves[self.next - 1])
    }
}

fn score_move(pos: &Position, mv: Move, ctx: &OrderingContext<'_>) -> i32 {
    if mv == ctx.tt_move {
        return TT_MOVE_SCORE;
    }

    let us = pos.side_to_move();
    let mover = pos.kind_at(mv.from()).unwrap_or(PieceKind::Pawn);

    if mv.is_noisy() {
        let victim = if mv.is_en_passant() {
            Some(PieceKind::Pawn)
        } else if mv.is_capture() {
            pos.kind_at(mv.to())
        } else {
            None
        };
        let mut score = victim.map_or(0, |v| {
            see_value(v) * 16 + ctx.history.capture(us, mover, v, mv.to()) / 32
        });
        if let Some(promo) = mv.promotion() {
            score += see_value(promo) * 16;
        }
        let base = if see(pos, mv, 0) {
            GOOD_NOISY_SCORE
        } else {
            BAD_NOISY_SCORE
        };
        return base + score;
    }

    if let Some(slot) = ctx.killers.iter().position(|&k| k == mv) {
        return KILLER_SCORES[slot];
    }

    ctx.history
        .quiet_score(us, mover, mv, ctx.threats, &ctx.conts)
}

#[cfg(test)]
#[path = "movepick_tests.rs"]
mod movepick_tests;
