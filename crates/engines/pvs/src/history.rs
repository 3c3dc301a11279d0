//! History heuristics: quiet-move history, continuation history, capture
//! history, static-eval correction history and killer moves.
//!
//! Every score table uses the same bounded update,
//! `entry += bonus - entry * |bonus| / HISTORY_MAX`, which keeps entries inside
//! `[-HISTORY_MAX, HISTORY_MAX]` and lets old information decay.

use chess_core::{Bitboard, Color, Move, PieceKind, Position};

use crate::search::MAX_PLY;

pub const HISTORY_MAX: i32 = 16384;

const CORRECTION_SIZE: usize = 16384;
/// Correction entries are stored scaled up by this factor.
const CORRECTION_GRAIN: i32 = 64;
const CORRECTION_LIMIT: i32 = HISTORY_MAX / 4;

/// Bonus for a move that caused a cutoff at `depth`; the malus has the same size.
#[inline]
pub fn history_bonus(depth: i32) -> i32 {
    (150 * depth - 100).clamp(0, 1600)
}

#[inline]
fn apply_bonus(entry: &mut i16, bonus: i32) {
    let bonus = bonus.clamp(-HISTORY_MAX, HISTORY_MAX);
    let e = i32::from(*entry);
    *entry = (e + bonus - e * bonus.abs() / HISTORY_MAX) as i16;
}

/// A moved piece and where it landed; the key of continuation history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PieceTo {
    pub side: Color,
    pub kind: PieceKind,
    pub to: u8,
}

pub struct History {
    /// [side][from][to][from threatened][to threatened]
    main: Vec<i16>,
    /// [previous side][previous kind][previous to][side][kind][to]
    continuation: Vec<i16>,
    /// [side][attacker][captured][to]
    capture: Vec<i16>,
    /// [side][pawn key % size]
    pawn_correction: Vec<i16>,
    /// [side][non-pawn key % size]
    non_pawn_correction: Vec<i16>,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    pub fn new() -> Self {
        Self {
            main: vec![0; 2 * 64 * 64 * 2 * 2],
            continuation: vec![0; 2 * 6 * 64 * 2 * 6 * 64],
            capture: vec![0; 2 * 6 * 6 * 64],
            pawn_correction: vec![0; 2 * CORRECTION_SIZE],
            non_pawn_correction: vec![0; 2 * CORRECTION_SIZE],
        }
    }

    pub fn clear(&mut self) {
        for table in [
            &mut self.main,
            &mut self.continuation,
            &mut self.capture,
            &mut self.pawn_correction,
            &mut self.non_pawn_correction,
        ] {
            table.fill(0);
        }
    }

    #[inline(always)]
    fn main_index(side: Color, mv: Move, threats: Bitboard) -> usize {
        let from = mv.from() as usize;
        let to = mv.to() as usize;
        let from_threat = usize::from(threats.contains(mv.from()));
        let to_threat = usize::from(threats.contains(mv.to()));
        (((side.idx() * 64 + from) * 64 + to) * 2 + from_threat) * 2 + to_threat
    }

    #[inline(always)]
    fn continuation_index(prev: PieceTo, side: Color, kind: PieceKind, to: u8) -> usize {
        let prev_part = (prev.side.idx() * 6 + prev.kind.idx()) * 64 + prev.to as usize;
        ((prev_part * 2 + side.idx()) * 6 + kind.idx()) * 64 + to as usize
    }

    #[inline(always)]
    fn capture_index(side: Color, attacker: PieceKind, captured: PieceKind, to: u8) -> usize {
        ((side.idx() * 6 + attacker.idx()) * 6 + captured.idx()) * 64 + to as usize
    }

    #[inline(always)]
    fn correction_index(side: Color, key: u64) -> usize {
        side.idx() * CORRECTION_SIZE + (key % CORRECTION_SIZE as u64) as usize
    }

    pub fn main(&self, side: Color, mv: Move, threats: Bitboard) -> i32 {
        i32::from(self.main[Self::main_index(side, mv, threats)])
    }

    pub fn update_main(&mut self, side: Color, mv: Move, threats: Bitboard, bonus: i32) {
        apply_bonus(&mut self.main[Self::main_index(side, mv, threats)], bonus);
    }

    pub fn continuation(&self, prev: PieceTo, side: Color, kind: PieceKind, to: u8) -> i32 {
        i32::from(self.continuation[Self::continuation_index(prev, side, kind, to)])
    }

    pub fn update_continuation(
        &mut self,
        prev: PieceTo,
        side: Color,
        kind: PieceKind,
        to: u8,
        bonus: i32,
    ) {
        apply_bonus(
            &mut self.continuation[Self::continuation_index(prev, side, kind, to)],
            bonus,
        );
    }

    pub fn capture(&self, side: Color, attacker: PieceKind, captured: PieceKind, to: u8) -> i32 {
        i32::from(self.capture[Self::capture_index(side, attacker, captured, to)])
    }

    pub fn update_capture(
        &mut self,
        side: Color,
        attacker: PieceKind,
        captured: PieceKind,
        to: u8,
        bonus: i32,
    ) {
        apply_bonus(
            &mut self.capture[Self::capture_index(side, attacker, captured, to)],
            bonus,
        );
    }

    /// Combined quiet score: main history plus the one- and two-ply continuations.
    pub fn quiet_score(
        &self,
        side: Color,
        kind: PieceKind,
        mv: Move,
        threats: Bitboard,
        conts: &[Option<PieceTo>],
    ) -> i32 {
        let cont: i32 = conts
            .iter()
            .flatten()
            .map(|prev| self.continuation(*prev, side, kind, mv.to()))
            .sum();
        self.main(side, mv, threats) + cont
    }

    /// Centipawn adjustment for the static evaluation of `pos`.
    pub fn correction(&self, pos: &Position) -> i32 {
        let side = pos.side_to_move();
        let pawn = i32::from(self.pawn_correction[Self::correction_index(side, pos.pawn_key())]);
        let non_pawn =
            i32::from(self.non_pawn_correction[Self::correction_index(side, pos.non_pawn_key())]);
        (pawn + non_pawn) / CORRECTION_GRAIN
    }

    /// Nudges the correction toward `diff = search score - static eval`.
    pub fn update_correction(&mut self, pos: &Position, depth: i32, diff: i32) {
        let side = pos.side_to_move();
        let bonus =
            (diff * depth * CORRECTION_GRAIN / 8).clamp(-CORRECTION_LIMIT, CORRECTION_LIMIT);
        apply_bonus(
            &mut self.pawn_correction[Self::correction_index(side, pos.pawn_key())],
            bonus,
        );
        apply_bonus(
            &mut self.non_pawn_correction[Self::correction_index(side, pos.non_pawn_key())],
            bonus,
        );
    }
}

/// Two quiet cutoff moves per ply.
pub struct Killers {
    slots: Vec<[Move; 2]>,
}

impl Default for Killers {
    fn default() -> Self {
        Self::new()
    }
}

impl Killers {
    pub fn new() -> Self {
        Self {
            slots: vec![[Move::NULL; 2]; MAX_PLY + 2],
        }
    }

    pub fn clear(&mut self) {
        self.slots.fill([Move::NULL; 2]);
    }

    pub fn clear_ply(&mut self, ply: usize) {
        self.slots[ply] = [Move::NULL; 2];
    }

    pub fn get(&self, ply: usize) -> [Move; 2] {
        self.slots[ply]
    }

    pub fn insert(&mut self, ply: usize, mv: Move) {
        let slot = &mut self.slots[ply];
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod history_tests;
