//! Bitboard position with copy-make move application.
//!
//! A `Position` is a plain value: applying a move clones it and mutates the
//! clone, so every search ply owns its own copy and backtracking is just
//! dropping it. The Zobrist keys and both NNUE accumulators are updated
//! incrementally on every piece placement and removal.

use thiserror::Error;

use crate::attacks::{
    between, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::bitboard::Bitboard;
use crate::nnue::{feature_index, network, wants_mirror, Accumulator, AccumulatorPair};
use crate::types::*;
use crate::zobrist::ZOBRIST;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    FieldCount(usize),
    #[error("board section must have 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankLength { rank: usize },
    #[error("invalid piece character '{0}'")]
    Piece(char),
    #[error("invalid side to move '{0}'")]
    Side(String),
    #[error("invalid castling character '{0}'")]
    Castling(char),
    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),
    #[error("invalid move counter '{0}'")]
    Counter(String),
    #[error("each side needs exactly one king")]
    Kings,
    #[error("the side not to move is in check")]
    OpponentInCheck,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CastlingRights {
    pub wk: bool,
    pub wq: bool,
    pub bk: bool,
    pub bq: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        wk: true,
        wq: true,
        bk: true,
        bq: true,
    };

    pub fn kingside(self, color: Color) -> bool {
        match color {
            Color::White => self.wk,
            Color::Black => self.bk,
        }
    }

    pub fn queenside(self, color: Color) -> bool {
        match color {
            Color::White => self.wq,
            Color::Black => self.bq,
        }
    }

    /// Drops every right that depends on a king or rook standing on `sq`.
    fn revoke_square(&mut self, sq: u8) {
        match sq {
            0 => self.wq = false,
            7 => self.wk = false,
            4 => {
                self.wk = false;
                self.wq = false;
            }
            56 => self.bq = false,
            63 => self.bk = false,
            60 => {
                self.bk = false;
                self.bq = false;
            }
            _ => {}
        }
    }

    fn key(self) -> u64 {
        [self.wk, self.wq, self.bk, self.bq]
            .iter()
            .enumerate()
            .filter(|(_, held)| **held)
            .fold(0, |key, (i, _)| key ^ ZOBRIST.castling_key(i))
    }
}

#[derive(Clone, Debug)]
pub struct Position {
    pieces: [Bitboard; 6],
    colors: [Bitboard; 2],
    occupied: Bitboard,
    side_to_move: Color,
    castling: CastlingRights,
    /// Square behind a pawn that just advanced two, only when a capture is possible.
    en_passant: Option<u8>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    pawn_key: u64,
    non_pawn_key: u64,
    accumulators: AccumulatorPair,
}

impl Position {
    fn empty() -> Self {
        Position {
            pieces: [Bitboard::EMPTY; 6],
            colors: [Bitboard::EMPTY; 2],
            occupied: Bitboard::EMPTY,
            side_to_move: Color::White,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            pawn_key: 0,
            non_pawn_key: 0,
            accumulators: AccumulatorPair::new(network()),
        }
    }

    pub fn startpos() -> Self {
        let mut p = Position::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            let f = f as u8;
            p.put_piece(Color::White, PieceKind::Pawn, 8 + f);
            p.put_piece(Color::Black, PieceKind::Pawn, 48 + f);
            p.put_piece(Color::White, kind, f);
            p.put_piece(Color::Black, kind, 56 + f);
        }
        p.castling = CastlingRights::ALL;
        p.finish_setup();
        p
    }

    /// Parses Forsyth-Edwards Notation. The clock fields are optional.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::FieldCount(parts.len()));
        }

        let mut p = Position::empty();
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (rank_idx, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_idx as i8; // FEN lists rank 8 .. 1
            let mut file: i8 = 0;
            for ch in rank_str.chars() {
                if let Some(d) = ch.to_digit(10) {
                    file += d as i8;
                } else {
                    let color = if ch.is_ascii_uppercase() {
                        Color::White
                    } else {
                        Color::Black
                    };
                    let kind = match ch.to_ascii_lowercase() {
                        'p' => PieceKind::Pawn,
                        'n' => PieceKind::Knight,
                        'b' => PieceKind::Bishop,
                        'r' => PieceKind::Rook,
                        'q' => PieceKind::Queen,
                        'k' => PieceKind::King,
                        _ => return Err(FenError::Piece(ch)),
                    };
                    let s = sq(file, rank).ok_or(FenError::RankLength { rank: rank_idx })?;
                    p.put_piece(color, kind, s);
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::RankLength { rank: rank_idx });
                }
            }
            if file != 8 {
                return Err(FenError::RankLength { rank: rank_idx });
            }
        }
        for color in Color::ALL {
            if p.pieces(color, PieceKind::King).popcount() != 1 {
                return Err(FenError::Kings);
            }
        }

        p.side_to_move = match parts[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::Side(other.to_string())),
        };

        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => p.castling.wk = true,
                    'Q' => p.castling.wq = true,
                    'k' => p.castling.bk = true,
                    'q' => p.castling.bq = true,
                    _ => return Err(FenError::Castling(c)),
                }
            }
        }

        let us = p.side_to_move;
        if p.is_square_attacked(p.king_sq(us.other()), us) {
            return Err(FenError::OpponentInCheck);
        }

        if parts[3] != "-" {
            let bad_ep = || FenError::EnPassant(parts[3].to_string());
            let ep = coord_to_sq(parts[3]).ok_or_else(bad_ep)?;
            // The target sits behind a pawn that just made a double push.
            let (target_rank, pushed) = match us {
                Color::White => (5, ep.wrapping_sub(8)),
                Color::Black => (2, ep + 8),
            };
            if ep / 8 != target_rank
                || p.occupied.contains(ep)
                || !p.pieces(us.other(), PieceKind::Pawn).contains(pushed)
            {
                return Err(bad_ep());
            }
            p.set_en_passant_if_capturable(ep);
        }

        let counter = |field: Option<&&str>, default: u32| -> Result<u32, FenError> {
            match field {
                None => Ok(default),
                Some(s) => s.parse().map_err(|_| FenError::Counter(s.to_string())),
            }
        };
        p.halfmove_clock = counter(parts.get(4), 0)?;
        p.fullmove_number = counter(parts.get(5), 1)?;

        p.finish_setup();
        Ok(p)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(rank * 8 + file) {
                    None => empty += 1,
                    Some(pc) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        let ch = b"pnbrqk"[pc.kind.idx()] as char;
                        fen.push(if pc.color == Color::White {
                            ch.to_ascii_uppercase()
                        } else {
                            ch
                        });
                    }
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen.push_str(match self.side_to_move {
            Color::White => " w ",
            Color::Black => " b ",
        });
        let c = self.castling;
        let rights: String = [(c.wk, 'K'), (c.wq, 'Q'), (c.bk, 'k'), (c.bq, 'q')]
            .iter()
            .filter(|(held, _)| *held)
            .map(|(_, ch)| *ch)
            .collect();
        fen.push_str(if rights.is_empty() { "-" } else { &rights });
        fen.push(' ');
        match self.en_passant {
            Some(ep) => fen.push_str(&sq_to_coord(ep)),
            None => fen.push('-'),
        }
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// Hashes side/castling/en-passant and rebuilds both accumulators.
    fn finish_setup(&mut self) {
        self.hash ^= self.castling.key();
        if self.side_to_move == Color::Black {
            self.hash ^= ZOBRIST.side_to_move;
        }
        for color in Color::ALL {
            self.refresh_perspective(color);
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    #[inline(always)]
    pub fn en_passant(&self) -> Option<u8> {
        self.en_passant
    }

    #[inline(always)]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline(always)]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    #[inline(always)]
    pub fn pawn_key(&self) -> u64 {
        self.pawn_key
    }

    #[inline(always)]
    pub fn non_pawn_key(&self) -> u64 {
        self.non_pawn_key
    }

    #[inline(always)]
    pub fn accumulators(&self) -> &AccumulatorPair {
        &self.accumulators
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    #[inline(always)]
    pub fn color(&self, color: Color) -> Bitboard {
        self.colors[color.idx()]
    }

    #[inline(always)]
    pub fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.idx()]
    }

    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[kind.idx()] & self.colors[color.idx()]
    }

    pub fn kind_at(&self, sq: u8) -> Option<PieceKind> {
        if !self.occupied.contains(sq) {
            return None;
        }
        PieceKind::ALL
            .into_iter()
            .find(|k| self.pieces[k.idx()].contains(sq))
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        let kind = self.kind_at(sq)?;
        let color = if self.colors[0].contains(sq) {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece { color, kind })
    }

    #[inline(always)]
    pub fn king_sq(&self, color: Color) -> u8 {
        self.pieces(color, PieceKind::King).0.trailing_zeros() as u8
    }

    // -------------------------------------------------------------------------
    // Attacks
    // -------------------------------------------------------------------------

    /// Pieces of both colors attacking `sq` under occupancy `occupied`.
    pub fn attackers_to(&self, sq: u8, occupied: Bitboard) -> Bitboard {
        let diagonal = self.kind(PieceKind::Bishop) | self.kind(PieceKind::Queen);
        let straight = self.kind(PieceKind::Rook) | self.kind(PieceKind::Queen);
        (pawn_attacks(sq, Color::Black) & self.pieces(Color::White, PieceKind::Pawn))
            | (pawn_attacks(sq, Color::White) & self.pieces(Color::Black, PieceKind::Pawn))
            | (knight_attacks(sq) & self.kind(PieceKind::Knight))
            | (king_attacks(sq) & self.kind(PieceKind::King))
            | (bishop_attacks(sq, occupied) & diagonal)
            | (rook_attacks(sq, occupied) & straight)
    }

    pub fn is_square_attacked(&self, sq: u8, by: Color) -> bool {
        (self.attackers_to(sq, self.occupied) & self.color(by)).is_nonempty()
    }

    /// Every square `color` attacks.
    pub fn attacked_by(&self, color: Color) -> Bitboard {
        let pawns = self.pieces(color, PieceKind::Pawn).forward(color);
        let mut attacked = pawns.east() | pawns.west();
        for sq in self.pieces(color, PieceKind::Knight) {
            attacked |= knight_attacks(sq);
        }
        for sq in self.pieces(color, PieceKind::Bishop) | self.pieces(color, PieceKind::Queen) {
            attacked |= bishop_attacks(sq, self.occupied);
        }
        for sq in self.pieces(color, PieceKind::Rook) | self.pieces(color, PieceKind::Queen) {
            attacked |= rook_attacks(sq, self.occupied);
        }
        attacked | king_attacks(self.king_sq(color))
    }

    /// Enemy pieces giving check to the side to move.
    pub fn checkers(&self) -> Bitboard {
        let us = self.side_to_move;
        self.attackers_to(self.king_sq(us), self.occupied) & self.color(us.other())
    }

    #[inline]
    pub fn in_check(&self) -> bool {
        self.checkers().is_nonempty()
    }

    /// Pieces of `color` that shield their own king from an enemy slider.
    pub fn pinned(&self, color: Color) -> Bitboard {
        let ksq = self.king_sq(color);
        let them = color.other();
        let enemy = self.color(them);
        let snipers = (rook_attacks(ksq, enemy)
            & (self.pieces(them, PieceKind::Rook) | self.pieces(them, PieceKind::Queen)))
            | (bishop_attacks(ksq, enemy)
                & (self.pieces(them, PieceKind::Bishop) | self.pieces(them, PieceKind::Queen)));

        let mut pinned = Bitboard::EMPTY;
        for sniper in snipers {
            let blockers = between(ksq, sniper) & self.occupied;
            if blockers.popcount() == 1 {
                pinned |= blockers & self.color(color);
            }
        }
        pinned
    }

    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        (self.color(color) & !self.kind(PieceKind::Pawn) & !self.kind(PieceKind::King))
            .is_nonempty()
    }

    // -------------------------------------------------------------------------
    // Draw rules
    // -------------------------------------------------------------------------

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Bare kings, a single minor piece, or bishops that all share one square color.
    pub fn is_insufficient_material(&self) -> bool {
        const DARK_SQUARES: Bitboard = Bitboard(0xAA55_AA55_AA55_AA55);

        let heavy =
            self.kind(PieceKind::Pawn) | self.kind(PieceKind::Rook) | self.kind(PieceKind::Queen);
        if heavy.is_nonempty() {
            return false;
        }
        let knights = self.kind(PieceKind::Knight);
        let bishops = self.kind(PieceKind::Bishop);
        if (knights | bishops).popcount() <= 1 {
            return true;
        }
        knights.is_empty()
            && ((bishops & DARK_SQUARES).is_empty() || (bishops & !DARK_SQUARES).is_empty())
    }

    // -------------------------------------------------------------------------
    // Copy-make
    // -------------------------------------------------------------------------

    /// The position after `mv`, which must be legal here.
    pub fn make_move(&self, mv: Move) -> Position {
        let mut next = self.clone();
        next.apply(mv);
        next
    }

    /// The position with the turn passed to the opponent.
    ///
    /// The halfmove clock restarts so repetition scans never look across a null move.
    pub fn make_null_move(&self) -> Position {
        let mut next = self.clone();
        next.clear_en_passant();
        next.halfmove_clock = 0;
        next.side_to_move = next.side_to_move.other();
        next.hash ^= ZOBRIST.side_to_move;
        next
    }

    fn apply(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.other();
        let (from, to) = (mv.from(), mv.to());
        let Some(kind) = self.kind_at(from) else {
            debug_assert!(false, "no piece on from-square of {mv:?}");
            return;
        };

        self.clear_en_passant();
        let old_castling = self.castling;
        self.halfmove_clock += 1;

        if mv.is_en_passant() {
            self.remove_piece(them, PieceKind::Pawn, to ^ 8);
        } else if mv.is_capture() {
            if let Some(captured) = self.kind_at(to) {
                self.remove_piece(them, captured, to);
            }
        }
        if mv.is_capture() || kind == PieceKind::Pawn {
            self.halfmove_clock = 0;
        }

        self.remove_piece(us, kind, from);
        self.put_piece(us, mv.promotion().unwrap_or(kind), to);

        match mv.flag() {
            MoveFlag::KingCastle => {
                self.remove_piece(us, PieceKind::Rook, to + 1);
                self.put_piece(us, PieceKind::Rook, to - 1);
            }
            MoveFlag::QueenCastle => {
                self.remove_piece(us, PieceKind::Rook, to - 2);
                self.put_piece(us, PieceKind::Rook, to + 1);
            }
            MoveFlag::DoublePush => {
                self.side_to_move = them;
                self.set_en_passant_if_capturable((from + to) / 2);
                self.side_to_move = us;
            }
            _ => {}
        }

        self.castling.revoke_square(from);
        self.castling.revoke_square(to);
        self.hash ^= old_castling.key() ^ self.castling.key();

        if us == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = them;
        self.hash ^= ZOBRIST.side_to_move;

        if kind == PieceKind::King && wants_mirror(to) != self.accumulators.mirrored[us.idx()] {
            self.refresh_perspective(us);
        }
    }

    /// Records `ep` as the en-passant target when a pawn of the side to move can take there.
    fn set_en_passant_if_capturable(&mut self, ep: u8) {
        let us = self.side_to_move;
        if (pawn_attacks(ep, us.other()) & self.pieces(us, PieceKind::Pawn)).is_nonempty() {
            self.en_passant = Some(ep);
            self.hash ^= ZOBRIST.ep_key(ep % 8);
        }
    }

    fn clear_en_passant(&mut self) {
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= ZOBRIST.ep_key(ep % 8);
        }
    }

    fn put_piece(&mut self, color: Color, kind: PieceKind, sq: u8) {
        self.pieces[kind.idx()].set(sq);
        self.colors[color.idx()].set(sq);
        self.occupied.set(sq);
        self.toggle_keys(color, kind, sq);
        self.accumulators.add(color, kind, sq, network());
    }

    fn remove_piece(&mut self, color: Color, kind: PieceKind, sq: u8) {
        self.pieces[kind.idx()].clear(sq);
        self.colors[color.idx()].clear(sq);
        self.occupied.clear(sq);
        self.toggle_keys(color, kind, sq);
        self.accumulators.remove(color, kind, sq, network());
    }

    #[inline(always)]
    fn toggle_keys(&mut self, color: Color, kind: PieceKind, sq: u8) {
        let key = ZOBRIST.piece_key(color, kind, sq);
        self.hash ^= key;
        if kind == PieceKind::Pawn {
            self.pawn_key ^= key;
        } else {
            self.non_pawn_key ^= key;
        }
    }

    /// Rebuilds one perspective's accumulator from scratch.
    fn refresh_perspective(&mut self, perspective: Color) {
        let net = network();
        let mirrored = wants_mirror(self.king_sq(perspective));
        let mut acc = Accumulator::new(net);
        for color in Color::ALL {
            for kind in PieceKind::ALL {
                for sq in self.pieces(color, kind) {
                    acc.add_feature(feature_index(perspective, mirrored, color, kind, sq), net);
                }
            }
        }
        self.accumulators.acc[perspective.idx()] = acc;
        self.accumulators.mirrored[perspective.idx()] = mirrored;
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
