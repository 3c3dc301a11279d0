//! Legal move generation.
//!
//! Moves are generated legal directly: checkers and pins are computed once per
//! position, so no candidate move ever has to be played and tested.

use crate::attacks::{
    between, bishop_attacks, king_attacks, knight_attacks, line, pawn_attacks, rook_attacks,
};
use crate::bitboard::Bitboard;
use crate::board::Position;
use crate::types::*;

/// Which subset of the legal moves to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenType {
    All,
    /// Captures (including en passant) and promotions.
    Noisy,
}

/// Generate all legal moves, returning a freshly allocated vector.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let mut out = Vec::with_capacity(64);
    legal_moves_into(pos, &mut out);
    out
}

/// Generate all legal moves into the provided buffer, reusing it across calls.
pub fn legal_moves_into(pos: &Position, out: &mut Vec<Move>) {
    generate(pos, GenType::All, out);
}

pub fn generate(pos: &Position, gen: GenType, out: &mut Vec<Move>) {
    out.clear();

    let us = pos.side_to_move();
    let them = us.other();
    let ksq = pos.king_sq(us);
    let occupied = pos.occupied();
    let own = pos.color(us);
    let enemy = pos.color(them);
    let checkers = pos.checkers();

    // The king is lifted off the board so it cannot hide behind itself on a slider ray.
    let without_king = occupied ^ Bitboard::from_square(ksq);
    let mut king_targets = king_attacks(ksq) & !own;
    if gen == GenType::Noisy {
        king_targets &= enemy;
    }
    for to in king_targets {
        if (pos.attackers_to(to, without_king) & enemy).is_empty() {
            push(out, ksq, to, enemy.contains(to));
        }
    }

    if checkers.more_than_one() {
        return;
    }

    // Squares a non-king move may land on: anything outside our own pieces, or,
    // in check, the checker itself and the squares between it and the king.
    let mut target = !own;
    if let Some(checker) = checkers.lsb() {
        target = checkers | between(ksq, checker);
    }
    let piece_target = match gen {
        GenType::All => target,
        GenType::Noisy => target & enemy,
    };

    let pinned = pos.pinned(us);
    let restrict = |from: u8| {
        if pinned.contains(from) {
            line(ksq, from)
        } else {
            Bitboard::ALL
        }
    };

    // A pinned knight can never stay on its pin line.
    for from in pos.pieces(us, PieceKind::Knight) & !pinned {
        for to in knight_attacks(from) & piece_target {
            push(out, from, to, enemy.contains(to));
        }
    }

    let queens = pos.pieces(us, PieceKind::Queen);
    for from in pos.pieces(us, PieceKind::Bishop) | queens {
        for to in bishop_attacks(from, occupied) & piece_target & restrict(from) {
            push(out, from, to, enemy.contains(to));
        }
    }
    for from in pos.pieces(us, PieceKind::Rook) | queens {
        for to in rook_attacks(from, occupied) & piece_target & restrict(from) {
            push(out, from, to, enemy.contains(to));
        }
    }

    gen_pawns(pos, gen, target, pinned, out);

    if gen == GenType::All && checkers.is_empty() {
        gen_castling(pos, out);
    }
}

#[inline(always)]
fn push(out: &mut Vec<Move>, from: u8, to: u8, capture: bool) {
    let flag = if capture {
        MoveFlag::Capture
    } else {
        MoveFlag::Quiet
    };
    out.push(Move::new(from, to, flag));
}

fn push_promotions(out: &mut Vec<Move>, from: u8, to: u8, capture: bool) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Knight,
        PieceKind::Rook,
        PieceKind::Bishop,
    ] {
        out.push(Move::new(from, to, MoveFlag::promotion(kind, capture)));
    }
}

fn gen_pawns(
    pos: &Position,
    gen: GenType,
    target: Bitboard,
    pinned: Bitboard,
    out: &mut Vec<Move>,
) {
    let us = pos.side_to_move();
    let them = us.other();
    let ksq = pos.king_sq(us);
    let occupied = pos.occupied();
    let enemy = pos.color(them);
    let (start_rank, promo_rank) = match us {
        Color::White => (Bitboard::RANK_2, Bitboard::RANK_8),
        Color::Black => (Bitboard::RANK_7, Bitboard::RANK_1),
    };

    for from in pos.pieces(us, PieceKind::Pawn) {
        let allowed = if pinned.contains(from) {
            line(ksq, from) & target
        } else {
            target
        };

        let single = Bitboard::from_square(from).forward(us) & !occupied;
        if let Some(to) = (single & allowed).lsb() {
            if promo_rank.contains(to) {
                push_promotions(out, from, to, false);
            } else if gen == GenType::All {
                out.push(Move::new(from, to, MoveFlag::Quiet));
            }
        }
        if gen == GenType::All && start_rank.contains(from) {
            let double = single.forward(us) & !occupied & allowed;
            if let Some(to) = double.lsb() {
                out.push(Move::new(from, to, MoveFlag::DoublePush));
            }
        }

        for to in pawn_attacks(from, us) & enemy & allowed {
            if promo_rank.contains(to) {
                push_promotions(out, from, to, true);
            } else {
                out.push(Move::new(from, to, MoveFlag::Capture));
            }
        }

        if let Some(ep) = pos.en_passant() {
            if pawn_attacks(from, us).contains(ep) && en_passant_is_legal(pos, from, ep) {
                out.push(Move::new(from, ep, MoveFlag::EnPassant));
            }
        }
    }
}

/// Replays the capture on a scratch occupancy and asks whether the king is attacked.
///
/// This covers the two-pawns-leave-the-rank discovered check as well as pins and
/// checks the captured pawn was or was not giving.
fn en_passant_is_legal(pos: &Position, from: u8, ep: u8) -> bool {
    let us = pos.side_to_move();
    let captured = ep ^ 8;
    let ksq = pos.king_sq(us);
    let occupied = (pos.occupied()
        ^ Bitboard::from_square(from)
        ^ Bitboard::from_square(captured))
        | Bitboard::from_square(ep);
    let enemy = pos.color(us.other()) & !Bitboard::from_square(captured);
    (pos.attackers_to(ksq, occupied) & enemy).is_empty()
}

fn gen_castling(pos: &Position, out: &mut Vec<Move>) {
    let us = pos.side_to_move();
    let them = us.other();
    let rights = pos.castling();
    let occupied = pos.occupied();
    let base = match us {
        Color::White => 0u8,
        Color::Black => 56u8,
    };
    let king = base + 4;
    if pos.king_sq(us) != king {
        return;
    }
    let own_rook = pos.pieces(us, PieceKind::Rook);

    // Kingside: f and g empty, king not passing through or landing on an attacked square.
    if rights.kingside(us)
        && own_rook.contains(base + 7)
        && (between(king, base + 7) & occupied).is_empty()
        && !pos.is_square_attacked(base + 5, them)
        && !pos.is_square_attacked(base + 6, them)
    {
        out.push(Move::new(king, base + 6, MoveFlag::KingCastle));
    }
    // Queenside: b, c and d empty; only d and c must be safe.
    if rights.queenside(us)
        && own_rook.contains(base)
        && (between(king, base) & occupied).is_empty()
        && !pos.is_square_attacked(base + 3, them)
        && !pos.is_square_attacked(base + 2, them)
    {
        out.push(Move::new(king, base + 2, MoveFlag::QueenCastle));
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
