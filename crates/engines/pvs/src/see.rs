//! Static exchange evaluation.

use chess_core::{bishop_attacks, rook_attacks, Bitboard, Move, PieceKind, Position};

pub const SEE_VALUES: [i32; 6] = [100, 300, 300, 500, 900, 0];

#[inline]
pub fn see_value(kind: PieceKind) -> i32 {
    SEE_VALUES[kind.idx()]
}

/// Material won by `mv` before any recapture.
pub fn capture_gain(pos: &Position, mv: Move) -> i32 {
    let captured = if mv.is_en_passant() {
        see_value(PieceKind::Pawn)
    } else if mv.is_capture() {
        pos.kind_at(mv.to()).map_or(0, see_value)
    } else {
        0
    };
    let promotion = mv
        .promotion()
        .map_or(0, |kind| see_value(kind) - see_value(PieceKind::Pawn));
    captured + promotion
}

/// Does the exchange sequence started by `mv` on its target square net at least `threshold`?
///
/// Both sides always recapture with their least valuable attacker, and sliders
/// hidden behind a piece that just captured join in as x-rays.
pub fn see(pos: &Position, mv: Move, threshold: i32) -> bool {
    if mv.is_castle() {
        return threshold <= 0;
    }

    let from = mv.from();
    let to = mv.to();
    let Some(mover) = pos.kind_at(from) else {
        return false;
    };

    let mut balance = capture_gain(pos, mv) - threshold;
    if balance < 0 {
        return false;
    }

    // The piece standing on the square once this move is played.
    let next_victim = mv.promotion().unwrap_or(mover);
    balance -= see_value(next_victim);
    if balance >= 0 {
        return true;
    }

    let diagonal = pos.kind(PieceKind::Bishop) | pos.kind(PieceKind::Queen);
    let straight = pos.kind(PieceKind::Rook) | pos.kind(PieceKind::Queen);

    let mut occupied = (pos.occupied() ^ Bitboard::from_square(from)) | Bitboard::from_square(to);
    if mv.is_en_passant() {
        occupied ^= Bitboard::from_square(to ^ 8);
    }

    let mut attackers = pos.attackers_to(to, occupied) & occupied;
    let mut colour = pos.side_to_move().other();

    loop {
        let my_attackers = attackers & pos.color(colour);
        if my_attackers.is_empty() {
            break;
        }

        let mut victim = PieceKind::Pawn;
        for kind in PieceKind::ALL {
            if (my_attackers & pos.kind(kind)).is_nonempty() {
                victim = kind;
                break;
            }
        }

        occupied ^= (my_attackers & pos.kind(victim)).lowest();

        // Capturing may uncover sliders behind the capturer.
        if matches!(victim, PieceKind::Pawn | PieceKind::Bishop | PieceKind::Queen) {
            attackers |= bishop_attacks(to, occupied) & diagonal;
        }
        if matches!(victim, PieceKind::Rook | PieceKind::Queen) {
            attackers |= rook_attacks(to, occupied) & straight;
        }
        attackers &= occupied;

        colour = colour.other();
        balance = -balance - 1 - see_value(victim);

        if balance >= 0 {
            // A king may only take last: if the other side still attacks, the
            // capture was illegal and the king's side loses the exchange.
            if victim == PieceKind::King && (attackers & pos.color(colour)).is_nonempty() {
                colour = colour.other();
            }
            break;
        }
    }

    // The side that failed to recapture loses.
    pos.side_to_move() != colour
}

#[cfg(test)]
#[path = "see_tests.rs"]
mod see_tests;
