use super::*;
use chess_core::{legal_moves, parse_uci_move};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn setup(fen: &str, uci: &str) -> (Position, Move) {
    let pos = Position::from_fen(fen).unwrap();
    let mv = parse_uci_move(&pos, uci).unwrap_or_else(|| panic!("{uci} is not legal in {fen}"));
    (pos, mv)
}

/// Largest threshold the move passes, found by scanning.
fn see_score(pos: &Position, mv: Move) -> i32 {
    (-1000..=1000).rev().find(|&t| see(pos, mv, t)).unwrap_or(-1001)
}

#[test]
fn test_free_pawn() {
    let (pos, mv) = setup("4k3/8/8/4p3/8/8/8/4RK2 w - - 0 1", "e1e5");
    assert!(see(&pos, mv, 100));
    assert!(!see(&pos, mv, 101));
}

#[test]
fn test_rook_takes_defended_pawn() {
    let (pos, mv) = setup("4k3/8/3p4/4p3/8/8/8/4RK2 w - - 0 1", "e1e5");
    assert!(!see(&pos, mv, 0));
    assert!(see(&pos, mv, -400));
    assert!(!see(&pos, mv, -399));
}

#[test]
fn test_pawn_takes_defended_knight() {
    let (pos, mv) = setup("4k3/8/3p4/4n3/3P4/8/8/4K3 w - - 0 1", "d4e5");
    assert_eq!(see_score(&pos, mv), 200);
}

#[test]
fn test_xray_rook_backs_up_the_capture() {
    let (pos, mv) = setup("4k3/4r3/8/4p3/8/8/4R3/4R1K1 w - - 0 1", "e2e5");
    assert_eq!(see_score(&pos, mv), 100);
}

#[test]
fn test_quiet_move_onto_attacked_square_loses_the_piece() {
    let (pos, mv) = setup("4k3/8/8/4p3/8/8/8/3QK3 w - - 0 1", "d1d4");
    assert!(!see(&pos, mv, 0));
    assert_eq!(see_score(&pos, mv), -900);
}

#[test]
fn test_king_cannot_recapture_into_a_defended_square() {
    // Rxe7+ wins the rook: Kxe7 is impossible because the e-file queen guards e7.
    let (pos, mv) = setup("4k3/4r3/8/8/8/8/4R3/4QK2 w - - 0 1", "e2e7");
    assert_eq!(see_score(&pos, mv), 500);
}

#[test]
fn test_en_passant_wins_a_pawn() {
    let (pos, mv) = setup("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", "e5d6");
    assert!(mv.is_en_passant());
    assert!(see(&pos, mv, 100));
    assert!(!see(&pos, mv, 101));
}

#[test]
fn test_castling_is_neutral() {
    let (pos, mv) = setup("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1");
    assert!(see(&pos, mv, 0));
    assert!(!see(&pos, mv, 1));
}

#[test]
fn test_threshold_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(0x5EE);
    let starts = [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ];

    for fen in starts {
        let mut pos = Position::from_fen(fen).unwrap();
        for _ in 0..40 {
            let moves = legal_moves(&pos);
            if moves.is_empty() {
                break;
            }
            for &mv in &moves {
                let mut passed = true;
                for t in (-1200..=1200).step_by(25) {
                    let now = see(&pos, mv, t);
                    assert!(
                        passed || !now,
                        "see not monotonic for {mv:?} at {t} in {}",
                        pos.to_fen()
                    );
                    passed = now;
                }
            }
            pos = pos.make_move(moves[rng.gen_range(0..moves.len())]);
        }
    }
}
