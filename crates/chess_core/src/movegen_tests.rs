use super::*;
use crate::uci::move_to_uci;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn fen(s: &str) -> Position {
    Position::from_fen(s).unwrap()
}

fn uci_list(pos: &Position) -> Vec<String> {
    let mut v: Vec<String> = legal_moves(pos).into_iter().map(move_to_uci).collect();
    v.sort();
    v
}

#[test]
fn test_startpos_moves() {
    let pos = Position::startpos();
    let moves = legal_moves(&pos);
    // Starting position has 20 legal moves
    assert_eq!(moves.len(), 20);
    assert_eq!(moves.iter().filter(|m| m.flag() == MoveFlag::DoublePush).count(), 8);
}

#[test]
fn test_kiwipete_moves() {
    // Kiwipete position - complex with many move types
    let pos = fen(KIWIPETE);
    let moves = legal_moves(&pos);
    assert_eq!(moves.len(), 48);
    assert_eq!(moves.iter().filter(|m| m.is_castle()).count(), 2);
    assert_eq!(moves.iter().filter(|m| m.is_capture()).count(), 8);
}

#[test]
fn test_double_check_allows_only_king_moves() {
    // Rook on e8 and knight on d3 both check the king on e1.
    let pos = fen("4r2k/8/8/8/8/3n4/8/R3K3 w Q - 0 1");
    assert!(pos.checkers().more_than_one());
    let moves = legal_moves(&pos);
    assert!(!moves.is_empty());
    assert!(moves.iter().all(|m| m.from() == 4));
}

#[test]
fn test_single_check_block_or_king_move() {
    // Bishop b4 checks e1 along c3-d2. The rook may block on d2; d2 itself is
    // covered by the bishop so the king cannot go there.
    let pos = fen("4k3/8/8/8/1b6/8/R7/4K1N1 w - - 0 1");
    assert_eq!(pos.checkers(), Bitboard::from_square(25));
    assert_eq!(uci_list(&pos), ["a2d2", "e1d1", "e1e2", "e1f1", "e1f2"]);
}

#[test]
fn test_pinned_piece_stays_on_pin_ray() {
    // Rook e2 pinned by rook e8 may move along the e-file only.
    let pos = fen("4r2k/8/8/8/8/8/4R3/4K3 w - - 0 1");
    let rook_moves: Vec<String> = uci_list(&pos)
        .into_iter()
        .filter(|m| m.starts_with("e2"))
        .collect();
    assert_eq!(rook_moves.len(), 6); // e3..e8
    assert!(rook_moves.contains(&"e2e8".to_string()));
}

#[test]
fn test_en_passant_discovered_check_is_illegal() {
    // Taking d6 would empty the 5th rank between the king on a5 and the rook on h5.
    let pos = fen("8/8/8/KPp4r/8/8/8/7k w - c6 0 1");
    assert_eq!(pos.en_passant(), coord_to_sq("c6"));
    assert!(!uci_list(&pos).contains(&"b5c6".to_string()));

    let pos = fen("8/8/8/1Pp4r/K7/8/8/7k w - c6 0 1");
    assert!(uci_list(&pos).contains(&"b5c6".to_string()));
}

#[test]
fn test_en_passant_captures_checking_pawn() {
    // The pawn that just arrived on d5 checks the king on e4; taking it en
    // passant is a legal evasion.
    let pos = fen("8/8/8/3pP3/4K3/8/8/7k w - d6 0 1");
    assert!(pos.in_check());
    let moves = uci_list(&pos);
    assert!(moves.contains(&"e5d6".to_string()));
}

#[test]
fn test_promotions_generate_four_pieces() {
    let pos = fen("3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1");
    let moves = legal_moves(&pos);
    let promos: Vec<&Move> = moves.iter().filter(|m| m.is_promotion()).collect();
    // e8 push (4) and dxd8 capture (4)
    assert_eq!(promos.len(), 8);
    assert_eq!(promos.iter().filter(|m| m.is_capture()).count(), 4);
}

#[test]
fn test_castling_blocked_by_attack_or_piece() {
    // f1 attacked by the rook on f8: no kingside castling. b1 occupied: no queenside.
    let pos = fen("5rk1/8/8/8/8/8/8/RN2K2R w KQ - 0 1");
    let moves = uci_list(&pos);
    assert!(!moves.contains(&"e1g1".to_string()));
    assert!(!moves.contains(&"e1c1".to_string()));

    // b1 attacked does not prevent queenside castling.
    let pos = fen("1r4k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
    let moves = uci_list(&pos);
    assert!(moves.contains(&"e1c1".to_string()));
    assert!(moves.contains(&"e1g1".to_string()));
}

#[test]
fn test_mate_and_stalemate_have_no_moves() {
    let mate = fen("r1bqkb1r/pppp1Qpp/2n2n2/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 4");
    assert!(legal_moves(&mate).is_empty());
    assert!(mate.in_check());

    let stalemate = fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
    assert!(legal_moves(&stalemate).is_empty());
    assert!(!stalemate.in_check());
}

#[test]
fn test_noisy_moves_are_the_noisy_subset() {
    for f in [
        KIWIPETE,
        "3r3k/4P3/8/8/8/8/8/4K3 w - - 0 1",
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    ] {
        let pos = fen(f);
        let mut all: Vec<Move> = legal_moves(&pos).into_iter().filter(|m| m.is_noisy()).collect();
        let mut noisy = Vec::new();
        generate(&pos, GenType::Noisy, &mut noisy);
        all.sort_by_key(|m| m.raw());
        noisy.sort_by_key(|m| m.raw());
        assert_eq!(all, noisy, "noisy mismatch in {f}");
    }
}

#[test]
fn test_random_playouts_never_leave_king_attacked() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..200 {
        let mut pos = fen(KIWIPETE);
        for _ in 0..60 {
            let moves = legal_moves(&pos);
            if moves.is_empty() {
                break;
            }
            let mover = pos.side_to_move();
            let mv = moves[rng.gen_range(0..moves.len())];
            pos = pos.make_move(mv);
            assert!(
                !pos.is_square_attacked(pos.king_sq(mover), mover.other()),
                "{} left the king attacked",
                move_to_uci(mv)
            );
        }
    }
}
