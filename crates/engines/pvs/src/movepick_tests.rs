use super::*;
use chess_core::{legal_moves, parse_uci_move, Color};

const FEN: &str = "4k3/8/3p4/n3p3/8/8/8/R3RK2 w - - 0 1";

fn mv(pos: &Position, uci: &str) -> Move {
    parse_uci_move(pos, uci).unwrap_or_else(|| panic!("{uci} is not legal"))
}

fn ordered(pos: &Position, ctx: &OrderingContext<'_>) -> Vec<Move> {
    MovePicker::new(pos, GenType::All, ctx).map(|s| s.mv).collect()
}

#[test]
fn test_stages_come_out_in_order() {
    let pos = Position::from_fen(FEN).unwrap();
    let history = History::new();
    let tt_move = mv(&pos, "a1a4");
    let killer = mv(&pos, "f1g2");
    let ctx = OrderingContext {
        history: &history,
        tt_move,
        killers: [killer, Move::NULL],
        threats: Bitboard::EMPTY,
        conts: [None, None],
    };

    let order = ordered(&pos, &ctx);
    assert_eq!(order.len(), legal_moves(&pos).len());
    assert_eq!(order[0], tt_move);
    assert_eq!(order[1], mv(&pos, "a1a5"));
    assert_eq!(order[2], killer);
    assert_eq!(*order.last().unwrap(), mv(&pos, "e1e5"));
}

#[test]
fn test_every_legal_move_is_yielded_once() {
    let pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let history = History::new();
    let ctx = OrderingContext {
        history: &history,
        tt_move: Move::NULL,
        killers: [Move::NULL; 2],
        threats: pos.attacked_by(Color::Black),
        conts: [None, None],
    };

    let mut picked = ordered(&pos, &ctx);
    let mut legal = legal_moves(&pos);
    picked.sort_by_key(|m| m.raw());
    legal.sort_by_key(|m| m.raw());
    assert_eq!(picked, legal);
}

#[test]
fn test_hash_move_from_another_position_is_ignored() {
    let pos = Position::from_fen(FEN).unwrap();
    let history = History::new();
    let foreign = Move::new(8, 24, chess_core::MoveFlag::DoublePush);
    let ctx = OrderingContext {
        history: &history,
        tt_move: foreign,
        killers: [Move::NULL; 2],
        threats: Bitboard::EMPTY,
        conts: [None, None],
    };

    let order = ordered(&pos, &ctx);
    assert!(!order.contains(&foreign));
    assert_eq!(order[0], mv(&pos, "a1a5"));
}

#[test]
fn test_quiet_history_orders_quiets() {
    let pos = Position::from_fen(FEN).unwrap();
    let mut history = History::new();
    let favourite = mv(&pos, "e1e3");
    history.update_main(Color::White, favourite, Bitboard::EMPTY, 1500);
    let ctx = OrderingContext {
        history: &history,
        tt_move: Move::NULL,
        killers: [Move::NULL; 2],
        threats: Bitboard::EMPTY,
        conts: [None, None],
    };

    let order = ordered(&pos, &ctx);
    // Only the winning capture beats a quiet with good history.
    assert_eq!(order[0], mv(&pos, "a1a5"));
    assert_eq!(order[1], favourite);
}

#[test]
fn test_noisy_generation_only_yields_captures_and_promotions() {
    let pos = Position::from_fen("4k3/1P6/8/n3p3/8/8/8/R3RK2 w - - 0 1").unwrap();
    let history = History::new();
    let ctx = OrderingContext {
        history: &history,
        tt_move: Move::NULL,
        killers: [Move::NULL; 2],
        threats: Bitboard::EMPTY,
        conts: [None, None],
    };

    let picker = MovePicker::new(&pos, GenType::Noisy, &ctx);
    let all: Vec<ScoredMove> = picker.collect();
    assert!(all.iter().all(|s| s.mv.is_noisy()));
    // Two rook captures and four promotions.
    assert_eq!(all.len(), 6);
    assert_eq!(all[0].mv, mv(&pos, "b7b8q"));
    assert!(all[0].is_good_noisy());
}
