use super::*;
use chess_core::parse_uci_move;

fn play(pos: &Position, moves: &[&str]) -> (Position, Vec<u64>) {
    let mut pos = pos.clone();
    let mut hashes = Vec::new();
    for txt in moves {
        let mv = parse_uci_move(&pos, txt).unwrap_or_else(|| panic!("{txt} is not legal"));
        hashes.push(pos.hash());
        pos = pos.make_move(mv);
    }
    (pos, hashes)
}

const SHUFFLE: [&str; 4] = ["g1f3", "g8f6", "f3g1", "f6g8"];

#[test]
fn test_mate_scores_convert_to_moves() {
    assert_eq!(to_score(MATE - 1), Score::Mate(1));
    assert_eq!(to_score(MATE - 3), Score::Mate(2));
    assert_eq!(to_score(-MATE + 2), Score::Mate(-1));
    assert_eq!(to_score(-MATE + 4), Score::Mate(-2));
    assert_eq!(to_score(57), Score::Cp(57));
    assert_eq!(to_score(-MATE_BOUND + 1), Score::Cp(-MATE_BOUND + 1));
}

#[test]
fn test_soft_budget_shrinks_for_a_dominant_best_move() {
    let soft = Duration::from_millis(1000);
    assert_eq!(scaled_soft_budget(soft, 0, 0), soft);

    let confident = scaled_soft_budget(soft, 1000, 1000);
    let unsure = scaled_soft_budget(soft, 0, 1000);
    assert_eq!(confident, Duration::from_millis(675));
    assert_eq!(unsure, Duration::from_millis(2025));
    assert!(scaled_soft_budget(soft, 500, 1000) < unsure);
}

#[test]
fn test_lmr_grows_with_depth_and_move_number() {
    let lmr = LmrTable::new();
    assert_eq!(lmr.get(1, 1), 0);
    assert!(lmr.get(10, 20) > lmr.get(3, 20));
    assert!(lmr.get(10, 30) >= lmr.get(10, 5));
    // Out-of-range lookups are clamped rather than panicking.
    assert_eq!(lmr.get(500, 500), lmr.get(63, 63));
    assert_eq!(lmr.get(-3, 4), 0);
}

#[test]
fn test_pv_table_prepends_moves() {
    let a = Move::new(12, 28, chess_core::MoveFlag::DoublePush);
    let b = Move::new(52, 36, chess_core::MoveFlag::DoublePush);
    let c = Move::new(6, 21, chess_core::MoveFlag::Quiet);

    let mut pv = PvTable::new();
    pv.clear(3);
    pv.update(2, c);
    pv.update(1, b);
    pv.update(0, a);
    assert_eq!(pv.line(0), &[a, b, c]);
    assert_eq!(pv.line(1), &[b, c]);

    pv.clear(1);
    pv.update(0, a);
    assert_eq!(pv.line(0), &[a]);
}

#[test]
fn test_single_earlier_occurrence_in_game_is_not_a_draw() {
    let (pos, hashes) = play(&Position::startpos(), &SHUFFLE);
    assert_eq!(pos.hash(), hashes[0]);

    let mut ctx = SearchContext::new(1);
    ctx.set_game_history(&hashes);
    ctx.path[0] = pos.hash();
    assert!(!ctx.is_repetition(&pos, 0));
}

#[test]
fn test_two_earlier_occurrences_in_game_are_a_draw() {
    let moves: Vec<&str> = SHUFFLE.iter().chain(SHUFFLE.iter()).copied().collect();
    let (pos, hashes) = play(&Position::startpos(), &moves);

    let mut ctx = SearchContext::new(1);
    ctx.set_game_history(&hashes);
    ctx.path[0] = pos.hash();
    assert!(ctx.is_repetition(&pos, 0));
}

#[test]
fn test_one_repetition_inside_the_tree_is_a_draw() {
    let (pos, hashes) = play(&Position::startpos(), &SHUFFLE);

    let mut ctx = SearchContext::new(1);
    // Root is some unrelated position; the shuffle happens below it.
    ctx.path[0] = 0xDEAD_BEEF;
    ctx.path[1..5].copy_from_slice(&hashes);
    ctx.path[5] = pos.hash();
    assert!(ctx.is_repetition(&pos, 5));
}

#[test]
fn test_repetition_scan_stops_at_irreversible_moves() {
    // The pawn push resets the halfmove clock, so the older copies are out of reach.
    let (pos, hashes) = play(
        &Position::startpos(),
        &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8", "e2e4", "e7e5"],
    );
    assert_eq!(pos.halfmove_clock(), 0);

    let mut ctx = SearchContext::new(1);
    ctx.set_game_history(&hashes);
    assert!(!ctx.is_repetition(&pos, 0));
}
