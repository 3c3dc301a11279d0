use super::*;
use crate::board::Position;
use crate::types::{Color, PieceKind};

fn sample_network() -> Network {
    // Deterministic small weights: every parameter nonzero, none large enough to clip.
    let mut bytes = Vec::with_capacity(Network::FILE_SIZE);
    let count = Network::FILE_SIZE / 2;
    for i in 0..count {
        let v = ((i * 7919) % 61) as i16 - 30;
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    Network::from_bytes(&bytes).expect("sized correctly")
}

#[test]
fn test_zero_network_evaluates_to_zero() {
    let pos = Position::startpos();
    assert_eq!(evaluate(&pos), 0);
    let pos = Position::from_fen("4k3/8/8/8/8/8/8/QQQQK3 w - - 0 1").unwrap();
    assert_eq!(evaluate(&pos), 0);
}

#[test]
fn test_from_bytes_rejects_wrong_size() {
    let err = Network::from_bytes(&[0u8; 10]).err().unwrap();
    match err {
        NnueError::Size { expected, found } => {
            assert_eq!(expected, Network::FILE_SIZE);
            assert_eq!(found, 10);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = Network::load(std::path::Path::new("/nonexistent/net.bin")).err().unwrap();
    assert!(matches!(err, NnueError::Io { .. }));
}

#[test]
fn test_from_bytes_reads_little_endian_in_file_order() {
    let mut bytes = vec![0u8; Network::FILE_SIZE];
    // first feature weight = 0x0102, last value (output bias) = -1
    bytes[0] = 0x02;
    bytes[1] = 0x01;
    let n = bytes.len();
    bytes[n - 2] = 0xFF;
    bytes[n - 1] = 0xFF;
    let net = Network::from_bytes(&bytes).unwrap();
    assert_eq!(net.feature_weights[0][0], 0x0102);
    assert_eq!(net.output_bias, -1);
}

#[test]
fn test_feature_index_in_range_and_distinct() {
    let mut seen = std::collections::HashSet::new();
    for color in Color::ALL {
        for kind in PieceKind::ALL {
            for sq in 0..64u8 {
                let idx = feature_index(Color::White, false, color, kind, sq);
                assert!(idx < INPUTS);
                assert!(seen.insert(idx));
            }
        }
    }
    assert_eq!(seen.len(), INPUTS);
}

#[test]
fn test_feature_index_perspective_symmetry() {
    // A white pawn on e2 seen by White matches a black pawn on e7 seen by Black.
    let w = feature_index(Color::White, false, Color::White, PieceKind::Pawn, 12);
    let b = feature_index(Color::Black, false, Color::Black, PieceKind::Pawn, 52);
    assert_eq!(w, b);
    // Mirroring flips the file only.
    let m = feature_index(Color::White, true, Color::White, PieceKind::Pawn, 12);
    assert_eq!(m, feature_index(Color::White, false, Color::White, PieceKind::Pawn, 11));
}

#[test]
fn test_wants_mirror_by_king_file() {
    assert!(!wants_mirror(3)); // d1
    assert!(wants_mirror(4)); // e1
    assert!(wants_mirror(63)); // h8
    assert!(!wants_mirror(56)); // a8
}

#[test]
fn test_forward_is_symmetric_for_equal_perspectives() {
    let net = sample_network();
    let mut a = Accumulator::new(&net);
    a.add_feature(5, &net);
    let b = a;
    assert_eq!(net.forward(&a, &b), net.forward(&b, &a));
}

#[test]
fn test_incremental_updates_match_refresh() {
    let net = sample_network();
    let mut pair = AccumulatorPair::new(&net);
    pair.add(Color::White, PieceKind::Knight, 6, &net);
    pair.add(Color::Black, PieceKind::Queen, 59, &net);
    pair.remove(Color::White, PieceKind::Knight, 6, &net);
    pair.add(Color::White, PieceKind::Knight, 21, &net);

    let mut fresh = AccumulatorPair::new(&net);
    fresh.add(Color::Black, PieceKind::Queen, 59, &net);
    fresh.add(Color::White, PieceKind::Knight, 21, &net);
    assert_eq!(pair, fresh);
}

#[test]
fn test_position_accumulators_follow_moves() {
    // With the zero network every accumulator stays at the zero bias,
    // so this checks that copy-make never corrupts the pair.
    let pos = Position::startpos();
    let mv = crate::uci::parse_uci_move(&pos, "e2e4").unwrap();
    let next = pos.make_move(mv);
    let fen = Position::from_fen(&next.to_fen()).unwrap();
    assert_eq!(next.accumulators(), fen.accumulators());
}
