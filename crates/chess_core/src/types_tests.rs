use super::*;

#[test]
fn test_move_packing() {
    let mv = Move::new(12, 28, MoveFlag::DoublePush);
    assert_eq!(mv.from(), 12);
    assert_eq!(mv.to(), 28);
    assert_eq!(mv.flag(), MoveFlag::DoublePush);
    assert!(mv.is_quiet());
    assert!(!mv.is_null());
}

#[test]
fn test_flag_classifies_noisy_moves() {
    assert!(Move::new(0, 8, MoveFlag::Capture).is_noisy());
    assert!(Move::new(36, 43, MoveFlag::EnPassant).is_capture());
    assert!(Move::new(52, 60, MoveFlag::PromoKnight).is_noisy());
    assert!(!Move::new(52, 60, MoveFlag::PromoKnight).is_capture());
    assert!(Move::new(4, 6, MoveFlag::KingCastle).is_quiet());
    assert!(Move::new(4, 6, MoveFlag::KingCastle).is_castle());
}

#[test]
fn test_promotion_flags() {
    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ] {
        let quiet = Move::new(52, 60, MoveFlag::promotion(kind, false));
        let capture = Move::new(52, 59, MoveFlag::promotion(kind, true));
        assert_eq!(quiet.promotion(), Some(kind));
        assert_eq!(capture.promotion(), Some(kind));
        assert!(!quiet.is_capture());
        assert!(capture.is_capture());
    }
    assert_eq!(Move::new(8, 16, MoveFlag::Quiet).promotion(), None);
}

#[test]
fn test_raw_packs_squares_and_flag() {
    let mv = Move::new(49, 56, MoveFlag::PromoCaptureQueen);
    assert_eq!(mv.raw() & 0x3f, 49);
    assert_eq!((mv.raw() >> 6) & 0x3f, 56);
    assert_eq!(mv.raw() >> 12, MoveFlag::PromoCaptureQueen as u16);
}

#[test]
fn test_coords() {
    assert_eq!(sq_to_coord(0), "a1");
    assert_eq!(sq_to_coord(63), "h8");
    assert_eq!(coord_to_sq("e4"), Some(28));
    assert_eq!(coord_to_sq("i9"), None);
}
