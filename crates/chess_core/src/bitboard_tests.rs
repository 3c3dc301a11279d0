use super::*;

#[test]
fn test_from_square() {
    assert_eq!(Bitboard::from_square(0).0, 1); // a1
    assert_eq!(Bitboard::from_square(7).0, 128); // h1
    assert_eq!(Bitboard::from_square(63).0, 1 << 63); // h8
}

#[test]
fn test_popcount_and_more_than_one() {
    assert_eq!(Bitboard::EMPTY.popcount(), 0);
    assert_eq!(Bitboard::FILE_A.popcount(), 8);
    assert_eq!(Bitboard::ALL.popcount(), 64);
    assert!(!Bitboard::EMPTY.more_than_one());
    assert!(!Bitboard::from_square(17).more_than_one());
    assert!(Bitboard(0b1010).more_than_one());
}

#[test]
fn test_iteration_is_restartable_from_copy() {
    let bb = Bitboard(0b1010);
    let first: Vec<u8> = bb.collect();
    let second: Vec<u8> = bb.collect();
    assert_eq!(first, vec![1, 3]);
    assert_eq!(first, second);
    assert_eq!(bb.lowest(), Bitboard::from_square(1));
}

#[test]
fn test_shifts_do_not_wrap() {
    let a1 = Bitboard::from_square(0);
    assert_eq!(a1.north(), Bitboard::from_square(8));
    assert_eq!(a1.east(), Bitboard::from_square(1));
    assert_eq!(a1.west(), Bitboard::EMPTY);

    let h1 = Bitboard::from_square(7);
    assert_eq!(h1.east(), Bitboard::EMPTY);
    assert_eq!(h1.west(), Bitboard::from_square(6));

    let e2 = Bitboard::from_square(12);
    assert_eq!(e2.forward(Color::White), Bitboard::from_square(20));
    assert_eq!(e2.forward(Color::Black), Bitboard::from_square(4));
}
