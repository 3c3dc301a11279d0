#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    #[inline(always)]
    pub fn other(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline(always)]
    pub fn idx(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    #[inline(always)]
    pub fn idx(self) -> usize {
        self as usize
    }

    #[inline(always)]
    pub fn from_idx(idx: usize) -> PieceKind {
        Self::ALL[idx]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

/// What a move does besides relocating a piece.
///
/// The discriminants are the 4-bit flag field of [`Move`]. Bit 2 marks a
/// capture and bit 3 a promotion, so the noisy/quiet split is a mask test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum MoveFlag {
    Quiet = 0,
    DoublePush = 1,
    KingCastle = 2,
    QueenCastle = 3,
    Capture = 4,
    EnPassant = 5,
    PromoKnight = 8,
    PromoBishop = 9,
    PromoRook = 10,
    PromoQueen = 11,
    PromoCaptureKnight = 12,
    PromoCaptureBishop = 13,
    PromoCaptureRook = 14,
    PromoCaptureQueen = 15,
}

impl MoveFlag {
    const CAPTURE_BIT: u8 = 0b0100;
    const PROMO_BIT: u8 = 0b1000;

    fn from_bits(bits: u8) -> MoveFlag {
        match bits & 0xF {
            1 => MoveFlag::DoublePush,
            2 => MoveFlag::KingCastle,
            3 => MoveFlag::QueenCastle,
            4 => MoveFlag::Capture,
            5 => MoveFlag::EnPassant,
            8 => MoveFlag::PromoKnight,
            9 => MoveFlag::PromoBishop,
            10 => MoveFlag::PromoRook,
            11 => MoveFlag::PromoQueen,
            12 => MoveFlag::PromoCaptureKnight,
            13 => MoveFlag::PromoCaptureBishop,
            14 => MoveFlag::PromoCaptureRook,
            15 => MoveFlag::PromoCaptureQueen,
            _ => MoveFlag::Quiet,
        }
    }

    /// Promotion flag for `kind`, with or without a capture.
    pub fn promotion(kind: PieceKind, capture: bool) -> MoveFlag {
        let base = match kind {
            PieceKind::Knight => 8,
            PieceKind::Bishop => 9,
            PieceKind::Rook => 10,
            _ => 11,
        };
        Self::from_bits(if capture { base | Self::CAPTURE_BIT } else { base })
    }
}

/// A move packed into 16 bits: from (6) | to (6) | flag (4).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    /// a1a1, never produced by the generator.
    pub const NULL: Move = Move(0);

    #[inline(always)]
    pub fn new(from: u8, to: u8, flag: MoveFlag) -> Self {
        Move(((flag as u16) << 12) | ((to as u16) << 6) | from as u16)
    }

    #[inline(always)]
    pub fn from(self) -> u8 {
        (self.0 & 0x3F) as u8
    }

    #[inline(always)]
    pub fn to(self) -> u8 {
        ((self.0 >> 6) & 0x3F) as u8
    }

    #[inline(always)]
    pub fn flag(self) -> MoveFlag {
        MoveFlag::from_bits((self.0 >> 12) as u8)
    }

    #[inline(always)]
    fn flag_bits(self) -> u8 {
        (self.0 >> 12) as u8
    }

    #[inline(always)]
    pub fn is_null(self) -> bool {
        self == Move::NULL
    }

    #[inline(always)]
    pub fn is_capture(self) -> bool {
        self.flag_bits() & MoveFlag::CAPTURE_BIT != 0
    }

    #[inline(always)]
    pub fn is_promotion(self) -> bool {
        self.flag_bits() & MoveFlag::PROMO_BIT != 0
    }

    #[inline(always)]
    pub fn is_en_passant(self) -> bool {
        self.flag() == MoveFlag::EnPassant
    }

    #[inline(always)]
    pub fn is_castle(self) -> bool {
        matches!(self.flag(), MoveFlag::KingCastle | MoveFlag::QueenCastle)
    }

    /// Captures and promotions; searched in quiescence and ordered by material.
    #[inline(always)]
    pub fn is_noisy(self) -> bool {
        self.flag_bits() & (MoveFlag::CAPTURE_BIT | MoveFlag::PROMO_BIT) != 0
    }

    #[inline(always)]
    pub fn is_quiet(self) -> bool {
        !self.is_noisy()
    }

    pub fn promotion(self) -> Option<PieceKind> {
        if !self.is_promotion() {
            return None;
        }
        Some(match self.flag_bits() & 0b11 {
            0 => PieceKind::Knight,
            1 => PieceKind::Bishop,
            2 => PieceKind::Rook,
            _ => PieceKind::Queen,
        })
    }

    /// Packed encoding: origin in bits 0-5, target in 6-11, flag in 12-15.
    #[inline(always)]
    pub fn raw(self) -> u16 {
        self.0
    }
}

// Helpers
pub fn file_of(sq: u8) -> i8 {
    (sq % 8) as i8
}
pub fn rank_of(sq: u8) -> i8 {
    (sq / 8) as i8
}
pub fn sq(file: i8, rank: i8) -> Option<u8> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some((rank as u8) * 8 + (file as u8))
    } else {
        None
    }
}

pub fn sq_to_coord(sq: u8) -> String {
    let f = (b'a' + (sq % 8)) as char;
    let r = (b'1' + (sq / 8)) as char;
    format!("{f}{r}")
}

pub fn coord_to_sq(c: &str) -> Option<u8> {
    let b = c.as_bytes();
    if b.len() != 2 {
        return None;
    }
    let f = b[0];
    let r = b[1];
    if !(b'a'..=b'h').contains(&f) || !(b'1'..=b'8').contains(&r) {
        return None;
    }
    let file = f - b'a';
    let rank = r - b'1';
    Some(rank * 8 + file)
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
