//! Pre-computed attack tables for move generation and attack detection.
//!
//! Leaper attacks (knight, king, pawn) are constant tables evaluated at compile
//! time. Slider attacks use magic bitboards: for every square each subset of the
//! relevant occupancy mask is hashed with `(subset * magic) >> (64 - bits)` into a
//! shared attack table, filled once from the ray-cast attacks below. The same
//! initialization builds the between/line tables used for pins and check blocks.

use std::sync::OnceLock;

use crate::bitboard::Bitboard;
use crate::types::{Color, PieceKind};

/// Pre-computed knight attacks for each square.
pub static KNIGHT_ATTACKS: [Bitboard; 64] = {
    let mut attacks = [Bitboard::EMPTY; 64];
    let mut sq = 0u8;
    while sq < 64 {
        let b = 1u64 << sq;
        let mut result = 0u64;
        result |= (b << 17) & Bitboard::NOT_FILE_A.0;
        result |= (b << 15) & Bitboard::NOT_FILE_H.0;
        result |= (b << 10) & Bitboard::NOT_FILE_AB.0;
        result |= (b << 6) & Bitboard::NOT_FILE_GH.0;
        result |= (b >> 6) & Bitboard::NOT_FILE_AB.0;
        result |= (b >> 10) & Bitboard::NOT_FILE_GH.0;
        result |= (b >> 15) & Bitboard::NOT_FILE_A.0;
        result |= (b >> 17) & Bitboard::NOT_FILE_H.0;
        attacks[sq as usize] = Bitboard(result);
        sq += 1;
    }
    attacks
};

/// Pre-computed king attacks for each square.
pub static KING_ATTACKS: [Bitboard; 64] = {
    let mut attacks = [Bitboard::EMPTY; 64];
    let mut sq = 0u8;
    while sq < 64 {
        let b = 1u64 << sq;
        let mut result = (b << 8) | (b >> 8);
        result |= ((b << 1) | (b << 9) | (b >> 7)) & Bitboard::NOT_FILE_A.0;
        result |= ((b >> 1) | (b << 7) | (b >> 9)) & Bitboard::NOT_FILE_H.0;
        attacks[sq as usize] = Bitboard(result);
        sq += 1;
    }
    attacks
};

/// Pawn capture targets, indexed by `[color][square]`.
pub static PAWN_ATTACKS: [[Bitboard; 64]; 2] = {
    let mut attacks = [[Bitboard::EMPTY; 64]; 2];
    let mut sq = 0u8;
    while sq < 64 {
        let b = 1u64 << sq;
        attacks[0][sq as usize] =
            Bitboard(((b << 9) & Bitboard::NOT_FILE_A.0) | ((b << 7) & Bitboard::NOT_FILE_H.0));
        attacks[1][sq as usize] =
            Bitboard(((b >> 7) & Bitboard::NOT_FILE_A.0) | ((b >> 9) & Bitboard::NOT_FILE_H.0));
        sq += 1;
    }
    attacks
};

#[inline(always)]
pub fn pawn_attacks(sq: u8, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.idx()][sq as usize]
}

#[inline(always)]
pub fn knight_attacks(sq: u8) -> Bitboard {
    KNIGHT_ATTACKS[sq as usize]
}

#[inline(always)]
pub fn king_attacks(sq: u8) -> Bitboard {
    KING_ATTACKS[sq as usize]
}

// =============================================================================
// Ray-cast slider attacks (ground truth for the magic tables)
// =============================================================================

/// RAYS[direction][square] gives all squares in that direction from sq (not including sq).
/// Directions: 0=N, 1=NE, 2=E, 3=SE, 4=S, 5=SW, 6=W, 7=NW
pub static RAYS: [[Bitboard; 64]; 8] = {
    const STEPS: [(i8, i8); 8] = [
        (0, 1),
        (1, 1),
        (1, 0),
        (1, -1),
        (0, -1),
        (-1, -1),
        (-1, 0),
        (-1, 1),
    ];
    let mut rays = [[Bitboard::EMPTY; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let (df, dr) = STEPS[dir];
        let mut sq = 0u8;
        while sq < 64 {
            let mut f = (sq % 8) as i8 + df;
            let mut r = (sq / 8) as i8 + dr;
            let mut bb = 0u64;
            while f >= 0 && f < 8 && r >= 0 && r < 8 {
                bb |= 1u64 << ((r * 8 + f) as u32);
                f += df;
                r += dr;
            }
            rays[dir][sq as usize] = Bitboard(bb);
            sq += 1;
        }
        dir += 1;
    }
    rays
};

/// Attacks along the given directions, stopping at (and including) the first blocker.
fn ray_cast(sq: u8, occupied: Bitboard, dirs: [usize; 4]) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for dir in dirs {
        let ray = RAYS[dir][sq as usize];
        let blockers = ray & occupied;
        if blockers.is_empty() {
            attacks |= ray;
            continue;
        }
        // N, NE, E and NW run toward higher squares; the rest toward lower ones.
        let blocker = if matches!(dir, 0 | 1 | 2 | 7) {
            blockers.0.trailing_zeros() as u8
        } else {
            63 - blockers.0.leading_zeros() as u8
        };
        attacks |= ray & !RAYS[dir][blocker as usize];
    }
    attacks
}

/// Bishop attacks computed by walking the rays.
pub fn bishop_attacks_slow(sq: u8, occupied: Bitboard) -> Bitboard {
    ray_cast(sq, occupied, [1, 3, 5, 7])
}

/// Rook attacks computed by walking the rays.
pub fn rook_attacks_slow(sq: u8, occupied: Bitboard) -> Bitboard {
    ray_cast(sq, occupied, [0, 2, 4, 6])
}

// =============================================================================
// Magic bitboards
// =============================================================================

const ROOK_MAGICS: [u64; 64] = [
    0x0480084000812010, 0x0040001000C12000, 0x0200104A00824020, 0x8880100028002580,
    0x2080140008000280, 0x0100010006080400, 0x01004A0000810004, 0x008002A841000080,
    0x0021800140002081, 0x000C401001402000, 0x0852004020108200, 0x00560020400A0011,
    0x8008800401800802, 0x1209000A04010028, 0x2043001600090004, 0x0404800080104900,
    0x1080004002A00040, 0x0050004000482000, 0x000088802000D000, 0x0101808010000806,
    0x08A2020020440890, 0x0001010002040008, 0x1500840002080190, 0x0010020004008041,
    0x008004414000E000, 0x0020200080804000, 0x0020200080801000, 0x0208080080100080,
    0x8040440080800800, 0x00280400801A0080, 0x0010051400481026, 0x1580800C80024500,
    0x008000400AC02001, 0x0001008202004264, 0x090011C305002000, 0x0000880084801000,
    0x0200040080804800, 0x0002001102000C08, 0x0C0910480C000201, 0x0000800840800300,
    0x0080248840088000, 0x2018200050084000, 0x2800408200120020, 0x400010C20022000A,
    0x0A51010408010010, 0x0402001008C20044, 0x0801040200010100, 0x0400018244120001,
    0x8195018000402900, 0x2840804001002100, 0x0000801000200080, 0x1001300108008080,
    0x8025240080080080, 0x0209000208440100, 0x0021002482000100, 0x01A10000C601A100,
    0x0000508001A0C101, 0x4022542081004005, 0x02042042000A8052, 0x4000A06900045001,
    0x010200100C200802, 0x0003000802240005, 0x0080021008008104, 0x00028A4110840062,
];

const BISHOP_MAGICS: [u64; 64] = [
    0x0002101001004084, 0x0053B801C1020382, 0x0488109902080808, 0x01140416800004C0,
    0x000404A012000180, 0x4001046004000401, 0x000404040C040010, 0x2021450198200200,
    0x800220A00400C080, 0x0040100102408200, 0x0800080821022010, 0x0000040C28800002,
    0x20001404A0200200, 0x0304CC2404406212, 0x3825020202024002, 0x4160420220922810,
    0x0609011020180080, 0x0020020838808080, 0x0610000214001020, 0x0182000402120124,
    0x06160284010C0422, 0x0000200200842009, 0x0902000401010800, 0x0801601504110C08,
    0x00600C520A100440, 0x12501081042C1091, 0x1008020001040500, 0x8810040020440008,
    0x1002040082008605, 0x008041800100A001, 0x8020810101981802, 0x2401104101040890,
    0x0004044041A0A208, 0x08008C3021200A80, 0x2404020880A10400, 0x0404028180080200,
    0x10050104000E0120, 0x0210021021121001, 0x0406240100004844, 0x00C10504A2210400,
    0x0200843008104110, 0x2000B41008040200, 0x0000202130080800, 0x52502E2018002100,
    0x0107084208200400, 0x0020200141C0A081, 0x6060010200900200, 0x8801040109C20A02,
    0x802C1403880A0000, 0x0C80209828284000, 0x200002004A088209, 0x0808880221882010,
    0x2104801006020001, 0x080020201218808A, 0x28C942080A040880, 0x1020040082084044,
    0x004102480C041234, 0x00410F08C8040500, 0xA001000046180402, 0x4000041A08841C00,
    0x1040006044050400, 0x0000080461440102, 0x6250A02004408192, 0x014C0802C4008201,
];

#[derive(Clone, Copy, Debug, Default)]
struct Magic {
    mask: Bitboard,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline(always)]
    fn index(&self, occupied: Bitboard) -> usize {
        self.offset + ((occupied.0 & self.mask.0).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Process-lifetime slider and ray tables.
pub struct AttackTables {
    bishop: [Magic; 64],
    rook: [Magic; 64],
    table: Vec<Bitboard>,
    between: Vec<[Bitboard; 64]>,
    line: Vec<[Bitboard; 64]>,
}

static TABLES: OnceLock<AttackTables> = OnceLock::new();

/// Builds the slider tables if they are not built yet.
///
/// Lookups initialize lazily as well; calling this up front keeps the one-time
/// cost out of the first search.
pub fn init() {
    tables();
}

#[inline(always)]
pub fn tables() -> &'static AttackTables {
    TABLES.get_or_init(AttackTables::build)
}

fn relevant_mask(sq: u8, dirs: [usize; 4]) -> Bitboard {
    let edges = |dir: usize| match dir {
        0 => Bitboard::RANK_8,
        2 => Bitboard::FILE_H,
        4 => Bitboard::RANK_1,
        6 => Bitboard::FILE_A,
        _ => Bitboard::RANK_1 | Bitboard::RANK_8 | Bitboard::FILE_A | Bitboard::FILE_H,
    };
    let mut mask = Bitboard::EMPTY;
    for dir in dirs {
        mask |= RAYS[dir][sq as usize] & !edges(dir);
    }
    mask
}

impl AttackTables {
    fn build() -> Self {
        let mut table = Vec::with_capacity(107_648);
        let bishop = Self::fill(&mut table, &BISHOP_MAGICS, [1, 3, 5, 7], bishop_attacks_slow);
        let rook = Self::fill(&mut table, &ROOK_MAGICS, [0, 2, 4, 6], rook_attacks_slow);

        let mut between = vec![[Bitboard::EMPTY; 64]; 64];
        let mut line = vec![[Bitboard::EMPTY; 64]; 64];
        for a in 0..64u8 {
            for b in 0..64u8 {
                if a == b {
                    continue;
                }
                let ends = Bitboard::from_square(a) | Bitboard::from_square(b);
                for slow in [bishop_attacks_slow, rook_attacks_slow] {
                    if slow(a, Bitboard::EMPTY).contains(b) {
                        line[a as usize][b as usize] =
                            (slow(a, Bitboard::EMPTY) & slow(b, Bitboard::EMPTY)) | ends;
                        between[a as usize][b as usize] = slow(a, Bitboard::from_square(b))
                            & slow(b, Bitboard::from_square(a));
                    }
                }
            }
        }

        Self {
            bishop,
            rook,
            table,
            between,
            line,
        }
    }

    /// Appends one piece type's attack sets to `table`, returning the per-square lookups.
    fn fill(
        table: &mut Vec<Bitboard>,
        magics: &[u64; 64],
        dirs: [usize; 4],
        slow: fn(u8, Bitboard) -> Bitboard,
    ) -> [Magic; 64] {
        let mut out = [Magic::default(); 64];
        for sq in 0..64u8 {
            let mask = relevant_mask(sq, dirs);
            let bits = mask.popcount();
            let magic = Magic {
                mask,
                magic: magics[sq as usize],
                shift: 64 - bits,
                offset: table.len(),
            };
            table.resize(table.len() + (1usize << bits), Bitboard::EMPTY);

            // Carry-Rippler walk over every subset of the mask, empty set first.
            let mut subset = Bitboard::EMPTY;
            loop {
                table[magic.index(subset)] = slow(sq, subset);
                subset = Bitboard(subset.0.wrapping_sub(mask.0) & mask.0);
                if subset.is_empty() {
                    break;
                }
            }
            out[sq as usize] = magic;
        }
        out
    }

    #[inline(always)]
    pub fn bishop(&self, sq: u8, occupied: Bitboard) -> Bitboard {
        self.table[self.bishop[sq as usize].index(occupied)]
    }

    #[inline(always)]
    pub fn rook(&self, sq: u8, occupied: Bitboard) -> Bitboard {
        self.table[self.rook[sq as usize].index(occupied)]
    }
}

#[inline(always)]
pub fn bishop_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    tables().bishop(sq, occupied)
}

#[inline(always)]
pub fn rook_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    tables().rook(sq, occupied)
}

#[inline(always)]
pub fn queen_attacks(sq: u8, occupied: Bitboard) -> Bitboard {
    let t = tables();
    t.bishop(sq, occupied) | t.rook(sq, occupied)
}

/// Squares strictly between `a` and `b` when they share a line, else empty.
#[inline(always)]
pub fn between(a: u8, b: u8) -> Bitboard {
    tables().between[a as usize][b as usize]
}

/// The full line through `a` and `b` (edge to edge) when aligned, else empty.
#[inline(always)]
pub fn line(a: u8, b: u8) -> Bitboard {
    tables().line[a as usize][b as usize]
}

/// Attack set of `kind` standing on `sq` for the given occupancy.
/// `color` only matters for pawns.
pub fn attacks_of(kind: PieceKind, color: Color, sq: u8, occupied: Bitboard) -> Bitboard {
    match kind {
        PieceKind::Pawn => pawn_attacks(sq, color),
        PieceKind::Knight => knight_attacks(sq),
        PieceKind::Bishop => bishop_attacks(sq, occupied),
        PieceKind::Rook => rook_attacks(sq, occupied),
        PieceKind::Queen => queen_attacks(sq, occupied),
        PieceKind::King => king_attacks(sq),
    }
}

#[cfg(test)]
#[path = "attacks_tests.rs"]
mod attacks_tests;
