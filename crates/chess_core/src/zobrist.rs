//! Zobrist keys for incremental position hashing.
//!
//! A position's key is the XOR of one random value per (color, piece, square),
//! the side-to-move value when Black is to move, one value per castling right
//! held, and the en-passant file value when an en-passant capture is available.
//! `Position` also keeps two partial keys built from the same piece values:
//! pawns only, and every non-pawn piece; correction history is indexed by them.

use crate::types::{Color, PieceKind};

/// Pre-computed random values for Zobrist hashing.
pub struct ZobristKeys {
    /// Indexed by [color][piece_kind][square]
    pub pieces: [[[u64; 64]; 6]; 2],
    /// XORed in when Black is to move
    pub side_to_move: u64,
    /// One value per castling right [wk, wq, bk, bq]
    pub castling: [u64; 4],
    /// One value per en-passant file
    pub en_passant: [u64; 8],
}

impl Default for ZobristKeys {
    fn default() -> Self {
        Self::new()
    }
}

/// splitmix64 step; returns (next state, output).
const fn splitmix64(state: u64) -> (u64, u64) {
    let state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    (state, z ^ (z >> 31))
}

impl ZobristKeys {
    /// Keys from a fixed seed, so hashes are reproducible across runs.
    pub const fn new() -> Self {
        let mut state = 0x1234_5678_9ABC_DEF0u64;

        let mut pieces = [[[0u64; 64]; 6]; 2];
        let mut color = 0;
        while color < 2 {
            let mut piece = 0;
            while piece < 6 {
                let mut sq = 0;
                while sq < 64 {
                    let (next, key) = splitmix64(state);
                    state = next;
                    pieces[color][piece][sq] = key;
                    sq += 1;
                }
                piece += 1;
            }
            color += 1;
        }

        let (next, side_to_move) = splitmix64(state);
        state = next;

        let mut castling = [0u64; 4];
        let mut i = 0;
        while i < 4 {
            let (next, key) = splitmix64(state);
            state = next;
            castling[i] = key;
            i += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut i = 0;
        while i < 8 {
            let (next, key) = splitmix64(state);
            state = next;
            en_passant[i] = key;
            i += 1;
        }

        ZobristKeys {
            pieces,
            side_to_move,
            castling,
            en_passant,
        }
    }

    #[inline(always)]
    pub fn piece_key(&self, color: Color, kind: PieceKind, sq: u8) -> u64 {
        self.pieces[color.idx()][kind.idx()][sq as usize]
    }

    /// Key for castling right index (0=wk, 1=wq, 2=bk, 3=bq).
    #[inline(always)]
    pub fn castling_key(&self, index: usize) -> u64 {
        self.castling[index]
    }

    #[inline(always)]
    pub fn ep_key(&self, file: u8) -> u64 {
        self.en_passant[file as usize]
    }
}

/// Global Zobrist keys, computed at compile time.
pub static ZOBRIST: ZobristKeys = ZobristKeys::new();

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;
