//! Hidden-layer accumulators, updated incrementally as pieces move.

use crate::types::{Color, PieceKind};

use super::network::{Network, HIDDEN};

/// Accumulated hidden-layer activations for one perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C, align(64))]
pub struct Accumulator {
    pub(crate) vals: [i16; HIDDEN],
}

impl Accumulator {
    /// Bias only, no features.
    pub fn new(net: &Network) -> Self {
        Self {
            vals: net.feature_bias,
        }
    }

    #[inline]
    pub fn add_feature(&mut self, idx: usize, net: &Network) {
        for (acc, &w) in self.vals.iter_mut().zip(&net.feature_weights[idx]) {
            *acc = acc.wrapping_add(w);
        }
    }

    #[inline]
    pub fn remove_feature(&mut self, idx: usize, net: &Network) {
        for (acc, &w) in self.vals.iter_mut().zip(&net.feature_weights[idx]) {
            *acc = acc.wrapping_sub(w);
        }
    }
}

/// One accumulator per perspective, indexed by `Color::idx()`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccumulatorPair {
    pub(crate) acc: [Accumulator; 2],
    /// Whether each perspective is currently horizontally mirrored.
    pub(crate) mirrored: [bool; 2],
}

impl AccumulatorPair {
    pub fn new(net: &Network) -> Self {
        Self {
            acc: [Accumulator::new(net); 2],
            mirrored: [false; 2],
        }
    }

    pub fn get(&self, perspective: Color) -> &Accumulator {
        &self.acc[perspective.idx()]
    }

    /// Adds the feature of a piece to both perspectives.
    #[inline]
    pub fn add(&mut self, color: Color, kind: PieceKind, sq: u8, net: &Network) {
        for perspective in Color::ALL {
            let idx = feature_index(perspective, self.mirrored[perspective.idx()], color, kind, sq);
            self.acc[perspective.idx()].add_feature(idx, net);
        }
    }

    /// Removes the feature of a piece from both perspectives.
    #[inline]
    pub fn remove(&mut self, color: Color, kind: PieceKind, sq: u8, net: &Network) {
        for perspective in Color::ALL {
            let idx = feature_index(perspective, self.mirrored[perspective.idx()], color, kind, sq);
            self.acc[perspective.idx()].remove_feature(idx, net);
        }
    }
}

/// Mirror a perspective when its own king stands on files e-h.
#[inline(always)]
pub fn wants_mirror(king_sq: u8) -> bool {
    king_sq % 8 >= 4
}

/// Input index of a piece as seen from `perspective`.
#[inline(always)]
pub fn feature_index(
    perspective: Color,
    mirrored: bool,
    color: Color,
    kind: PieceKind,
    sq: u8,
) -> usize {
    let mut rel = match perspective {
        Color::White => sq,
        Color::Black => sq ^ 56,
    };
    if mirrored {
        rel ^= 7;
    }
    let side = usize::from(color != perspective);
    side * 384 + kind.idx() * 64 + rel as usize
}
