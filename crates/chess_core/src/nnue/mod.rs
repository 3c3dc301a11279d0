//! NNUE inference: a (768 -> 64) x 2 -> 1 network over incrementally
//! maintained accumulators.
//!
//! Training is out of scope; this module only reads a finished network and
//! evaluates positions. `Position` owns an [`AccumulatorPair`] and updates it on
//! every move, so [`evaluate`] never rescans the board.

mod accumulator;
mod network;

use std::path::PathBuf;

use thiserror::Error;

use crate::board::Position;

pub use accumulator::{feature_index, wants_mirror, Accumulator, AccumulatorPair};
pub use network::{load_network, network, Network, HIDDEN, INPUTS, QA, QB, SCALE};

#[derive(Debug, Error)]
pub enum NnueError {
    #[error("cannot read network file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("network file has {found} bytes, expected {expected}")]
    Size { expected: usize, found: usize },
    #[error("a network is already installed for this process")]
    AlreadyLoaded,
}

/// Static evaluation in centipawns from the side-to-move's perspective.
#[inline]
pub fn evaluate(pos: &Position) -> i32 {
    let stm = pos.side_to_move();
    let accs = pos.accumulators();
    network().forward(accs.get(stm), accs.get(stm.other()))
}

#[cfg(test)]
#[path = "nnue_tests.rs"]
mod nnue_tests;
