//! Network parameters, the binary loader and the output layer.

use std::path::Path;
use std::sync::OnceLock;

use tracing::info;

use super::accumulator::Accumulator;
use super::NnueError;

/// Hidden units per perspective.
pub const HIDDEN: usize = 64;
/// 2 relative colors x 6 piece types x 64 squares.
pub const INPUTS: usize = 768;

/// Accumulator clipping ceiling.
pub const QA: i32 = 255;
/// Output weight quantization.
pub const QB: i32 = 64;
/// Centipawn scale applied after dequantization.
pub const SCALE: i32 = 400;

/// A (768 -> 64) x 2 -> 1 network with clipped-ReLU activation.
pub struct Network {
    pub(crate) feature_weights: Vec<[i16; HIDDEN]>,
    pub(crate) feature_bias: [i16; HIDDEN],
    /// `[0]` applies to the side to move, `[1]` to the other side.
    pub(crate) output_weights: [[i16; HIDDEN]; 2],
    pub(crate) output_bias: i16,
}

static NETWORK: OnceLock<Network> = OnceLock::new();

/// The process-wide network; all zeros unless [`load_network`] ran first.
#[inline(always)]
pub fn network() -> &'static Network {
    NETWORK.get_or_init(Network::zeroed)
}

/// Loads the network from `path` and installs it for the rest of the process.
///
/// Must run before the first position is built; accumulators created earlier
/// were computed from the zero network.
pub fn load_network(path: &Path) -> Result<&'static Network, NnueError> {
    let net = Network::load(path)?;
    NETWORK.set(net).map_err(|_| NnueError::AlreadyLoaded)?;
    info!(path = %path.display(), bytes = Network::FILE_SIZE, "loaded evaluation network");
    Ok(network())
}

impl Network {
    /// Size in bytes of a network file.
    pub const FILE_SIZE: usize = (INPUTS * HIDDEN + HIDDEN + 2 * HIDDEN + 1) * 2;

    /// Every parameter zero: every position evaluates to exactly 0.
    pub fn zeroed() -> Self {
        Self {
            feature_weights: vec![[0; HIDDEN]; INPUTS],
            feature_bias: [0; HIDDEN],
            output_weights: [[0; HIDDEN]; 2],
            output_bias: 0,
        }
    }

    pub fn load(path: &Path) -> Result<Self, NnueError> {
        let bytes = std::fs::read(path).map_err(|source| NnueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(&bytes)
    }

    /// Parses little-endian i16 values in file order: feature weights
    /// (feature-major), feature biases, output weights, output bias.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NnueError> {
        if bytes.len() != Self::FILE_SIZE {
            return Err(NnueError::Size {
                expected: Self::FILE_SIZE,
                found: bytes.len(),
            });
        }
        let mut values = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]));
        let mut next = move || values.next().unwrap_or(0);

        let mut net = Self::zeroed();
        for row in net.feature_weights.iter_mut() {
            for w in row.iter_mut() {
                *w = next();
            }
        }
        for b in net.feature_bias.iter_mut() {
            *b = next();
        }
        for side in net.output_weights.iter_mut() {
            for w in side.iter_mut() {
                *w = next();
            }
        }
        net.output_bias = next();
        Ok(net)
    }

    /// Output layer over the two perspectives, in centipawns for `us`.
    pub fn forward(&self, us: &Accumulator, them: &Accumulator) -> i32 {
        let mut sum = 0i32;
        for (acc, weights) in [us, them].into_iter().zip(&self.output_weights) {
            for (&v, &w) in acc.vals.iter().zip(weights) {
                sum += (v as i32).clamp(0, QA) * w as i32;
            }
        }
        (sum / QA + self.output_bias as i32) * SCALE / (QA * QB)
    }
}
