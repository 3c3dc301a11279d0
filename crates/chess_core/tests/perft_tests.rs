//! Move generator node counts against the reference EPD suite.
//!
//! Depths above `NODE_LIMIT` nodes only run with `FULL_PERFT=1`.

use std::time::Instant;

use rayon::prelude::*;

use chess_core::{perft, perft_divide, Position};

const FULL_PERFT_ENV: &str = "FULL_PERFT";
const NODE_LIMIT: u64 = 10_000_000;

struct EpdCase {
    line: usize,
    fen: String,
    counts: Vec<(u8, u64)>,
}

/// `<fen> ;D1 20 ;D2 400 ...`
fn parse_case(line: usize, text: &str) -> Option<EpdCase> {
    let mut fields = text.split(';');
    let fen = fields.next()?.trim();
    if fen.is_empty() {
        return None;
    }
    let mut counts: Vec<(u8, u64)> = fields
        .filter_map(|field| {
            let (key, value) = field.trim().split_once(' ')?;
            let depth = key.strip_prefix('D')?.parse().ok()?;
            Some((depth, value.trim().parse().ok()?))
        })
        .collect();
    counts.sort_unstable();
    (!counts.is_empty()).then(|| EpdCase { line, fen: fen.to_string(), counts })
}

#[test]
fn test_standard_suite_matches() {
    let full = std::env::var_os(FULL_PERFT_ENV).is_some();
    let cases: Vec<EpdCase> = include_str!("standard.epd")
        .lines()
        .enumerate()
        .filter_map(|(i, text)| parse_case(i + 1, text))
        .collect();
    assert_eq!(cases.len(), 19);

    cases.par_iter().for_each(|case| {
        let pos = Position::from_fen(&case.fen)
            .unwrap_or_else(|e| panic!("line {}: bad FEN: {e}", case.line));
        let start = Instant::now();
        let mut nodes = 0;
        for &(depth, expected) in &case.counts {
            if !full && expected > NODE_LIMIT {
                continue;
            }
            let got = perft(&pos, depth);
            assert_eq!(got, expected, "line {} depth {depth}: {}", case.line, case.fen);
            nodes += got;
        }
        println!("line {:02}: {nodes} nodes in {:.2?}", case.line, start.elapsed());
    });
}

#[test]
fn test_divide_matches_total() {
    let pos = Position::from_fen(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    )
    .unwrap();
    let divide = perft_divide(&pos, 3);
    assert_eq!(divide.len(), 48);
    assert_eq!(divide.iter().map(|&(_, n)| n).sum::<u64>(), 97_862);
    assert_eq!(perft(&pos, 0), 1);
}
