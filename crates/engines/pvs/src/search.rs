//! Principal variation search.
//!
//! Iterative deepening drives an aspiration-windowed negamax with the usual
//! selectivity: reverse futility, razoring, null move, probcut, late move
//! pruning and reductions, SEE pruning and singular extensions. Quiescence
//! search resolves captures and promotions at the horizon.
//!
//! Only results of fully completed depths leave the search. When the clock,
//! the node budget or a `stop` interrupts an iteration, every frame unwinds
//! with a neutral score and the half-finished iteration is thrown away.

use std::time::Duration;

use chess_core::{
    evaluate, legal_moves, Bitboard, GenType, InfoCallback, Move, PieceKind, Position, Score,
    SearchInfo, SearchLimits, SearchResult,
};
use tracing::debug;

use crate::history::{history_bonus, History, Killers, PieceTo};
use crate::movepick::{MovePicker, OrderingContext};
use crate::see::{capture_gain, see};
use crate::tt::{Bound, TranspositionTable};

pub const INF: i32 = 32_000;
pub const MATE: i32 = 31_000;
pub const MAX_PLY: usize = 128;
/// Scores beyond this magnitude are mate scores.
pub const MATE_BOUND: i32 = MATE - MAX_PLY as i32;

const ASPIRATION_MIN_DEPTH: i32 = 4;
const ASPIRATION_DELTA: i32 = 25;

const RFP_MAX_DEPTH: i32 = 8;
const RFP_MARGIN: i32 = 80;
const RAZOR_MAX_DEPTH: i32 = 3;
const RAZOR_MARGIN: i32 = 300;
const NMP_MIN_DEPTH: i32 = 3;
const PROBCUT_MIN_DEPTH: i32 = 5;
const PROBCUT_MARGIN: i32 = 200;
const IIR_MIN_DEPTH: i32 = 4;

const FUTILITY_BASE: i32 = 100;
const FUTILITY_MARGIN: i32 = 100;
const FUTILITY_MAX_DEPTH: i32 = 8;
const SEE_PRUNE_MAX_DEPTH: i32 = 8;
const SEE_QUIET_MARGIN: i32 = 60;
const SEE_NOISY_MARGIN: i32 = 25;

const SINGULAR_MIN_DEPTH: i32 = 7;
const DOUBLE_EXTENSION_MARGIN: i32 = 15;
const MAX_DOUBLE_EXTENSIONS: u8 = 4;

const QS_DELTA_MARGIN: i32 = 200;

/// Converts an internal score to what the protocol reports.
pub fn to_score(score: i32) -> Score {
    if score >= MATE_BOUND {
        Score::Mate((MATE - score + 1) / 2)
    } else if score <= -MATE_BOUND {
        Score::Mate(-(MATE + score) / 2)
    } else {
        Score::Cp(score)
    }
}

/// Soft time budget after weighting by how much of the tree the best move took.
///
/// A best move that soaked up most nodes is a stable choice and lets the
/// search stop earlier; a contested one buys extra time.
pub fn scaled_soft_budget(soft: Duration, best_move_nodes: u64, total_nodes: u64) -> Duration {
    if total_nodes == 0 {
        return soft;
    }
    let fraction = best_move_nodes as f64 / total_nodes as f64;
    soft.mul_f64((1.5 - fraction) * 1.35)
}

struct LmrTable([[i32; 64]; 64]);

impl LmrTable {
    fn new() -> Self {
        let mut table = [[0; 64]; 64];
        for (depth, row) in table.iter_mut().enumerate().skip(1) {
            for (played, r) in row.iter_mut().enumerate().skip(1) {
                *r = (0.77 + (depth as f64).ln() * (played as f64).ln() / 2.36) as i32;
            }
        }
        Self(table)
    }

    #[inline]
    fn get(&self, depth: i32, played: usize) -> i32 {
        self.0[depth.clamp(0, 63) as usize][played.min(63)]
    }
}

const PV_STRIDE: usize = MAX_PLY + 1;

/// Triangular principal variation table: row `ply` holds the line from that ply.
struct PvTable {
    moves: Vec<Move>,
    len: Vec<usize>,
}

impl PvTable {
    fn new() -> Self {
        Self {
            moves: vec![Move::NULL; PV_STRIDE * PV_STRIDE],
            len: vec![0; PV_STRIDE],
        }
    }

    #[inline]
    fn clear(&mut self, ply: usize) {
        self.len[ply] = 0;
    }

    fn update(&mut self, ply: usize, mv: Move) {
        let child_len = self.len.get(ply + 1).copied().unwrap_or(0);
        let (head, tail) = self.moves.split_at_mut((ply + 1) * PV_STRIDE);
        let row = &mut head[ply * PV_STRIDE..];
        row[0] = mv;
        row[1..=child_len].copy_from_slice(&tail[..child_len]);
        self.len[ply] = child_len + 1;
    }

    fn line(&self, ply: usize) -> &[Move] {
        let start = ply * PV_STRIDE;
        &self.moves[start..start + self.len[ply]]
    }
}

#[derive(Clone, Copy)]
struct StackEntry {
    static_eval: i32,
    /// The move played from this ply, for continuation history.
    piece_to: Option<PieceTo>,
    null_move: bool,
    excluded: Move,
    double_extensions: u8,
}

impl Default for StackEntry {
    fn default() -> Self {
        Self {
            static_eval: -INF,
            piece_to: None,
            null_move: false,
            excluded: Move::NULL,
            double_extensions: 0,
        }
    }
}

/// Everything one search thread owns: tables that live across searches and
/// the per-search bookkeeping.
pub struct SearchContext {
    pub tt: TranspositionTable,
    pub history: History,
    killers: Killers,
    stack: Vec<StackEntry>,
    pv: PvTable,
    lmr: LmrTable,
    /// Hash of the position at each ply of the current line.
    path: Vec<u64>,
    /// Hashes of the game positions before the root, oldest first.
    game_history: Vec<u64>,
    /// Nodes spent below each root move, indexed by from * 64 + to.
    root_nodes: Vec<u64>,
    limits: SearchLimits,
    nodes: u64,
    seldepth: usize,
    completed_depth: u8,
    stopped: bool,
}

impl SearchContext {
    pub fn new(hash_mb: usize) -> Self {
        Self {
            tt: TranspositionTable::new(hash_mb),
            history: History::new(),
            killers: Killers::new(),
            stack: vec![StackEntry::default(); MAX_PLY + 4],
            pv: PvTable::new(),
            lmr: LmrTable::new(),
            path: vec![0; MAX_PLY + 1],
            game_history: Vec::new(),
            root_nodes: vec![0; 64 * 64],
            limits: SearchLimits::infinite(),
            nodes: 0,
            seldepth: 0,
            completed_depth: 0,
            stopped: false,
        }
    }

    /// Forget everything learned in the previous game.
    pub fn new_game(&mut self) {
        self.tt.clear();
        self.history.clear();
        self.killers.clear();
        self.game_history.clear();
    }

    pub fn set_game_history(&mut self, history: &[u64]) {
        self.game_history.clear();
        self.game_history.extend_from_slice(history);
    }

    pub fn search(
        &mut self,
        root: &Position,
        limits: SearchLimits,
        on_info: InfoCallback<'_>,
    ) -> SearchResult {
        self.limits = limits;
        self.limits.time_control.start();
        self.nodes = 0;
        self.seldepth = 0;
        self.completed_depth = 0;
        self.stopped = false;
        self.killers.clear();
        self.root_nodes.fill(0);
        self.stack.fill(StackEntry::default());
        self.pv.clear(0);
        self.tt.new_search();

        let root_moves = legal_moves(root);
        let Some(&first) = root_moves.first() else {
            let score = if root.in_check() {
                Score::Mate(0)
            } else {
                Score::Cp(0)
            };
            on_info(&SearchInfo {
                depth: 0,
                seldepth: 0,
                elapsed: self.limits.time_control.elapsed(),
                score,
                nodes: 0,
                hashfull: self.tt.hashfull(),
                pv: Vec::new(),
            });
            debug!(%score, "no legal moves at the root");
            return SearchResult {
                best_move: None,
                score,
                depth: 0,
                nodes: 0,
                stopped: false,
                pv: Vec::new(),
            };
        };

        let mut result = SearchResult {
            best_move: Some(first),
            score: Score::Cp(0),
            depth: 0,
            nodes: 0,
            stopped: false,
            pv: vec![first],
        };
        let mut previous = 0;

        for depth in 1..=self.limits.depth {
            let Some(score) = self.aspiration(root, i32::from(depth), previous) else {
                break;
            };
            previous = score;
            self.completed_depth = depth;

            let pv = self.pv.line(0).to_vec();
            if let Some(&best) = pv.first() {
                result.best_move = Some(best);
                result.pv = pv;
            }
            result.score = to_score(score);
            result.depth = depth;
            result.nodes = self.nodes;

            on_info(&SearchInfo {
                depth,
                seldepth: self.seldepth.min(usize::from(u8::MAX)) as u8,
                elapsed: self.limits.time_control.elapsed(),
                score: result.score,
                nodes: self.nodes,
                hashfull: self.tt.hashfull(),
                pv: result.pv.clone(),
            });

            if self.soft_limit_reached(result.best_move) {
                break;
            }
        }

        result.nodes = self.nodes;
        result.stopped = self.stopped;
        debug!(
            depth = result.depth,
            nodes = self.nodes,
            score = %result.score,
            stopped = self.stopped,
            "search finished"
        );
        result
    }

    /// Searches one depth, widening the window around `previous` until the
    /// score lands inside it. `None` when the search was interrupted.
    fn aspiration(&mut self, root: &Position, depth: i32, previous: i32) -> Option<i32> {
        let mut delta = ASPIRATION_DELTA;
        let (mut alpha, mut beta) = if depth >= ASPIRATION_MIN_DEPTH {
            ((previous - delta).max(-INF), (previous + delta).min(INF))
        } else {
            (-INF, INF)
        };

        loop {
            let score = self.negamax(root, depth, alpha, beta, 0, false);
            if self.stopped {
                return None;
            }

            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha = (score - delta).max(-INF);
            } else if score >= beta {
                beta = (score + delta).min(INF);
            } else {
                return Some(score);
            }
            delta += delta;
        }
    }

    fn soft_limit_reached(&self, best: Option<Move>) -> bool {
        let Some(soft) = self.limits.soft_time else {
            return false;
        };
        let best_nodes = best.map_or(0, |mv| self.root_nodes[root_index(mv)]);
        self.limits.time_control.elapsed() >= scaled_soft_budget(soft, best_nodes, self.nodes)
    }

    /// Polls the clock and node budget every 1024 nodes. Depth 1 always runs to completion.
    #[inline]
    fn should_abort(&mut self) -> bool {
        if self.stopped {
            return true;
        }
        if self.completed_depth == 0 {
            return false;
        }
        let tc = &self.limits.time_control;
        if tc.should_check_time(self.nodes)
            && (tc.check_time() || self.limits.nodes.is_some_and(|n| self.nodes >= n))
        {
            self.stopped = true;
        }
        self.stopped
    }

    fn is_repetition(&self, pos: &Position, ply: usize) -> bool {
        let key = pos.hash();
        let reach = pos.halfmove_clock() as usize;
        let mut game_hits = 0;

        let mut dist = 4;
        while dist <= reach {
            let earlier = if dist <= ply {
                self.path[ply - dist]
            } else {
                match self.game_history.len().checked_sub(dist - ply) {
                    Some(i) => self.game_history[i],
                    None => break,
                }
            };
            if earlier == key {
                if dist < ply {
                    return true;
                }
                game_hits += 1;
                if game_hits >= 2 {
                    return true;
                }
            }
            dist += 2;
        }
        false
    }

    fn static_eval(&self, pos: &Position) -> i32 {
        (evaluate(pos) + self.history.correction(pos)).clamp(-MATE_BOUND + 1, MATE_BOUND - 1)
    }

    fn conts(&self, ply: usize) -> [Option<PieceTo>; 2] {
        [
            ply.checked_sub(1).and_then(|p| self.stack[p].piece_to),
            ply.checked_sub(2).and_then(|p| self.stack[p].piece_to),
        ]
    }

    fn picker(
        &self,
        pos: &Position,
        gen: GenType,
        tt_move: Move,
        ply: usize,
        threats: Bitboard,
    ) -> MovePicker {
        let killers = if gen == GenType::All {
            self.killers.get(ply)
        } else {
            [Move::NULL; 2]
        };
        let ctx = OrderingContext {
            history: &self.history,
            tt_move,
            killers,
            threats,
            conts: self.conts(ply),
        };
        MovePicker::new(pos, gen, &ctx)
    }

    fn update_quiet(
        &mut self,
        pos: &Position,
        ply: usize,
        mv: Move,
        threats: Bitboard,
        bonus: i32,
    ) {
        let us = pos.side_to_move();
        let Some(kind) = pos.kind_at(mv.from()) else {
            return;
        };
        self.history.update_main(us, mv, threats, bonus);
        for prev in self.conts(ply).into_iter().flatten() {
            self.history.update_continuation(prev, us, kind, mv.to(), bonus);
        }
    }

    fn update_noisy(&mut self, pos: &Position, mv: Move, bonus: i32) {
        let Some(attacker) = pos.kind_at(mv.from()) else {
            return;
        };
        let captured = if mv.is_en_passant() {
            PieceKind::Pawn
        } else {
            match pos.kind_at(mv.to()) {
                Some(kind) => kind,
                None => return,
            }
        };
        self.history
            .update_capture(pos.side_to_move(), attacker, captured, mv.to(), bonus);
    }

    fn negamax(
        &mut self,
        pos: &Position,
        mut depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        cut_node: bool,
    ) -> i32 {
        if depth <= 0 {
            return self.quiescence(pos, alpha, beta, ply);
        }

        let root = ply == 0;
        let pv_node = beta - alpha > 1;
        self.pv.clear(ply);
        self.nodes += 1;
        if self.should_abort() {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply);
        self.path[ply] = pos.hash();

        let in_check = pos.in_check();
        if !root {
            if pos.is_fifty_move_draw()
                || pos.is_insufficient_material()
                || self.is_repetition(pos, ply)
            {
                return 0;
            }
            if ply >= MAX_PLY - 1 {
                return if in_check { 0 } else { self.static_eval(pos) };
            }

            // Mate distance pruning.
            alpha = alpha.max(-MATE + ply as i32);
            beta = beta.min(MATE - ply as i32 - 1);
            if alpha >= beta {
                return alpha;
            }
        }

        let excluded = self.stack[ply].excluded;
        let singular_search = !excluded.is_null();
        let tt_hit = if singular_search {
            None
        } else {
            self.tt.probe(pos.hash(), ply)
        };
        let tt_move = tt_hit.map_or(Move::NULL, |hit| hit.mv);
        let tt_pv = pv_node || tt_hit.is_some_and(|hit| hit.pv);

        if !pv_node {
            if let Some(hit) = tt_hit {
                let usable = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score >= beta,
                    Bound::Upper => hit.score <= alpha,
                    Bound::None => false,
                };
                if i32::from(hit.depth) >= depth && usable {
                    return hit.score;
                }
            }
        }

        let static_eval = if in_check {
            -INF
        } else if singular_search {
            self.stack[ply].static_eval
        } else {
            self.static_eval(pos)
        };
        let mut eval = static_eval;
        if !in_check {
            if let Some(hit) = tt_hit {
                let sharper = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score > eval,
                    Bound::Upper => hit.score < eval,
                    Bound::None => false,
                };
                if sharper {
                    eval = hit.score;
                }
            }
        }

        self.stack[ply].static_eval = static_eval;
        self.stack[ply].null_move = false;
        self.stack[ply].double_extensions = if root {
            0
        } else {
            self.stack[ply - 1].double_extensions
        };
        self.killers.clear_ply(ply + 1);
        let improving = !in_check && ply >= 2 && static_eval > self.stack[ply - 2].static_eval;

        if !root && !pv_node && !in_check && !singular_search {
            // Reverse futility pruning.
            if depth <= RFP_MAX_DEPTH
                && eval.abs() < MATE_BOUND
                && eval - RFP_MARGIN * (depth - i32::from(improving)) >= beta
            {
                return eval;
            }

            // Razoring.
            if depth <= RAZOR_MAX_DEPTH && eval + RAZOR_MARGIN * depth < alpha {
                let score = self.quiescence(pos, alpha, alpha + 1, ply);
                if score <= alpha {
                    return score;
                }
            }

            // Null move pruning.
            let us = pos.side_to_move();
            if depth >= NMP_MIN_DEPTH
                && eval >= beta
                && beta > -MATE_BOUND
                && !self.stack[ply - 1].null_move
                && pos.has_non_pawn_material(us)
            {
                let reduction = 3 + depth / 3 + ((eval - beta) / 200).min(3);
                let child = pos.make_null_move();
                self.tt.prefetch(child.hash());
                self.stack[ply].piece_to = None;
                self.stack[ply].null_move = true;
                let score =
                    -self.negamax(&child, depth - reduction, -beta, -beta + 1, ply + 1, !cut_node);
                self.stack[ply].null_move = false;
                if self.stopped {
                    return 0;
                }
                if score >= beta {
                    return if score >= MATE_BOUND { beta } else { score };
                }
            }

            // Probcut: a capture that beats beta by a margin in a shallow search
            // is trusted to beat beta at full depth.
            let probcut_beta = beta + PROBCUT_MARGIN;
            if depth >= PROBCUT_MIN_DEPTH
                && beta.abs() < MATE_BOUND
                && !tt_hit.is_some_and(|hit| {
                    i32::from(hit.depth) >= depth - 3 && hit.score < probcut_beta
                })
            {
                let noisy_tt = if tt_move.is_noisy() { tt_move } else { Move::NULL };
                let picker = self.picker(pos, GenType::Noisy, noisy_tt, ply, Bitboard::EMPTY);
                for scored in picker {
                    let mv = scored.mv;
                    if !see(pos, mv, probcut_beta - static_eval) {
                        continue;
                    }
                    let child = pos.make_move(mv);
                    self.tt.prefetch(child.hash());
                    self.stack[ply].piece_to = piece_to(pos, mv);

                    let mut score =
                        -self.quiescence(&child, -probcut_beta, -probcut_beta + 1, ply + 1);
                    if score >= probcut_beta {
                        score = -self.negamax(
                            &child,
                            depth - 4,
                            -probcut_beta,
                            -probcut_beta + 1,
                            ply + 1,
                            !cut_node,
                        );
                    }
                    if self.stopped {
                        return 0;
                    }
                    if score >= probcut_beta {
                        self.tt.store(
                            pos.hash(),
                            mv,
                            score,
                            (depth - 3) as u8,
                            Bound::Lower,
                            tt_pv,
                            ply,
                        );
                        return score;
                    }
                }
            }
        }

        // Internal iterative reduction.
        if (pv_node || cut_node)
            && depth >= IIR_MIN_DEPTH
            && tt_move.is_null()
            && !singular_search
        {
            depth -= 1;
        }

        let us = pos.side_to_move();
        let threats = pos.attacked_by(us.other());
        let picker = self.picker(pos, GenType::All, tt_move, ply, threats);

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = Move::NULL;
        let mut moves_made = 0usize;
        let mut quiets_tried: Vec<Move> = Vec::with_capacity(32);
        let mut noisy_tried: Vec<Move> = Vec::with_capacity(16);
        let mut skip_quiets = false;
        let lmp_limit = ((3 + depth * depth) / (2 - i32::from(improving))) as usize;

        for scored in picker {
            let mv = scored.mv;
            if mv == excluded {
                continue;
            }
            let is_quiet = mv.is_quiet();
            if is_quiet && skip_quiets {
                continue;
            }

            if !root && best_score > -MATE_BOUND {
                let lmr_depth = (depth - self.lmr.get(depth, moves_made + 1)).max(0);

                if is_quiet && !in_check {
                    // Late move pruning.
                    if !pv_node && moves_made >= lmp_limit {
                        skip_quiets = true;
                        continue;
                    }
                    // Futility pruning.
                    if lmr_depth <= FUTILITY_MAX_DEPTH
                        && static_eval + FUTILITY_BASE + FUTILITY_MARGIN * lmr_depth <= alpha
                    {
                        skip_quiets = true;
                        continue;
                    }
                }

                // SEE pruning.
                let margin = if is_quiet {
                    -SEE_QUIET_MARGIN * lmr_depth
                } else {
                    -SEE_NOISY_MARGIN * depth * depth
                };
                if depth <= SEE_PRUNE_MAX_DEPTH && !see(pos, mv, margin) {
                    continue;
                }
            }

            // Singular extension: is the hash move the only good move here?
            let mut extension = 0;
            if !root && depth >= SINGULAR_MIN_DEPTH && mv == tt_move && !singular_search {
                if let Some(hit) = tt_hit {
                    if i32::from(hit.depth) >= depth - 3
                        && matches!(hit.bound, Bound::Lower | Bound::Exact)
                        && hit.score.abs() < MATE_BOUND
                    {
                        let singular_beta = hit.score - 2 * depth;
                        let singular_depth = (depth - 1) / 2;

                        self.stack[ply].excluded = mv;
                        let value = self.negamax(
                            pos,
                            singular_depth,
                            singular_beta - 1,
                            singular_beta,
                            ply,
                            cut_node,
                        );
                        self.stack[ply].excluded = Move::NULL;
                        if self.stopped {
                            return 0;
                        }

                        if value < singular_beta {
                            extension = if !pv_node
                                && value < singular_beta - DOUBLE_EXTENSION_MARGIN
                                && self.stack[ply].double_extensions <= MAX_DOUBLE_EXTENSIONS
                            {
                                2
                            } else {
                                1
                            };
                        } else if singular_beta >= beta {
                            // Multi-cut: even without the hash move this node fails high.
                            return singular_beta;
                        } else if hit.score >= beta {
                            extension = -1;
                        }
                    }
                }
            }

            let child = pos.make_move(mv);
            self.tt.prefetch(child.hash());
            self.stack[ply].piece_to = piece_to(pos, mv);
            if is_quiet {
                quiets_tried.push(mv);
            } else {
                noisy_tried.push(mv);
            }
            moves_made += 1;

            let nodes_before = self.nodes;
            let new_depth = depth - 1 + extension;
            if extension >= 2 {
                self.stack[ply].double_extensions += 1;
            }

            let mut score;
            if moves_made == 1 {
                score = -self.negamax(
                    &child,
                    new_depth,
                    -beta,
                    -alpha,
                    ply + 1,
                    !pv_node && !cut_node,
                );
            } else {
                let mut reduction = 0;
                if depth >= 3 && (is_quiet || !scored.is_good_noisy()) {
                    reduction = self.lmr.get(depth, moves_made);
                    reduction += i32::from(!pv_node);
                    reduction -= i32::from(tt_pv);
                    reduction += i32::from(cut_node);
                    reduction -= i32::from(child.in_check());
                    if is_quiet {
                        reduction -= scored.score / 8192;
                    }
                    reduction = reduction.min(new_depth - 1).max(0);
                }

                score = -self.negamax(
                    &child,
                    new_depth - reduction,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    true,
                );
                if score > alpha && reduction > 0 {
                    score =
                        -self.negamax(&child, new_depth, -alpha - 1, -alpha, ply + 1, !cut_node);
                }
                if pv_node && score > alpha && score < beta {
                    score = -self.negamax(&child, new_depth, -beta, -alpha, ply + 1, false);
                }
            }

            if extension >= 2 {
                self.stack[ply].double_extensions -= 1;
            }
            if root {
                self.root_nodes[root_index(mv)] += self.nodes - nodes_before;
            }
            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    if pv_node {
                        self.pv.update(ply, mv);
                    }
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if moves_made == 0 {
            if singular_search {
                return alpha;
            }
            return if in_check { -MATE + ply as i32 } else { 0 };
        }

        if best_score >= beta {
            let bonus = history_bonus(depth);
            if best_move.is_quiet() {
                self.killers.insert(ply, best_move);
                self.update_quiet(pos, ply, best_move, threats, bonus);
                for &mv in quiets_tried.iter().filter(|&&m| m != best_move) {
                    self.update_quiet(pos, ply, mv, threats, -bonus);
                }
            } else {
                self.update_noisy(pos, best_move, bonus);
            }
            for &mv in noisy_tried.iter().filter(|&&m| m != best_move) {
                self.update_noisy(pos, mv, -bonus);
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if alpha > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };

        if !singular_search {
            self.tt.store(
                pos.hash(),
                best_move,
                best_score,
                depth.clamp(0, i32::from(u8::MAX)) as u8,
                bound,
                tt_pv,
                ply,
            );

            let noisy_best = !best_move.is_null() && best_move.is_noisy();
            if !in_check
                && !noisy_best
                && best_score.abs() < MATE_BOUND
                && !(bound == Bound::Lower && best_score <= static_eval)
                && !(bound == Bound::Upper && best_score >= static_eval)
            {
                self.history
                    .update_correction(pos, depth, best_score - static_eval);
            }
        }

        best_score
    }

    fn quiescence(&mut self, pos: &Position, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        let pv_node = beta - alpha > 1;
        self.pv.clear(ply);
        self.nodes += 1;
        if self.should_abort() {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply);

        if pos.is_fifty_move_draw() || pos.is_insufficient_material() {
            return 0;
        }
        let in_check = pos.in_check();
        if ply >= MAX_PLY - 1 {
            return if in_check { 0 } else { self.static_eval(pos) };
        }

        let tt_hit = self.tt.probe(pos.hash(), ply);
        if !pv_node {
            if let Some(hit) = tt_hit {
                let usable = match hit.bound {
                    Bound::Exact => true,
                    Bound::Lower => hit.score >= beta,
                    Bound::Upper => hit.score <= alpha,
                    Bound::None => false,
                };
                if usable {
                    return hit.score;
                }
            }
        }

        let static_eval;
        let mut best_score;
        if in_check {
            static_eval = -INF;
            best_score = -INF;
        } else {
            static_eval = self.static_eval(pos);
            best_score = static_eval;
            if best_score >= beta {
                return best_score;
            }
            alpha = alpha.max(best_score);
        }

        let tt_move = tt_hit.map_or(Move::NULL, |hit| hit.mv);
        let (gen, threats) = if in_check {
            (GenType::All, pos.attacked_by(pos.side_to_move().other()))
        } else {
            (GenType::Noisy, Bitboard::EMPTY)
        };
        let picker = self.picker(pos, gen, tt_move, ply, threats);

        let original_alpha = alpha;
        let mut best_move = Move::NULL;
        let mut moves_made = 0usize;

        for scored in picker {
            let mv = scored.mv;
            if !in_check {
                // Delta pruning: even winning the target cannot lift alpha.
                if !mv.is_promotion()
                    && static_eval + capture_gain(pos, mv) + QS_DELTA_MARGIN <= alpha
                {
                    continue;
                }
                if !see(pos, mv, 0) {
                    continue;
                }
            }

            let child = pos.make_move(mv);
            self.tt.prefetch(child.hash());
            self.stack[ply].piece_to = piece_to(pos, mv);
            moves_made += 1;

            let score = -self.quiescence(&child, -beta, -alpha, ply + 1);
            if self.stopped {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    best_move = mv;
                    alpha = score;
                    if pv_node {
                        self.pv.update(ply, mv);
                    }
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }

        if in_check && moves_made == 0 {
            return -MATE + ply as i32;
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if alpha > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .store(pos.hash(), best_move, best_score, 0, bound, pv_node, ply);

        best_score
    }
}

#[inline]
fn root_index(mv: Move) -> usize {
    usize::from(mv.from()) * 64 + usize::from(mv.to())
}

#[inline]
fn piece_to(pos: &Position, mv: Move) -> Option<PieceTo> {
    pos.kind_at(mv.from()).map(|kind| PieceTo {
        side: pos.side_to_move(),
        kind,
        to: mv.to(),
    })
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
