//! Solve-state machine and split-time replay.
//!
//! A solve progresses through a totally ordered set of states. The machine
//! is strictly monotone: once a state's predicate has held, later face
//! configurations can only advance it. Replaying a timed move stream through
//! the machine yields the per-phase split times and move-efficiency metrics.

use serde::{Deserialize, Serialize};

use super::predicates::{
    f2l_pair_count, f2l_solved, last_layer_corners_valid, last_layer_oriented, white_cross_valid,
    yellow_cross_valid,
};
use crate::cube::{Cube3x3, Cube3x3Faces, Move, MoveSequence, TimedMoveSequence};

/// Progress through a CFOP solve, in order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SolveState {
    Initial,
    Cross,
    F2lFirstPair,
    F2lSecondPair,
    F2lThirdPair,
    F2lComplete,
    OllCross,
    OllComplete,
    PllCorners,
    Solved,
}

impl SolveState {
    pub fn next(self) -> Option<SolveState> {
        match self {
            SolveState::Initial => Some(SolveState::Cross),
            SolveState::Cross => Some(SolveState::F2lFirstPair),
            SolveState::F2lFirstPair => Some(SolveState::F2lSecondPair),
            SolveState::F2lSecondPair => Some(SolveState::F2lThirdPair),
            SolveState::F2lThirdPair => Some(SolveState::F2lComplete),
            SolveState::F2lComplete => Some(SolveState::OllCross),
            SolveState::OllCross => Some(SolveState::OllComplete),
            SolveState::OllComplete => Some(SolveState::PllCorners),
            SolveState::PllCorners => Some(SolveState::Solved),
            SolveState::Solved => None,
        }
    }
}

/// Advance the state machine as far as the cube allows.
///
/// A solved cube short-circuits to `Solved`. Otherwise the next-state
/// predicate is tried repeatedly until one fails. Monotone in `current`.
pub fn transition_solve_state(cube: &Cube3x3, current: SolveState) -> SolveState {
    if cube.is_solved() {
        return SolveState::Solved;
    }

    let faces = Cube3x3Faces::new(cube);
    let mut state = current;
    loop {
        let advanced = match state {
            SolveState::Initial => white_cross_valid(&faces),
            SolveState::Cross => white_cross_valid(&faces) && f2l_pair_count(&faces) >= 1,
            SolveState::F2lFirstPair => {
                white_cross_valid(&faces) && f2l_pair_count(&faces) >= 2
            }
            SolveState::F2lSecondPair => {
                white_cross_valid(&faces) && f2l_pair_count(&faces) >= 3
            }
            SolveState::F2lThirdPair => f2l_solved(&faces),
            SolveState::F2lComplete => f2l_solved(&faces) && yellow_cross_valid(&faces),
            SolveState::OllCross => f2l_solved(&faces) && last_layer_oriented(&faces),
            SolveState::OllComplete => {
                f2l_solved(&faces)
                    && last_layer_oriented(&faces)
                    && last_layer_corners_valid(&faces)
            }
            SolveState::PllCorners | SolveState::Solved => false,
        };
        match (advanced, state.next()) {
            (true, Some(next)) => state = next,
            _ => return state,
        }
    }
}

/// Coarse split timestamps, milliseconds from solve start. Zero means the
/// state was never recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitTimes {
    pub cross_ms: u32,
    pub f2l_pair_ms: [u32; 4],
    pub oll_cross_ms: u32,
    pub oll_finish_ms: u32,
    pub pll_corner_ms: u32,
}

impl SplitTimes {
    fn record(&mut self, state: SolveState, at_ms: u32) {
        match state {
            SolveState::Cross => self.cross_ms = at_ms,
            SolveState::F2lFirstPair => self.f2l_pair_ms[0] = at_ms,
            SolveState::F2lSecondPair => self.f2l_pair_ms[1] = at_ms,
            SolveState::F2lThirdPair => self.f2l_pair_ms[2] = at_ms,
            SolveState::F2lComplete => self.f2l_pair_ms[3] = at_ms,
            SolveState::OllCross => self.oll_cross_ms = at_ms,
            SolveState::OllComplete => self.oll_finish_ms = at_ms,
            SolveState::PllCorners => self.pll_corner_ms = at_ms,
            // The terminal state has no split of its own.
            SolveState::Initial | SolveState::Solved => {}
        }
    }
}

/// Replay a timed move stream and record one split per state reached.
///
/// The state machine is consulted before each move with the previous move's
/// timestamp, matching how a human observer would call the phase. States not
/// reached by the end of the stream receive the final timestamp.
pub fn generate_split_times(scramble: &MoveSequence, moves: &TimedMoveSequence) -> SplitTimes {
    let mut cube = Cube3x3::new();
    cube.apply_sequence(scramble);

    let mut splits = SplitTimes::default();
    let mut state = SolveState::Initial;
    let mut timestamp = 0;
    for timed in moves.moves() {
        let reached = transition_solve_state(&cube, state);
        let mut passed = state;
        while let Some(next) = passed.next() {
            if next > reached {
                break;
            }
            splits.record(next, timestamp);
            passed = next;
        }
        state = reached;

        cube.apply(timed.mv);
        timestamp = timed.at_ms;
    }

    let mut passed = state;
    while let Some(next) = passed.next() {
        splits.record(next, timestamp);
        passed = next;
    }
    splits
}

/// Per-phase timing detail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedSplit {
    /// When the previous phase finished.
    pub phase_start_ms: u32,
    /// Timestamp of the first move belonging to this phase; equals
    /// `phase_start_ms` for a phase with no moves of its own.
    pub first_move_ms: u32,
    /// When this phase's predicate was satisfied.
    pub finish_ms: u32,
    /// Outer turns spent in this phase.
    pub move_count: u32,
}

/// Full per-phase breakdown plus aggregate move-efficiency metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailedSplitTimes {
    pub cross: DetailedSplit,
    pub f2l_pair: [DetailedSplit; 4],
    pub oll_cross: DetailedSplit,
    pub oll_finish: DetailedSplit,
    pub pll_corner: DetailedSplit,
    pub pll_finish: DetailedSplit,
    /// Total time spent between phases before each phase's first move.
    pub idle_ms: u32,
    /// Outer-turn count of the whole solve.
    pub move_count: u32,
    /// Turns per second over the penalty-adjusted solve time.
    pub tps: f32,
    /// Effective turns per second, excluding per-phase initial move latency.
    pub etps: f32,
}

impl DetailedSplitTimes {
    /// The split a state's completion is recorded in. The terminal state maps
    /// to the final phase.
    fn split_mut(&mut self, state: SolveState) -> &mut DetailedSplit {
        match state {
            SolveState::Cross => &mut self.cross,
            SolveState::F2lFirstPair => &mut self.f2l_pair[0],
            SolveState::F2lSecondPair => &mut self.f2l_pair[1],
            SolveState::F2lThirdPair => &mut self.f2l_pair[2],
            SolveState::F2lComplete => &mut self.f2l_pair[3],
            SolveState::OllCross => &mut self.oll_cross,
            SolveState::OllComplete => &mut self.oll_finish,
            SolveState::PllCorners => &mut self.pll_corner,
            SolveState::Initial | SolveState::Solved => &mut self.pll_finish,
        }
    }

    /// The phase being worked on while in `state`.
    fn active_split_mut(&mut self, state: SolveState) -> &mut DetailedSplit {
        match state.next() {
            Some(next) => self.split_mut(next),
            None => &mut self.pll_finish,
        }
    }

    fn splits_after_cross(&self) -> [&DetailedSplit; 8] {
        [
            &self.f2l_pair[0],
            &self.f2l_pair[1],
            &self.f2l_pair[2],
            &self.f2l_pair[3],
            &self.oll_cross,
            &self.oll_finish,
            &self.pll_corner,
            &self.pll_finish,
        ]
    }
}

/// Replay a timed move stream recording per-phase start, first-move, and
/// finish times together with per-phase outer-turn counts, then derive the
/// idle-time and turns-per-second metrics.
pub fn generate_detailed_split_times(
    scramble: &MoveSequence,
    moves: &TimedMoveSequence,
    time_ms: u32,
    penalty_ms: u32,
) -> DetailedSplitTimes {
    let mut cube = Cube3x3::new();
    cube.apply_sequence(scramble);

    let mut result = DetailedSplitTimes::default();
    let mut state = SolveState::Initial;
    let mut timestamp = 0;
    let mut last_move: Option<Move> = None;
    for timed in moves.moves() {
        let reached = transition_solve_state(&cube, state);
        while state < reached {
            let Some(finished) = state.next() else {
                break;
            };
            result.split_mut(finished).finish_ms = timestamp;
            let opened = result.active_split_mut(finished);
            opened.phase_start_ms = timestamp;
            opened.first_move_ms = timestamp;
            opened.move_count = 0;
            state = finished;
        }

        cube.apply(timed.mv);
        timestamp = timed.at_ms;

        // Count outer turns only: a move extends the previous one when it
        // turns the same face.
        let split = result.active_split_mut(state);
        if split.move_count == 0 {
            split.move_count += 1;
            split.first_move_ms = timestamp;
        } else if !last_move.is_some_and(|prev| Move::same_outer_block(prev, timed.mv)) {
            split.move_count += 1;
        }
        last_move = Some(timed.mv);
    }

    // Close out phases never reached before the stream ended.
    while let Some(finished) = state.next() {
        if finished == SolveState::Solved {
            break;
        }
        result.split_mut(finished).finish_ms = timestamp;
        let opened = result.active_split_mut(finished);
        opened.phase_start_ms = timestamp;
        opened.first_move_ms = timestamp;
        opened.move_count = 0;
        state = finished;
    }

    result.cross.phase_start_ms = 0;
    result.cross.first_move_ms = 0;
    result.pll_finish.finish_ms = timestamp;

    let mut idle_ms = result.cross.first_move_ms - result.cross.phase_start_ms;
    for split in result.splits_after_cross() {
        idle_ms += split.first_move_ms - split.phase_start_ms;
    }
    result.idle_ms = idle_ms;

    // A two-move sequence one second apart is 1 TPS, not 2: the move that
    // opens each phase is excluded from the effective rate. The cross always
    // starts at time zero, so the base count of one covers it.
    let mut first_moves: u32 = 1;
    for split in result.splits_after_cross() {
        if split.first_move_ms != split.phase_start_ms {
            first_moves += 1;
        }
    }

    result.move_count = moves.outer_turn_count() as u32;
    let effective_ms = time_ms as i64 - (penalty_ms + result.idle_ms) as i64;
    result.etps =
        (result.move_count as i64 - first_moves as i64) as f32 / (effective_ms as f32 / 1000.0);
    result.tps = (result.move_count as i64 - 1) as f32
        / ((time_ms as i64 - penalty_ms as i64) as f32 / 1000.0);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::TimedMove;
    use std::str::FromStr;

    fn seq(s: &str) -> MoveSequence {
        MoveSequence::from_str(s).unwrap()
    }

    fn timed(moves: &[(&str, u32)]) -> TimedMoveSequence {
        moves
            .iter()
            .map(|(m, at)| TimedMove::new(m.parse().unwrap(), *at))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn solved_cube_transitions_to_solved_from_anywhere() {
        let cube = Cube3x3::new();
        assert_eq!(
            transition_solve_state(&cube, SolveState::Initial),
            SolveState::Solved
        );
        assert_eq!(
            transition_solve_state(&cube, SolveState::OllCross),
            SolveState::Solved
        );
    }

    #[test]
    fn bottom_turn_away_reaches_pll_corners() {
        // A single bottom turn leaves cross, F2L, and OLL intact and the
        // corners permuted correctly up to the final rotation.
        let mut cube = Cube3x3::new();
        cube.apply(Move::D);
        assert_eq!(
            transition_solve_state(&cube, SolveState::Initial),
            SolveState::PllCorners
        );
    }

    #[test]
    fn broken_cross_stays_initial() {
        let mut cube = Cube3x3::new();
        cube.apply(Move::R);
        assert_eq!(
            transition_solve_state(&cube, SolveState::Initial),
            SolveState::Initial
        );
    }

    #[test]
    fn transition_is_monotone_over_a_replay() {
        let scramble = seq("B' D' L F R2 U L2 D2 F' B R");
        let mut cube = Cube3x3::new();
        cube.apply_sequence(&scramble);
        let mut state = SolveState::Initial;
        for mv in scramble.inverse().iter() {
            let next = transition_solve_state(&cube, state);
            assert!(next >= state);
            state = next;
            cube.apply(mv);
        }
        assert_eq!(transition_solve_state(&cube, state), SolveState::Solved);
    }

    #[test]
    fn splits_for_immediately_valid_states_record_time_zero() {
        // The scrambled position (one bottom turn) is already past every
        // phase but PLL; those states are all recorded at time zero.
        let splits = generate_split_times(&seq("D"), &timed(&[("D'", 500)]));
        assert_eq!(splits.cross_ms, 0);
        assert_eq!(splits.f2l_pair_ms, [0, 0, 0, 0]);
        assert_eq!(splits.oll_cross_ms, 0);
        assert_eq!(splits.oll_finish_ms, 0);
        assert_eq!(splits.pll_corner_ms, 0);
    }

    #[test]
    fn unreached_states_get_the_final_timestamp() {
        // Neither move restores the cross, so every split falls through to
        // the last timestamp.
        let splits = generate_split_times(&seq("R D"), &timed(&[("D'", 700), ("R'", 1500)]));
        assert_eq!(splits.cross_ms, 1500);
        assert_eq!(splits.f2l_pair_ms, [1500; 4]);
        assert_eq!(splits.oll_cross_ms, 1500);
        assert_eq!(splits.oll_finish_ms, 1500);
        assert_eq!(splits.pll_corner_ms, 1500);
    }

    #[test]
    fn empty_stream_leaves_all_splits_at_zero() {
        let splits = generate_split_times(&seq("R U"), &TimedMoveSequence::default());
        assert_eq!(splits, SplitTimes::default());
    }

    #[test]
    fn detailed_splits_for_a_cross_only_stream() {
        // Cross is never restored: both moves are counted against the cross
        // phase and every later phase collapses onto the final timestamp.
        // The cross start and first move are pinned to zero.
        let detail = generate_detailed_split_times(
            &seq("R D"),
            &timed(&[("D'", 700), ("R'", 1500)]),
            2000,
            0,
        );

        assert_eq!(detail.cross.phase_start_ms, 0);
        assert_eq!(detail.cross.first_move_ms, 0);
        assert_eq!(detail.cross.finish_ms, 1500);
        assert_eq!(detail.cross.move_count, 2);

        for split in detail.splits_after_cross() {
            assert_eq!(split.phase_start_ms, 1500);
            assert_eq!(split.first_move_ms, 1500);
        }
        assert_eq!(detail.pll_finish.finish_ms, 1500);
        assert_eq!(detail.pll_finish.move_count, 0);

        assert_eq!(detail.idle_ms, 0);
        assert_eq!(detail.move_count, 2);
        assert_eq!(detail.tps, 0.5);
        assert_eq!(detail.etps, 0.5);
    }

    #[test]
    fn detailed_splits_measure_idle_before_a_late_phase() {
        // The scrambled position is already at PLL corners, so the whole
        // stream belongs to the final phase and the wait before its first
        // move is idle time.
        let detail =
            generate_detailed_split_times(&seq("D"), &timed(&[("D'", 800)]), 1000, 0);

        assert_eq!(detail.pll_corner.finish_ms, 0);
        assert_eq!(detail.pll_finish.phase_start_ms, 0);
        assert_eq!(detail.pll_finish.first_move_ms, 800);
        assert_eq!(detail.pll_finish.finish_ms, 800);
        assert_eq!(detail.pll_finish.move_count, 1);
        assert_eq!(detail.idle_ms, 800);
        assert_eq!(detail.move_count, 1);
        assert_eq!(detail.tps, 0.0);
    }

    #[test]
    fn detailed_splits_count_outer_turns_per_phase() {
        // Same-face runs collapse: D D' D2 D2 is one outer turn in the
        // cross phase before the solving move.
        let detail = generate_detailed_split_times(
            &seq("R"),
            &timed(&[("D", 100), ("D'", 200), ("D2", 300), ("D2", 400), ("R'", 900)]),
            1000,
            0,
        );
        assert_eq!(detail.cross.move_count, 2);
        assert_eq!(detail.idle_ms, 0);
        assert_eq!(detail.move_count, 2);
    }
}
