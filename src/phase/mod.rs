//! CFOP phase inference.
//!
//! - predicates: structural checks over a face projection
//! - splits: the solve-state machine and split-time replay

pub mod predicates;
pub mod splits;

pub use predicates::{
    f2l_pair_count, f2l_solved, last_layer_corners_valid, last_layer_oriented, white_cross_valid,
    yellow_cross_valid,
};
pub use splits::{
    generate_detailed_split_times, generate_split_times, transition_solve_state, DetailedSplit,
    DetailedSplitTimes, SolveState, SplitTimes,
};
