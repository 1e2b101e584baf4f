//! Exact 3x3x3 state as corner/edge permutation and orientation.
//!
//! Slots are fixed positions on the cube; the state records which cubie
//! occupies each slot and how it is twisted or flipped relative to the slot's
//! reference sticker (the top/bottom sticker for corners and top/bottom-layer
//! edges, the front/back sticker for equatorial edges).

use serde::{Deserialize, Serialize};

use super::moves::{Face, Move, MoveSequence};

// Corner slots.
pub(crate) const URF: u8 = 0;
pub(crate) const UFL: u8 = 1;
pub(crate) const ULB: u8 = 2;
pub(crate) const UBR: u8 = 3;
pub(crate) const DFR: u8 = 4;
pub(crate) const DLF: u8 = 5;
pub(crate) const DBL: u8 = 6;
pub(crate) const DRB: u8 = 7;

// Edge slots.
pub(crate) const UR: u8 = 0;
pub(crate) const UF: u8 = 1;
pub(crate) const UL: u8 = 2;
pub(crate) const UB: u8 = 3;
pub(crate) const DR: u8 = 4;
pub(crate) const DF: u8 = 5;
pub(crate) const DL: u8 = 6;
pub(crate) const DB: u8 = 7;
pub(crate) const FR: u8 = 8;
pub(crate) const FL: u8 = 9;
pub(crate) const BL: u8 = 10;
pub(crate) const BR: u8 = 11;

/// One clockwise quarter turn of a face, in replaced-by form: the cubie that
/// ends up in slot `i` comes from slot `corner_src[i]` / `edge_src[i]`, and
/// picks up the listed orientation delta.
struct FaceTurn {
    corner_src: [u8; 8],
    corner_twist: [u8; 8],
    edge_src: [u8; 12],
    edge_flip: [u8; 12],
}

// Indexed by Face discriminant: U, D, L, R, F, B.
const TURNS: [FaceTurn; 6] = [
    // U
    FaceTurn {
        corner_src: [UBR, URF, UFL, ULB, DFR, DLF, DBL, DRB],
        corner_twist: [0; 8],
        edge_src: [UB, UR, UF, UL, DR, DF, DL, DB, FR, FL, BL, BR],
        edge_flip: [0; 12],
    },
    // D
    FaceTurn {
        corner_src: [URF, UFL, ULB, UBR, DLF, DBL, DRB, DFR],
        corner_twist: [0; 8],
        edge_src: [UR, UF, UL, UB, DF, DL, DB, DR, FR, FL, BL, BR],
        edge_flip: [0; 12],
    },
    // L
    FaceTurn {
        corner_src: [URF, ULB, DBL, UBR, DFR, UFL, DLF, DRB],
        corner_twist: [0, 1, 2, 0, 0, 2, 1, 0],
        edge_src: [UR, UF, BL, UB, DR, DF, FL, DB, FR, UL, DL, BR],
        edge_flip: [0; 12],
    },
    // R
    FaceTurn {
        corner_src: [DFR, UFL, ULB, URF, DRB, DLF, DBL, UBR],
        corner_twist: [2, 0, 0, 1, 1, 0, 0, 2],
        edge_src: [FR, UF, UL, UB, BR, DF, DL, DB, DR, FL, BL, UR],
        edge_flip: [0; 12],
    },
    // F
    FaceTurn {
        corner_src: [UFL, DLF, ULB, UBR, URF, DFR, DBL, DRB],
        corner_twist: [1, 2, 0, 0, 2, 1, 0, 0],
        edge_src: [UR, FL, UL, UB, DR, FR, DL, DB, UF, DF, BL, BR],
        edge_flip: [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
    },
    // B
    FaceTurn {
        corner_src: [URF, UFL, UBR, DRB, DFR, DLF, ULB, DBL],
        corner_twist: [0, 0, 1, 2, 0, 0, 2, 1],
        edge_src: [UR, UF, UL, BR, DR, DF, DL, BL, FR, FL, UB, DB],
        edge_flip: [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
    },
];

const SOLVED_CORNER_PERM: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];
const SOLVED_EDGE_PERM: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Authoritative cube state. `Default` is the solved cube in the fixed color
/// scheme (white top, yellow bottom, green front, blue back, red right,
/// orange left).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cube3x3 {
    pub(crate) corner_perm: [u8; 8],
    pub(crate) corner_twist: [u8; 8],
    pub(crate) edge_perm: [u8; 12],
    pub(crate) edge_flip: [u8; 12],
}

impl Default for Cube3x3 {
    fn default() -> Self {
        Self {
            corner_perm: SOLVED_CORNER_PERM,
            corner_twist: [0; 8],
            edge_perm: SOLVED_EDGE_PERM,
            edge_flip: [0; 12],
        }
    }
}

impl Cube3x3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_solved(&self) -> bool {
        self.corner_perm == SOLVED_CORNER_PERM
            && self.edge_perm == SOLVED_EDGE_PERM
            && self.corner_twist == [0; 8]
            && self.edge_flip == [0; 12]
    }

    pub fn apply(&mut self, mv: Move) {
        let turn = &TURNS[mv.face() as usize];
        let reps = if mv.is_double() {
            2
        } else if mv.is_counterclockwise() {
            3
        } else {
            1
        };
        for _ in 0..reps {
            self.turn(turn);
        }
    }

    pub fn apply_sequence(&mut self, moves: &MoveSequence) {
        for mv in moves.iter() {
            self.apply(mv);
        }
    }

    fn turn(&mut self, turn: &FaceTurn) {
        let cp = self.corner_perm;
        let ct = self.corner_twist;
        for i in 0..8 {
            let src = turn.corner_src[i] as usize;
            self.corner_perm[i] = cp[src];
            self.corner_twist[i] = (ct[src] + turn.corner_twist[i]) % 3;
        }
        let ep = self.edge_perm;
        let ef = self.edge_flip;
        for i in 0..12 {
            let src = turn.edge_src[i] as usize;
            self.edge_perm[i] = ep[src];
            self.edge_flip[i] = (ef[src] + turn.edge_flip[i]) % 2;
        }
    }
}

// Tables must stay aligned with the Face discriminants they are indexed by.
const _: () = {
    assert!(Face::U as usize == 0);
    assert!(Face::B as usize == 5);
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn cube_after(s: &str) -> Cube3x3 {
        let mut cube = Cube3x3::new();
        cube.apply_sequence(&MoveSequence::from_str(s).unwrap());
        cube
    }

    #[test]
    fn solved_by_default() {
        assert!(Cube3x3::new().is_solved());
    }

    #[test]
    fn every_move_has_an_inverse() {
        for mv in Move::ALL {
            let mut cube = Cube3x3::new();
            cube.apply(mv);
            assert!(!cube.is_solved(), "{mv} must disturb the cube");
            cube.apply(mv.inverse());
            assert!(cube.is_solved(), "{mv} then {} must cancel", mv.inverse());
        }
    }

    #[test]
    fn four_quarter_turns_are_identity() {
        for face_turn in [Move::U, Move::D, Move::L, Move::R, Move::F, Move::B] {
            let mut cube = Cube3x3::new();
            for _ in 0..4 {
                cube.apply(face_turn);
            }
            assert!(cube.is_solved(), "{face_turn}^4 must be identity");
        }
    }

    #[test]
    fn half_turn_equals_two_quarter_turns() {
        for face in [Move::U2, Move::D2, Move::L2, Move::R2, Move::F2, Move::B2] {
            let mut doubled = Cube3x3::new();
            doubled.apply(face);
            doubled.apply(face);
            assert!(doubled.is_solved(), "{face}^2 must be identity");
        }
    }

    #[test]
    fn sexy_move_has_order_six() {
        let mut cube = Cube3x3::new();
        let sexy = MoveSequence::from_str("R U R' U'").unwrap();
        for i in 0..6 {
            assert_eq!(cube.is_solved(), i == 0);
            cube.apply_sequence(&sexy);
        }
        assert!(cube.is_solved());
    }

    #[test]
    fn scramble_and_inverse_cancel() {
        let scramble = MoveSequence::from_str("R U2 F' D B2 L' F2 U' R2 B D2 L").unwrap();
        let mut cube = Cube3x3::new();
        cube.apply_sequence(&scramble);
        assert!(!cube.is_solved());
        cube.apply_sequence(&scramble.inverse());
        assert!(cube.is_solved());
    }

    #[test]
    fn orientation_sums_stay_legal() {
        let cube = cube_after("R U F' L D2 B R' F U2 D L2 B'");
        let twist: u32 = cube.corner_twist.iter().map(|&t| t as u32).sum();
        let flip: u32 = cube.edge_flip.iter().map(|&f| f as u32).sum();
        assert_eq!(twist % 3, 0);
        assert_eq!(flip % 2, 0);
    }
}
