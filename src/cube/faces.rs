//! Sticker projection of a cube state.
//!
//! The projection is pure: it reads the permutation/orientation state and
//! produces six 3x3 color grids. Side faces are read from outside the cube
//! with the top face up, so row 0 of every side face touches the top face.
//! The top face has the back edge at row 0 and the left edge at column 0;
//! the bottom face has the front edge at row 0 and the left edge at column 0.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::state::{self, Cube3x3};

/// Sticker color in the fixed color scheme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Green,
    Red,
    Blue,
    Orange,
    Yellow,
}

/// A face of the projection, named from the solver's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CubeFace {
    Top,
    Front,
    Right,
    Back,
    Left,
    Bottom,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Top,
        CubeFace::Front,
        CubeFace::Right,
        CubeFace::Back,
        CubeFace::Left,
        CubeFace::Bottom,
    ];

    /// Center color of this face.
    pub fn color(self) -> Color {
        match self {
            CubeFace::Top => Color::White,
            CubeFace::Front => Color::Green,
            CubeFace::Right => Color::Red,
            CubeFace::Back => Color::Blue,
            CubeFace::Left => Color::Orange,
            CubeFace::Bottom => Color::Yellow,
        }
    }
}

impl fmt::Display for CubeFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CubeFace::Top => "top",
            CubeFace::Front => "front",
            CubeFace::Right => "right",
            CubeFace::Back => "back",
            CubeFace::Left => "left",
            CubeFace::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Facelet coordinate: face, row, column.
type Facelet = (CubeFace, usize, usize);

/// Sticker homes of each corner slot, clockwise around the corner starting
/// from the top/bottom sticker.
const CORNER_FACELETS: [[Facelet; 3]; 8] = [
    // URF
    [
        (CubeFace::Top, 2, 2),
        (CubeFace::Right, 0, 0),
        (CubeFace::Front, 0, 2),
    ],
    // UFL
    [
        (CubeFace::Top, 2, 0),
        (CubeFace::Front, 0, 0),
        (CubeFace::Left, 0, 2),
    ],
    // ULB
    [
        (CubeFace::Top, 0, 0),
        (CubeFace::Left, 0, 0),
        (CubeFace::Back, 0, 2),
    ],
    // UBR
    [
        (CubeFace::Top, 0, 2),
        (CubeFace::Back, 0, 0),
        (CubeFace::Right, 0, 2),
    ],
    // DFR
    [
        (CubeFace::Bottom, 0, 2),
        (CubeFace::Front, 2, 2),
        (CubeFace::Right, 2, 0),
    ],
    // DLF
    [
        (CubeFace::Bottom, 0, 0),
        (CubeFace::Left, 2, 2),
        (CubeFace::Front, 2, 0),
    ],
    // DBL
    [
        (CubeFace::Bottom, 2, 0),
        (CubeFace::Back, 2, 2),
        (CubeFace::Left, 2, 0),
    ],
    // DRB
    [
        (CubeFace::Bottom, 2, 2),
        (CubeFace::Right, 2, 2),
        (CubeFace::Back, 2, 0),
    ],
];

/// Colors of each corner cubie in the same sticker order.
const CORNER_COLORS: [[Color; 3]; 8] = [
    [Color::White, Color::Red, Color::Green],
    [Color::White, Color::Green, Color::Orange],
    [Color::White, Color::Orange, Color::Blue],
    [Color::White, Color::Blue, Color::Red],
    [Color::Yellow, Color::Green, Color::Red],
    [Color::Yellow, Color::Orange, Color::Green],
    [Color::Yellow, Color::Blue, Color::Orange],
    [Color::Yellow, Color::Red, Color::Blue],
];

/// Sticker homes of each edge slot, reference sticker first.
const EDGE_FACELETS: [[Facelet; 2]; 12] = [
    // UR
    [(CubeFace::Top, 1, 2), (CubeFace::Right, 0, 1)],
    // UF
    [(CubeFace::Top, 2, 1), (CubeFace::Front, 0, 1)],
    // UL
    [(CubeFace::Top, 1, 0), (CubeFace::Left, 0, 1)],
    // UB
    [(CubeFace::Top, 0, 1), (CubeFace::Back, 0, 1)],
    // DR
    [(CubeFace::Bottom, 1, 2), (CubeFace::Right, 2, 1)],
    // DF
    [(CubeFace::Bottom, 0, 1), (CubeFace::Front, 2, 1)],
    // DL
    [(CubeFace::Bottom, 1, 0), (CubeFace::Left, 2, 1)],
    // DB
    [(CubeFace::Bottom, 2, 1), (CubeFace::Back, 2, 1)],
    // FR
    [(CubeFace::Front, 1, 2), (CubeFace::Right, 1, 0)],
    // FL
    [(CubeFace::Front, 1, 0), (CubeFace::Left, 1, 2)],
    // BL
    [(CubeFace::Back, 1, 2), (CubeFace::Left, 1, 0)],
    // BR
    [(CubeFace::Back, 1, 0), (CubeFace::Right, 1, 2)],
];

/// Colors of each edge cubie in the same sticker order.
const EDGE_COLORS: [[Color; 2]; 12] = [
    [Color::White, Color::Red],
    [Color::White, Color::Green],
    [Color::White, Color::Orange],
    [Color::White, Color::Blue],
    [Color::Yellow, Color::Red],
    [Color::Yellow, Color::Green],
    [Color::Yellow, Color::Orange],
    [Color::Yellow, Color::Blue],
    [Color::Green, Color::Red],
    [Color::Green, Color::Orange],
    [Color::Blue, Color::Orange],
    [Color::Blue, Color::Red],
];

/// Six 3x3 sticker grids projected from a cube state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cube3x3Faces {
    colors: [[Color; 9]; 6],
}

impl Cube3x3Faces {
    pub fn new(cube: &Cube3x3) -> Self {
        // Centers never move; seed every face with its own color.
        let mut colors = [[Color::White; 9]; 6];
        for face in CubeFace::ALL {
            colors[face as usize] = [face.color(); 9];
        }
        let mut faces = Self { colors };

        for slot in 0..8 {
            let cubie = cube.corner_perm[slot] as usize;
            let twist = cube.corner_twist[slot] as usize;
            for (k, &color) in CORNER_COLORS[cubie].iter().enumerate() {
                let (face, row, col) = CORNER_FACELETS[slot][(k + twist) % 3];
                faces.set(face, row, col, color);
            }
        }
        for slot in 0..12 {
            let cubie = cube.edge_perm[slot] as usize;
            let flip = cube.edge_flip[slot] as usize;
            for (k, &color) in EDGE_COLORS[cubie].iter().enumerate() {
                let (face, row, col) = EDGE_FACELETS[slot][(k + flip) % 2];
                faces.set(face, row, col, color);
            }
        }
        faces
    }

    pub fn color(&self, face: CubeFace, row: usize, col: usize) -> Color {
        self.colors[face as usize][row * 3 + col]
    }

    fn set(&mut self, face: CubeFace, row: usize, col: usize, color: Color) {
        self.colors[face as usize][row * 3 + col] = color;
    }
}

impl From<&Cube3x3> for Cube3x3Faces {
    fn from(cube: &Cube3x3) -> Self {
        Self::new(cube)
    }
}

// The projection tables cover the slot indices declared by the state module.
const _: () = {
    assert!(state::URF == 0 && state::DRB == 7);
    assert!(state::UR == 0 && state::BR == 11);
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::moves::{Move, MoveSequence};
    use std::collections::HashMap;
    use std::str::FromStr;

    #[test]
    fn solved_projection_is_uniform() {
        let faces = Cube3x3Faces::new(&Cube3x3::new());
        for face in CubeFace::ALL {
            for row in 0..3 {
                for col in 0..3 {
                    assert_eq!(faces.color(face, row, col), face.color());
                }
            }
        }
    }

    #[test]
    fn top_turn_rotates_side_top_rows() {
        let mut cube = Cube3x3::new();
        cube.apply(Move::U);
        let faces = Cube3x3Faces::new(&cube);
        for col in 0..3 {
            assert_eq!(faces.color(CubeFace::Front, 0, col), Color::Red);
            assert_eq!(faces.color(CubeFace::Right, 0, col), Color::Blue);
            assert_eq!(faces.color(CubeFace::Back, 0, col), Color::Orange);
            assert_eq!(faces.color(CubeFace::Left, 0, col), Color::Green);
        }
        // The top and bottom faces themselves are untouched.
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(faces.color(CubeFace::Top, row, col), Color::White);
                assert_eq!(faces.color(CubeFace::Bottom, row, col), Color::Yellow);
            }
        }
    }

    #[test]
    fn right_turn_moves_front_column_up() {
        let mut cube = Cube3x3::new();
        cube.apply(Move::R);
        let faces = Cube3x3Faces::new(&cube);
        // The right face itself only spins, staying red.
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(faces.color(CubeFace::Right, row, col), Color::Red);
            }
        }
        // Front's right column went to the top; top's right column to the back.
        for row in 0..3 {
            assert_eq!(faces.color(CubeFace::Top, row, 2), Color::Green);
            assert_eq!(faces.color(CubeFace::Front, row, 2), Color::Yellow);
            assert_eq!(faces.color(CubeFace::Bottom, row, 2), Color::Blue);
            assert_eq!(faces.color(CubeFace::Back, row, 0), Color::White);
        }
        // Everything off the turned layer keeps its color.
        for row in 0..3 {
            for col in 0..2 {
                assert_eq!(faces.color(CubeFace::Top, row, col), Color::White);
                assert_eq!(faces.color(CubeFace::Front, row, col), Color::Green);
            }
        }
    }

    #[test]
    fn every_color_appears_nine_times() {
        let mut cube = Cube3x3::new();
        cube.apply_sequence(&MoveSequence::from_str("R U2 F' D B2 L' F2 U' R2 B D2 L").unwrap());
        let faces = Cube3x3Faces::new(&cube);
        let mut counts: HashMap<Color, usize> = HashMap::new();
        for face in CubeFace::ALL {
            for row in 0..3 {
                for col in 0..3 {
                    *counts.entry(faces.color(face, row, col)).or_default() += 1;
                }
            }
        }
        assert_eq!(counts.len(), 6);
        for (&color, &count) in &counts {
            assert_eq!(count, 9, "{color:?} must appear exactly nine times");
        }
    }

    #[test]
    fn projection_round_trips_through_inverse() {
        let scramble = MoveSequence::from_str("F R U' L2 B D' F2 R'").unwrap();
        let mut cube = Cube3x3::new();
        cube.apply_sequence(&scramble);
        cube.apply_sequence(&scramble.inverse());
        assert_eq!(Cube3x3Faces::new(&cube), Cube3x3Faces::new(&Cube3x3::new()));
    }
}
