//! Structural predicates over a face projection.
//!
//! All predicates assume the fixed color scheme and the cross-on-top
//! orientation: the white cross is built on the top face and the last layer
//! is the bottom face.

use crate::cube::{Color, Cube3x3Faces, CubeFace};

/// Top-face cross edges are white and each side face's top-row center edge
/// matches that face's center color.
pub fn white_cross_valid(faces: &Cube3x3Faces) -> bool {
    faces.color(CubeFace::Top, 0, 1) == Color::White
        && faces.color(CubeFace::Top, 1, 0) == Color::White
        && faces.color(CubeFace::Top, 1, 2) == Color::White
        && faces.color(CubeFace::Top, 2, 1) == Color::White
        && faces.color(CubeFace::Front, 0, 1) == Color::Green
        && faces.color(CubeFace::Right, 0, 1) == Color::Red
        && faces.color(CubeFace::Back, 0, 1) == Color::Blue
        && faces.color(CubeFace::Left, 0, 1) == Color::Orange
}

/// Number of solved first-two-layer slots (0..=4).
///
/// A slot is solved when its top corner sticker is white and the two side
/// faces of the slot match their center color through the upper two rows.
pub fn f2l_pair_count(faces: &Cube3x3Faces) -> u8 {
    let mut count = 0;
    // Back-left slot.
    if faces.color(CubeFace::Top, 0, 0) == Color::White
        && faces.color(CubeFace::Back, 0, 2) == Color::Blue
        && faces.color(CubeFace::Back, 1, 2) == Color::Blue
        && faces.color(CubeFace::Left, 0, 0) == Color::Orange
        && faces.color(CubeFace::Left, 1, 0) == Color::Orange
    {
        count += 1;
    }
    // Back-right slot.
    if faces.color(CubeFace::Top, 0, 2) == Color::White
        && faces.color(CubeFace::Back, 0, 0) == Color::Blue
        && faces.color(CubeFace::Back, 1, 0) == Color::Blue
        && faces.color(CubeFace::Right, 0, 2) == Color::Red
        && faces.color(CubeFace::Right, 1, 2) == Color::Red
    {
        count += 1;
    }
    // Front-left slot.
    if faces.color(CubeFace::Top, 2, 0) == Color::White
        && faces.color(CubeFace::Front, 0, 0) == Color::Green
        && faces.color(CubeFace::Front, 1, 0) == Color::Green
        && faces.color(CubeFace::Left, 0, 2) == Color::Orange
        && faces.color(CubeFace::Left, 1, 2) == Color::Orange
    {
        count += 1;
    }
    // Front-right slot.
    if faces.color(CubeFace::Top, 2, 2) == Color::White
        && faces.color(CubeFace::Front, 0, 2) == Color::Green
        && faces.color(CubeFace::Front, 1, 2) == Color::Green
        && faces.color(CubeFace::Right, 0, 0) == Color::Red
        && faces.color(CubeFace::Right, 1, 0) == Color::Red
    {
        count += 1;
    }
    count
}

pub fn f2l_solved(faces: &Cube3x3Faces) -> bool {
    f2l_pair_count(faces) == 4
}

/// Bottom-face cross edges are yellow.
pub fn yellow_cross_valid(faces: &Cube3x3Faces) -> bool {
    faces.color(CubeFace::Bottom, 0, 1) == Color::Yellow
        && faces.color(CubeFace::Bottom, 1, 0) == Color::Yellow
        && faces.color(CubeFace::Bottom, 1, 2) == Color::Yellow
        && faces.color(CubeFace::Bottom, 2, 1) == Color::Yellow
}

/// Every non-center bottom sticker is yellow.
pub fn last_layer_oriented(faces: &Cube3x3Faces) -> bool {
    faces.color(CubeFace::Bottom, 0, 0) == Color::Yellow
        && faces.color(CubeFace::Bottom, 0, 1) == Color::Yellow
        && faces.color(CubeFace::Bottom, 0, 2) == Color::Yellow
        && faces.color(CubeFace::Bottom, 1, 0) == Color::Yellow
        && faces.color(CubeFace::Bottom, 1, 2) == Color::Yellow
        && faces.color(CubeFace::Bottom, 2, 0) == Color::Yellow
        && faces.color(CubeFace::Bottom, 2, 1) == Color::Yellow
        && faces.color(CubeFace::Bottom, 2, 2) == Color::Yellow
}

/// The two bottom-row corner stickers of each side face match each other,
/// implying correct corner permutation up to a bottom-layer rotation.
pub fn last_layer_corners_valid(faces: &Cube3x3Faces) -> bool {
    faces.color(CubeFace::Front, 2, 0) == faces.color(CubeFace::Front, 2, 2)
        && faces.color(CubeFace::Right, 2, 0) == faces.color(CubeFace::Right, 2, 2)
        && faces.color(CubeFace::Back, 2, 0) == faces.color(CubeFace::Back, 2, 2)
        && faces.color(CubeFace::Left, 2, 0) == faces.color(CubeFace::Left, 2, 2)
}
