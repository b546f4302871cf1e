//! Reading and writing puzzles and move sequences as text.
//!
//! A puzzle string lists one character per sticker in flat grid order. Whitespace carries no
//! meaning, so the same puzzle can be laid out however is convenient. A move string is a
//! whitespace separated list of tokens `XYZ` or `XYZ:mask`: the face with color `X` is twisted
//! so that the face with color `Y` goes to where the face with color `Z` was.

use std::io::BufRead;

use log::{debug, trace};
use rustc_hash::FxHashMap;

use crate::coord::Shape;
use crate::error::{Error, Result};
use crate::moves::{Twist, TwistCache};
use crate::target::{AxisColors, Stickers};

/// Puzzles with more cells than this in their backing grid are refused.
pub const MAX_CELLS: f64 = 1e9;

fn insane(msg: impl Into<String>) -> Error {
    Error::InsanePuzzle(msg.into())
}

/// The shape of an `n^d` puzzle, if it's small enough to work with.
pub fn checked_shape(n: usize, d: usize) -> Result<Shape> {
    if n < 1 || d < 1 || ((n + 2) as f64).powf(d as f64) > MAX_CELLS {
        return Err(Error::TooBig { n, d });
    }
    Ok(Shape::new(n, d))
}

/// Parse a puzzle string, working out `n` and `d` from the number of colors and stickers.
///
/// There have to be `2d` distinct colors each appearing on exactly `n^(d-1)` stickers. Nothing
/// is checked beyond the counts.
pub fn parse(s: &str) -> Result<(Shape, Stickers)> {
    let chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    let mut counts: FxHashMap<char, usize> = FxHashMap::default();
    for &c in &chars {
        *counts.entry(c).or_default() += 1;
    }
    if counts.is_empty() || counts.len() % 2 != 0 {
        return Err(insane(format!("odd number of colors {}", counts.len())));
    }

    let d = counts.len() / 2;
    let n = if d <= 1 {
        1
    } else {
        ((chars.len() / (2 * d)) as f64)
            .powf(1.0 / (d - 1) as f64)
            .round() as usize
    };
    let face_size = u32::try_from(d - 1)
        .ok()
        .and_then(|e| n.checked_pow(e))
        .ok_or_else(|| insane(format!("{n}^{d} is too big")))?;
    if face_size.checked_mul(2 * d) != Some(chars.len()) {
        return Err(insane(format!(
            "{} stickers can't make a puzzle with {d} dimensions",
            chars.len()
        )));
    }
    if let Some((c, count)) = counts.iter().find(|(_, &count)| count != face_size) {
        return Err(insane(format!(
            "color {c:?} appears {count} times, expected {face_size} for a {n}^{d} puzzle"
        )));
    }

    let shape = checked_shape(n, d)?;
    let mut next = chars.into_iter();
    let stickers = shape.grid(|index| {
        if shape.is_sticker(index) {
            next.next()
        } else {
            None
        }
    });
    debug!("parsed a {n}^{d} puzzle");
    Ok((shape, stickers))
}

/// Read lines until everything read so far makes a whole puzzle.
///
/// A single word of input could just as well be the first row of a bigger puzzle, so it's never
/// taken for a puzzle with `n <= 1` or `d <= 2`.
pub fn read_puzzle(reader: impl BufRead) -> Result<(Shape, Stickers)> {
    let mut text = String::new();
    let mut lines = 0;
    let mut words = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| Error::Io(e.to_string()))?;
        lines += 1;
        words += line.split_whitespace().count();
        if line.trim().is_empty() {
            continue;
        }
        text.push_str(&line);
        text.push('\n');
        match parse(&text) {
            Ok((shape, _)) if (shape.n <= 1 || shape.d <= 2) && words <= 1 => {
                trace!("not taking {:?} for a whole puzzle yet", text.trim());
            }
            Ok(parsed) => return Ok(parsed),
            Err(_) => {}
        }
    }
    Err(insane(format!(
        "input ended after {lines} lines without making a puzzle"
    )))
}

/// Write a puzzle out with one character per cell, a space wherever there's no sticker and a
/// newline after every `(n+2)^ceil(d/2)` cells.
pub fn format(shape: Shape, stickers: &Stickers) -> String {
    let row = shape.side().pow(((shape.d + 1) / 2) as u32);
    let mut s = String::with_capacity(stickers.len() + stickers.len() / row);
    for (i, c) in stickers.cells().iter().enumerate() {
        s.push(c.unwrap_or(' '));
        if (i + 1) % row == 0 {
            s.push('\n');
        }
    }
    s
}

/// Lay out the stickers of `s` with the whitespace of `template`.
pub fn reformat(s: &str, template: &str) -> Result<String> {
    let found = s.chars().filter(|c| !c.is_whitespace()).count();
    let expected = template.chars().filter(|c| !c.is_whitespace()).count();
    if found != expected {
        return Err(Error::TemplateMismatch { expected, found });
    }
    let mut stickers = s.chars().filter(|c| !c.is_whitespace());
    Ok(template
        .chars()
        .map(|t| {
            if t.is_whitespace() {
                t
            } else {
                stickers.next().unwrap_or(t)
            }
        })
        .collect())
}

/// The solved puzzle, colored `A`, `B`, ... on the negative faces and `a`, `b`, ... on the
/// positive ones.
pub fn solved_stickers(shape: Shape) -> Stickers {
    let last = shape.ni() + 1;
    shape.grid(|index| {
        if !shape.is_sticker(index) {
            return None;
        }
        index.iter().enumerate().find_map(|(axis, &x)| {
            let base = match x {
                0 => 'A',
                x if x == last => 'a',
                _ => return None,
            };
            char::from_u32(base as u32 + axis as u32)
        })
    })
}

/// `n` of the puzzle described by a string.
pub fn puzzle_n(s: &str) -> Result<usize> {
    parse(s).map(|(shape, _)| shape.n)
}

/// `d` of the puzzle described by a string.
pub fn puzzle_d(s: &str) -> Result<usize> {
    parse(s).map(|(shape, _)| shape.d)
}

/// The layer that holds the first cubie, counted from the `face_sign` face.
fn first_cubie_layer(n: usize, face_sign: i32) -> i32 {
    if face_sign < 0 {
        0
    } else {
        n as i32 - 1
    }
}

fn moves_middle(n: usize, twist: &Twist) -> bool {
    n % 2 == 1 && twist.moves_layer((n as i32 - 1) / 2)
}

/// Name each twist by the colors of the puzzle.
///
/// The from and to axes are named by their negative faces. Twists of the middle slice of an odd
/// puzzle carry the face centers along, and later twists are named by where the centers have
/// gone. Even puzzles have nothing fixed to read colors from but the first cubie, so a twist that
/// moves it can't be named.
pub fn moves_to_string(shape: Shape, stickers: &Stickers, twists: &[Twist]) -> Result<String> {
    let n = shape.n;
    let mut colors = AxisColors::of(shape, stickers)?;
    let mut out = String::new();
    for twist in twists {
        if n % 2 == 0 && twist.moves_layer(first_cubie_layer(n, twist.face_sign)) {
            return Err(Error::MovesFirstCubie(twist.to_string()));
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push(colors.color(twist.face_axis, twist.face_sign));
        out.push(colors.color(twist.from_axis, -1));
        out.push(colors.color(twist.to_axis, -1));
        if twist.slices != 1 {
            out.push_str(&format!(":{}", twist.slices));
        }
        if moves_middle(n, twist) {
            colors.rotate(twist.from_axis, twist.to_axis);
        }
    }
    Ok(out)
}

fn parse_move(colors: &AxisColors, token: &str) -> Result<Twist> {
    let bad = || Error::BadMove(token.to_string());
    let (letters, slices) = match token.split_once(':') {
        Some((letters, mask)) => (letters, mask.parse::<i32>().map_err(|_| bad())?),
        None => (token, 1),
    };
    let axes = letters
        .chars()
        .map(|c| colors.find(c).ok_or_else(bad))
        .collect::<Result<Vec<_>>>()?;
    let [(face_axis, face_sign), (from_axis, from_sign), (to_axis, to_sign)] = axes[..] else {
        return Err(bad());
    };
    if face_axis == from_axis || from_axis == to_axis || to_axis == face_axis {
        return Err(bad());
    }
    Ok(Twist::new(
        face_axis, face_sign, from_axis, from_sign, to_axis, to_sign, slices,
    ))
}

/// Read a move string in the frame of the given puzzle.
///
/// Letters are looked up in the axis colors as they stand when the token is reached. For odd
/// puzzles that means following the face centers through middle slice twists. For even puzzles
/// it means twisting a copy of the puzzle along the way and reading the colors off the first
/// cubie again whenever a twist moves it.
pub fn moves_from_string(shape: Shape, stickers: &Stickers, s: &str) -> Result<Vec<Twist>> {
    let n = shape.n;
    let mut colors = AxisColors::of(shape, stickers)?;
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let mut tracked =
        (n % 2 == 0 && tokens.len() > 1).then(|| (stickers.clone(), TwistCache::new(shape)));

    let mut twists = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let twist = parse_move(&colors, token)?;
        trace!("{token} is {twist}");
        twists.push(twist);
        if i + 1 == tokens.len() {
            break;
        }
        if moves_middle(n, &twist) {
            colors.rotate(twist.from_axis, twist.to_axis);
        }
        if let Some((puzzle, cache)) = tracked.as_mut() {
            cache.apply(puzzle, &[twist]);
            if twist.moves_layer(first_cubie_layer(n, twist.face_sign)) {
                colors = AxisColors::of(shape, puzzle)?;
            }
        }
    }
    Ok(twists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{is_solved, target_map};

    #[test]
    fn solved_333_layout() {
        let shape = Shape::new(3, 3);
        let s = format(shape, &solved_stickers(shape));
        let rows: Vec<&str> = s.lines().collect();
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|r| r.chars().count() == 25));
        assert_eq!(rows[0].trim(), "AAA  AAA  AAA");
        assert_eq!(
            s.split_whitespace().collect::<String>(),
            "AAAAAAAAABBBCcCcCcbbbBBBCcCcCcbbbBBBCcCcCcbbbaaaaaaaaa"
        );
    }

    #[test]
    fn parse_infers_size() {
        let shape = Shape::new(2, 4);
        let s = format(shape, &solved_stickers(shape));
        let (parsed, stickers) = parse(&s).unwrap();
        assert_eq!(parsed, shape);
        assert_eq!(stickers, solved_stickers(shape));
        assert_eq!(puzzle_n(&s), Ok(2));
        assert_eq!(puzzle_d(&s), Ok(4));
        assert!(is_solved(shape, &target_map(shape, &stickers).unwrap()));
    }

    #[test]
    fn parse_one_dimension() {
        let (shape, stickers) = parse("A a").unwrap();
        assert_eq!(shape, Shape::new(1, 1));
        assert_eq!(stickers.cells(), &[Some('A'), None, Some('a')]);
    }

    #[test]
    fn parse_rejects_bad_counts() {
        assert!(matches!(parse(""), Err(Error::InsanePuzzle(_))));
        assert!(matches!(parse("ABC"), Err(Error::InsanePuzzle(_))));
        // right length for 3^3 but one color short and one over
        let s = "AAAAAAAABBBBBBBBBBCCCCCCCCCaaaaaaaaabbbbbbbbbccccccccc";
        assert!(matches!(parse(s), Err(Error::InsanePuzzle(_))));
        // 6 colors of 5 stickers each isn't any n^3
        let s: String = "ABCabc".chars().flat_map(|c| std::iter::repeat(c).take(5)).collect();
        assert!(matches!(parse(&s), Err(Error::InsanePuzzle(_))));
    }

    #[test]
    fn size_limits() {
        assert!(checked_shape(3, 4).is_ok());
        assert_eq!(checked_shape(0, 3), Err(Error::TooBig { n: 0, d: 3 }));
        assert_eq!(checked_shape(3, 0), Err(Error::TooBig { n: 3, d: 0 }));
        assert_eq!(checked_shape(3, 13), Err(Error::TooBig { n: 3, d: 13 }));
    }

    #[test]
    fn reformat_copies_whitespace() {
        assert_eq!(reformat("abcdef", "xx x\nxxx").unwrap(), "ab c\ndef");
        assert_eq!(
            reformat("abc", "xx x x"),
            Err(Error::TemplateMismatch {
                expected: 4,
                found: 3
            })
        );
    }

    #[test]
    fn read_stops_at_the_end_of_a_puzzle() {
        let shape = Shape::new(3, 3);
        let text = format!("\n{}next puzzle\n", format(shape, &solved_stickers(shape)));
        let mut reader = text.as_bytes();
        let (read, stickers) = read_puzzle(&mut reader).unwrap();
        assert_eq!(read, shape);
        assert_eq!(stickers, solved_stickers(shape));
        assert_eq!(reader, b"next puzzle\n");
    }

    #[test]
    fn read_wont_take_one_word_for_a_puzzle() {
        assert!(matches!(
            read_puzzle("ABab".as_bytes()),
            Err(Error::InsanePuzzle(_))
        ));
        let (shape, _) = read_puzzle("AB ab\n".as_bytes()).unwrap();
        assert_eq!(shape, Shape::new(1, 2));
    }

    fn solved(n: usize, d: usize) -> (Shape, Stickers) {
        let shape = Shape::new(n, d);
        (shape, solved_stickers(shape))
    }

    #[test]
    fn names_use_negative_faces() {
        let (shape, stickers) = solved(3, 4);
        let twists = [
            Twist::new(0, -1, 1, -1, 2, -1, 1),
            Twist::new(3, 1, 2, -1, 0, -1, 0b110),
        ];
        assert_eq!(
            moves_to_string(shape, &stickers, &twists).unwrap(),
            "ABC dCA:6"
        );
    }

    #[test]
    fn reading_prefers_the_lower_letter_frame() {
        let (shape, stickers) = solved(3, 3);
        let twists = moves_from_string(shape, &stickers, "  aBC\tAbC:3 ").unwrap();
        assert_eq!(twists[0], Twist::new(0, 1, 1, -1, 2, -1, 1));
        // b is +y, so this twist takes +z to +y
        assert_eq!((twists[1].from_axis, twists[1].to_axis), (2, 1));
        assert_eq!(twists[1].slices, 3);
    }

    #[test]
    fn bad_moves() {
        let (shape, stickers) = solved(3, 3);
        for s in ["ABX", "AB", "ABCa", "AaB", "ABC:x", "ABC:1:2"] {
            assert_eq!(
                moves_from_string(shape, &stickers, s),
                Err(Error::BadMove(s.to_string())),
                "{s}"
            );
        }
        assert_eq!(moves_from_string(shape, &stickers, ""), Ok(vec![]));
    }

    #[test]
    fn middle_slice_moves_the_centers() {
        let (shape, stickers) = solved(3, 3);
        // turning the middle slice carries the B center to where C was
        let twists = moves_from_string(shape, &stickers, "ABC:2 ABC").unwrap();
        assert_eq!(twists[0].slices, 2);
        // B and C have swapped places up to sign, so this is the same face twist as plain ABC
        assert_eq!(twists[1], Twist::new(0, -1, 1, -1, 2, -1, 1));
        let named = moves_to_string(shape, &stickers, &twists).unwrap();
        assert_eq!(named, "ABC:2 AcB");
        assert_eq!(moves_from_string(shape, &stickers, &named).unwrap(), twists);
    }

    #[test]
    fn even_puzzles_keep_the_first_cubie() {
        let (shape, stickers) = solved(2, 3);
        let moves_it = Twist::new(0, -1, 1, -1, 2, -1, 1);
        assert!(matches!(
            moves_to_string(shape, &stickers, &[moves_it]),
            Err(Error::MovesFirstCubie(_))
        ));
        let twists = moves_from_string(shape, &stickers, "ABC aBC").unwrap();
        // after ABC the first cubie shows B on the z axis
        assert_eq!(twists[1].face_sign, 1);
        assert_eq!(twists[1].face_axis, 0);
        assert_eq!((twists[1].from_axis, twists[1].to_axis), (1, 2));
    }
}
