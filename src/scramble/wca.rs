use rand::Rng;
use rand::rngs::SmallRng;

use crate::scramble::{ScrambleError, Scrambler};

const FACES: [char; 6] = ['U', 'D', 'L', 'R', 'F', 'B'];
const SUFFIXES: [&str; 3] = ["", "'", "2"];

fn axis(face_index: usize) -> usize {
    face_index / 2
}

/// Random-move scrambler for NxNxN cubes. Rejects a face when it repeats
/// the previous move's face, or when the previous two moves already share
/// its axis (U D U is fine, U D D' is not reachable, U U' never appears).
pub struct FaceTurnScrambler {
    size: u8,
    move_count: usize,
}

impl FaceTurnScrambler {
    pub fn new(size: u8, move_count: usize) -> Self {
        Self { size, move_count }
    }

    fn format_move(&self, face_index: usize, depth: u8, rng: &mut SmallRng) -> String {
        let face = FACES[face_index];
        let suffix = SUFFIXES[rng.gen_range(0..SUFFIXES.len())];
        match depth {
            0 | 1 => format!("{face}{suffix}"),
            2 => format!("{face}w{suffix}"),
            d => format!("{d}{face}w{suffix}"),
        }
    }
}

impl Scrambler for FaceTurnScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        let max_depth = (self.size / 2).max(1);
        let mut moves = Vec::with_capacity(self.move_count);
        let mut last_face: Option<usize> = None;
        let mut second_last_face: Option<usize> = None;

        while moves.len() < self.move_count {
            let face_index = rng.gen_range(0..FACES.len());
            if Some(face_index) == last_face {
                continue;
            }
            if let (Some(a), Some(b)) = (last_face, second_last_face) {
                if axis(a) == axis(face_index) && axis(b) == axis(face_index) {
                    continue;
                }
            }
            let depth = if self.size > 3 {
                rng.gen_range(1..=max_depth)
            } else {
                1
            };
            moves.push(self.format_move(face_index, depth, rng));
            second_last_face = last_face;
            last_face = Some(face_index);
        }

        Ok(moves.join(" "))
    }
}

/// Pyraminx: main layer moves followed by random tip twists.
pub struct PyraminxScrambler {
    move_count: usize,
}

impl PyraminxScrambler {
    pub fn new(move_count: usize) -> Self {
        Self { move_count }
    }
}

impl Scrambler for PyraminxScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        const CORNERS: [char; 4] = ['U', 'L', 'R', 'B'];
        let mut moves = Vec::with_capacity(self.move_count + 4);
        let mut last: Option<usize> = None;

        while moves.len() < self.move_count {
            let i = rng.gen_range(0..CORNERS.len());
            if Some(i) == last {
                continue;
            }
            let suffix = if rng.gen_bool(0.5) { "'" } else { "" };
            moves.push(format!("{}{}", CORNERS[i], suffix));
            last = Some(i);
        }

        for tip in ['u', 'l', 'r', 'b'] {
            if rng.gen_bool(0.5) {
                let suffix = if rng.gen_bool(0.5) { "'" } else { "" };
                moves.push(format!("{tip}{suffix}"));
            }
        }

        Ok(moves.join(" "))
    }
}

/// Skewb: corner turns, no face repeated back to back.
pub struct SkewbScrambler {
    move_count: usize,
}

impl SkewbScrambler {
    pub fn new(move_count: usize) -> Self {
        Self { move_count }
    }
}

impl Scrambler for SkewbScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        const CORNERS: [char; 4] = ['U', 'L', 'R', 'B'];
        let mut moves = Vec::with_capacity(self.move_count);
        let mut last: Option<usize> = None;

        while moves.len() < self.move_count {
            let i = rng.gen_range(0..CORNERS.len());
            if Some(i) == last {
                continue;
            }
            let suffix = if rng.gen_bool(0.5) { "'" } else { "" };
            moves.push(format!("{}{}", CORNERS[i], suffix));
            last = Some(i);
        }

        Ok(moves.join(" "))
    }
}

/// Megaminx in WCA R++/D-- notation: `rows` lines of `row_len` alternating
/// R/D double turns, each line closed by a U move.
pub struct MegaminxScrambler {
    rows: usize,
    row_len: usize,
}

impl MegaminxScrambler {
    pub fn new(rows: usize, row_len: usize) -> Self {
        Self { rows, row_len }
    }
}

impl Scrambler for MegaminxScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        let mut lines = Vec::with_capacity(self.rows);
        for _ in 0..self.rows {
            let mut row = Vec::with_capacity(self.row_len + 1);
            for i in 0..self.row_len {
                let face = if i % 2 == 0 { 'R' } else { 'D' };
                let dir = if rng.gen_bool(0.5) { "++" } else { "--" };
                row.push(format!("{face}{dir}"));
            }
            row.push(if rng.gen_bool(0.5) { "U".to_string() } else { "U'".to_string() });
            lines.push(row.join(" "));
        }
        Ok(lines.join("\n"))
    }
}

/// Square-1 in (top,bottom)/slice notation. The twist metric counts each
/// (a,b)/ group as one move; the face-turn metric counts individual layer
/// turns, so the same struct drives both with different group counts.
pub struct SquareOneScrambler {
    groups: usize,
}

impl SquareOneScrambler {
    pub fn twist_metric(groups: usize) -> Self {
        Self { groups }
    }

    pub fn face_turn_metric(turns: usize) -> Self {
        // Each group is two layer turns plus a slice.
        Self { groups: turns.div_ceil(3).max(1) }
    }
}

impl Scrambler for SquareOneScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        let mut parts = Vec::with_capacity(self.groups);
        for _ in 0..self.groups {
            let (top, bottom) = loop {
                let top: i8 = rng.gen_range(-5..=6);
                let bottom: i8 = rng.gen_range(-5..=6);
                if top != 0 || bottom != 0 {
                    break (top, bottom);
                }
            };
            parts.push(format!("({top},{bottom})/"));
        }
        Ok(parts.join(" "))
    }
}

/// Clock: nine dial moves, a y2, then five back-face dials, WCA style.
pub struct ClockScrambler;

impl Scrambler for ClockScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        const FRONT: [&str; 9] = ["UR", "DR", "DL", "UL", "U", "R", "D", "L", "ALL"];
        const BACK: [&str; 5] = ["U", "R", "D", "L", "ALL"];

        let dial = |pin: &str, rng: &mut SmallRng| {
            let amount: u8 = rng.gen_range(0..=6);
            let sign = if rng.gen_bool(0.5) { '+' } else { '-' };
            format!("{pin}{amount}{sign}")
        };

        let mut moves: Vec<String> = FRONT.iter().map(|p| dial(p, rng)).collect();
        moves.push("y2".to_string());
        moves.extend(BACK.iter().map(|p| dial(p, rng)));
        Ok(moves.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use regex::Regex;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn three_by_three_has_exact_move_count() {
        let scrambler = FaceTurnScrambler::new(3, 20);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        assert_eq!(scramble.split_whitespace().count(), 20);
    }

    #[test]
    fn three_by_three_moves_match_notation() {
        let pattern = Regex::new(r"^[UDLRFB]['2]?$").unwrap();
        let scrambler = FaceTurnScrambler::new(3, 20);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        for mv in scramble.split_whitespace() {
            assert!(pattern.is_match(mv), "unexpected move {mv:?}");
        }
    }

    #[test]
    fn no_consecutive_same_face() {
        let scrambler = FaceTurnScrambler::new(3, 100);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        let faces: Vec<char> = scramble
            .split_whitespace()
            .map(|m| m.chars().next().unwrap())
            .collect();
        for pair in faces.windows(2) {
            assert_ne!(pair[0], pair[1], "same face twice in a row: {scramble}");
        }
    }

    #[test]
    fn big_cube_uses_wide_moves() {
        let pattern = Regex::new(r"^[23]?[UDLRFB]w?['2]?$").unwrap();
        let scrambler = FaceTurnScrambler::new(6, 80);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        assert_eq!(scramble.split_whitespace().count(), 80);
        for mv in scramble.split_whitespace() {
            assert!(pattern.is_match(mv), "unexpected move {mv:?}");
        }
        assert!(scramble.contains('w'), "80 moves on 6x6x6 with no wide turn");
    }

    #[test]
    fn megaminx_rows_end_with_u() {
        let scrambler = MegaminxScrambler::new(7, 10);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        let lines: Vec<&str> = scramble.lines().collect();
        assert_eq!(lines.len(), 7);
        for line in lines {
            assert_eq!(line.split_whitespace().count(), 11);
            let last = line.split_whitespace().last().unwrap();
            assert!(last == "U" || last == "U'");
        }
    }

    #[test]
    fn square_one_groups_are_never_zero_zero() {
        let scrambler = SquareOneScrambler::twist_metric(50);
        let scramble = scrambler.scramble(&mut rng()).unwrap();
        assert!(!scramble.contains("(0,0)"));
    }

    #[test]
    fn clock_has_y2_pivot() {
        let scramble = ClockScrambler.scramble(&mut rng()).unwrap();
        assert_eq!(scramble.split_whitespace().count(), 15);
        assert!(scramble.contains("y2"));
    }
}
