use rand::Rng;
use rand::rngs::SmallRng;

use crate::scramble::{ScrambleError, Scrambler};

const SUFFIXES: [&str; 3] = ["", "'", "2"];

// Bounded rejection sampling: with a pool of at least two families a draw
// practically never exhausts this, but a degenerate pool must fail instead
// of spinning.
const MAX_DRAW_ATTEMPTS: u32 = 32;

/// Trainer drills restrict the move pool (e.g. last-layer cases use R U F,
/// last-slice-last-layer uses M U) and scramble only within it. Consecutive
/// moves never reuse a family.
pub struct SubsetScrambler {
    pool: Vec<&'static str>,
    move_count: usize,
}

impl SubsetScrambler {
    pub fn new(pool: &[&'static str], move_count: usize) -> Self {
        Self {
            pool: pool.to_vec(),
            move_count,
        }
    }
}

impl Scrambler for SubsetScrambler {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError> {
        let mut moves = Vec::with_capacity(self.move_count);
        let mut last: Option<usize> = None;

        for _ in 0..self.move_count {
            let mut attempts = 0;
            let family = loop {
                let i = rng.gen_range(0..self.pool.len());
                if Some(i) != last {
                    break i;
                }
                attempts += 1;
                if attempts >= MAX_DRAW_ATTEMPTS {
                    return Err(ScrambleError::ConstraintsUnsatisfied { attempts });
                }
            };
            let suffix = SUFFIXES[rng.gen_range(0..SUFFIXES.len())];
            moves.push(format!("{}{}", self.pool[family], suffix));
            last = Some(family);
        }

        Ok(moves.join(" "))
    }
}
