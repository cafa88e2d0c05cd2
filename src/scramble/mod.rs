pub mod trainer;
pub mod wca;

use std::fmt;
use std::sync::Arc;

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::trainer::SubsetScrambler;
use self::wca::{ClockScrambler, FaceTurnScrambler, MegaminxScrambler, PyraminxScrambler,
                SkewbScrambler, SquareOneScrambler};

/// Puzzle id every store key and queue is keyed by. Opaque; the registry
/// defines the known set.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PuzzleId(String);

impl PuzzleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PuzzleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

pub const DEFAULT_PUZZLE: &str = "3x3x3";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PuzzleKind {
    Wca,
    Trainer,
}

#[derive(Clone, Debug, Error)]
pub enum ScrambleError {
    #[error("no move sequence satisfied the constraints after {attempts} attempts")]
    ConstraintsUnsatisfied { attempts: u32 },
}

/// Generator capability. Pure with respect to external state; a failure is
/// retryable per unit (the supply retries, then shrinks the batch).
pub trait Scrambler: Send + Sync {
    fn scramble(&self, rng: &mut SmallRng) -> Result<String, ScrambleError>;
}

/// Per-puzzle registration: id, selector grouping, and the generator with
/// its fixed parameters baked in.
#[derive(Clone)]
pub struct ScrambleSpec {
    id: PuzzleId,
    kind: PuzzleKind,
    scrambler: Arc<dyn Scrambler>,
}

impl ScrambleSpec {
    pub fn new(id: impl Into<String>, kind: PuzzleKind, scrambler: Arc<dyn Scrambler>) -> Self {
        Self {
            id: PuzzleId::new(id),
            kind,
            scrambler,
        }
    }

    pub fn id(&self) -> &PuzzleId {
        &self.id
    }

    pub fn kind(&self) -> PuzzleKind {
        self.kind
    }

    pub fn scrambler(&self) -> Arc<dyn Scrambler> {
        Arc::clone(&self.scrambler)
    }
}

fn event(id: &str, scrambler: impl Scrambler + 'static) -> ScrambleSpec {
    ScrambleSpec::new(id, PuzzleKind::Wca, Arc::new(scrambler))
}

fn drill(id: &str, scrambler: impl Scrambler + 'static) -> ScrambleSpec {
    ScrambleSpec::new(id, PuzzleKind::Trainer, Arc::new(scrambler))
}

/// The static registry: WCA events first, then the trainer drills.
/// Queue depth and batch size are identical for both groups.
pub fn registry() -> Vec<ScrambleSpec> {
    vec![
        event("2x2x2", FaceTurnScrambler::new(2, 9)),
        event("3x3x3", FaceTurnScrambler::new(3, 20)),
        event("4x4x4", FaceTurnScrambler::new(4, 40)),
        event("5x5x5", FaceTurnScrambler::new(5, 60)),
        event("6x6x6", FaceTurnScrambler::new(6, 80)),
        event("7x7x7", FaceTurnScrambler::new(7, 100)),
        event("Pyraminx", PyraminxScrambler::new(8)),
        event("Megaminx", MegaminxScrambler::new(7, 10)),
        event("Square-1", SquareOneScrambler::twist_metric(12)),
        event("Skewb", SkewbScrambler::new(9)),
        event("Clock", ClockScrambler),
        drill("3x3x3 3BLD", FaceTurnScrambler::new(3, 20)),
        drill("3x3x3 Edges", SubsetScrambler::new(&["M", "E", "S", "U", "D"], 16)),
        drill("3x3x3 Corners", SubsetScrambler::new(&["U", "D", "L", "R", "F", "B"], 12)),
        drill("3x3x3 LL", SubsetScrambler::new(&["R", "U", "F"], 14)),
        drill("3x3x3 F2L", SubsetScrambler::new(&["R", "U", "F", "D"], 14)),
        drill("3x3x3 Cross (Easy)", FaceTurnScrambler::new(3, 4)),
        drill("3x3x3 Cross (Difficult)", FaceTurnScrambler::new(3, 8)),
        drill("3x3x3 LSLL", SubsetScrambler::new(&["R", "U", "F"], 12)),
        drill("3x3x3 ZBLL", SubsetScrambler::new(&["R", "U", "L"], 14)),
        drill("3x3x3 ZZLL", SubsetScrambler::new(&["R", "U", "L"], 12)),
        drill("3x3x3 ZBLS", SubsetScrambler::new(&["R", "U", "F"], 10)),
        drill("3x3x3 LSE", SubsetScrambler::new(&["M", "U"], 16)),
        drill("3x3x3 CMLL", SubsetScrambler::new(&["R", "U", "F"], 12)),
        drill("3x3x3 CLL", SubsetScrambler::new(&["R", "U", "F"], 10)),
        drill("3x3x3 ELL", SubsetScrambler::new(&["M", "U"], 12)),
        drill("3x3x3 EO Line", SubsetScrambler::new(&["R", "U", "F", "L", "D"], 12)),
        drill("4x4x4 Edges", SubsetScrambler::new(&["Uw", "Dw", "Rw", "Lw", "U", "R"], 8)),
        drill("5x5x5 Edges", SubsetScrambler::new(&["Uw", "Dw", "Rw", "Lw", "U", "R"], 8)),
        drill("6x6x6 Edges", SubsetScrambler::new(&["Uw", "Dw", "Rw", "Lw", "U", "R"], 8)),
        drill("7x7x7 Edges", SubsetScrambler::new(&["Uw", "Dw", "Rw", "Lw", "U", "R"], 8)),
        drill("Square-1 Face Turn Metric", SquareOneScrambler::face_turn_metric(40)),
        drill("Square-1 Twist Metric", SquareOneScrambler::twist_metric(20)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn registry_ids_are_unique() {
        let specs = registry();
        let mut seen = std::collections::HashSet::new();
        for spec in &specs {
            assert!(seen.insert(spec.id().clone()), "duplicate id {}", spec.id());
        }
    }

    #[test]
    fn registry_contains_default_puzzle() {
        assert!(registry().iter().any(|s| s.id().as_str() == DEFAULT_PUZZLE));
    }

    #[test]
    fn every_registered_scrambler_produces_output() {
        let mut rng = SmallRng::seed_from_u64(7);
        for spec in registry() {
            let scramble = spec.scrambler().scramble(&mut rng).unwrap();
            assert!(!scramble.is_empty(), "{} produced an empty scramble", spec.id());
        }
    }

    #[test]
    fn puzzle_id_serializes_transparently() {
        let id = PuzzleId::new("3x3x3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"3x3x3\"");
        let back: PuzzleId = serde_json::from_str("\"Megaminx\"").unwrap();
        assert_eq!(back.as_str(), "Megaminx");
    }
}
