use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::scramble::{DEFAULT_PUZZLE, PuzzleId, ScrambleSpec, Scrambler};
use crate::store::json_store::JsonStore;
use crate::store::schema::QueueData;

/// Queue depth a refill generates up to.
pub const REFILL_TARGET: usize = 50;

/// Remaining-length threshold that schedules a background refill after a pop.
pub const LOW_WATER_MARK: usize = 10;

/// Batch generated synchronously when a pop finds the queue empty.
pub const EMERGENCY_BATCH: usize = 10;

// Extra attempts per scramble before the unit is dropped from the batch.
const UNIT_RETRIES: u32 = 2;

/// Completed generation work handed back to the control thread.
pub struct RefillBatch {
    pub puzzle: PuzzleId,
    pub scrambles: Vec<String>,
}

/// Per-puzzle cache of pre-generated scrambles.
///
/// All queue state lives on the control thread; worker threads are pure
/// producers that hand finished batches back over an mpsc channel, drained
/// by [`ScrambleSupply::pump`] once per event-loop tick. At most one
/// generation job is in flight per puzzle: the in-flight mark is set before
/// a worker spawns and cleared only when its batch is applied.
///
/// Consumption is LIFO: the most recently generated scramble is served
/// first. Scrambles are interchangeable, so only consistency matters;
/// tests assert this order.
pub struct ScrambleSupply {
    specs: Vec<ScrambleSpec>,
    queues: HashMap<PuzzleId, Vec<String>>,
    in_flight: HashSet<PuzzleId>,
    batch_tx: Sender<RefillBatch>,
    batch_rx: Receiver<RefillBatch>,
    store: JsonStore,
}

impl ScrambleSupply {
    pub fn new(specs: Vec<ScrambleSpec>, store: JsonStore) -> Self {
        let queues = store.load_queues().queues;
        let (batch_tx, batch_rx) = mpsc::channel();
        Self {
            specs,
            queues,
            in_flight: HashSet::new(),
            batch_tx,
            batch_rx,
            store,
        }
    }

    pub fn specs(&self) -> &[ScrambleSpec] {
        &self.specs
    }

    fn spec_for(&self, puzzle: &PuzzleId) -> Option<&ScrambleSpec> {
        self.specs.iter().find(|spec| spec.id() == puzzle)
    }

    /// Unknown ids are corrected to the default puzzle rather than refused.
    pub fn normalize(&self, puzzle: &PuzzleId) -> PuzzleId {
        if self.spec_for(puzzle).is_some() {
            puzzle.clone()
        } else {
            PuzzleId::new(DEFAULT_PUZZLE)
        }
    }

    pub fn queue_len(&self, puzzle: &PuzzleId) -> usize {
        self.queues.get(puzzle).map_or(0, Vec::len)
    }

    pub fn is_generating(&self, puzzle: &PuzzleId) -> bool {
        self.in_flight.contains(puzzle)
    }

    /// True on first run, before any queue map has ever been persisted.
    pub fn bootstrap_needed(&self) -> bool {
        !self.store.has_queue_data()
    }

    /// First-run bootstrap: one worker fills every registered puzzle to the
    /// target depth, handing each queue back as soon as it is generated.
    /// The control thread keeps ticking; the UI shows a generating state
    /// until the active puzzle's batch lands.
    pub fn start_bootstrap(&mut self) {
        let jobs: Vec<(PuzzleId, Arc<dyn Scrambler>)> = self
            .specs
            .iter()
            .filter(|spec| !self.in_flight.contains(spec.id()) && self.queue_len(spec.id()) == 0)
            .map(|spec| (spec.id().clone(), spec.scrambler()))
            .collect();

        for (puzzle, _) in &jobs {
            self.in_flight.insert(puzzle.clone());
        }

        let tx = self.batch_tx.clone();
        thread::spawn(move || {
            let mut rng = SmallRng::from_entropy();
            for (puzzle, scrambler) in jobs {
                let scrambles = generate_batch(scrambler.as_ref(), REFILL_TARGET, &mut rng);
                if tx.send(RefillBatch { puzzle, scrambles }).is_err() {
                    return;
                }
            }
        });
    }

    /// Pops the next scramble. An empty queue is refilled synchronously
    /// with a small batch first; this is the one place generation may
    /// block the caller, everything else goes through background workers.
    /// A pop below the low-water mark schedules an asynchronous refill.
    pub fn current_scramble(&mut self, puzzle: &PuzzleId) -> String {
        let puzzle = self.normalize(puzzle);
        if self.queue_len(&puzzle) == 0 {
            self.emergency_refill(&puzzle);
        }

        let scramble = self
            .queues
            .get_mut(&puzzle)
            .and_then(Vec::pop)
            .unwrap_or_default();
        self.persist();

        if self.queue_len(&puzzle) < LOW_WATER_MARK {
            self.request_refill(&puzzle, REFILL_TARGET);
        }
        scramble
    }

    /// Spawns a background refill unless one is already in flight for this
    /// puzzle (single-flight: the second request is a silent no-op). An
    /// unregistered id is likewise a no-op.
    pub fn request_refill(&mut self, puzzle: &PuzzleId, target: usize) {
        let scrambler = match self.spec_for(puzzle) {
            Some(spec) => spec.scrambler(),
            None => return,
        };
        if !self.in_flight.insert(puzzle.clone()) {
            return;
        }

        let tx = self.batch_tx.clone();
        let puzzle = puzzle.clone();
        thread::spawn(move || {
            let mut rng = SmallRng::from_entropy();
            let scrambles = generate_batch(scrambler.as_ref(), target, &mut rng);
            let _ = tx.send(RefillBatch { puzzle, scrambles });
        });
    }

    /// Swaps the active puzzle: normalizes the id and, when its queue is
    /// empty, requests a full refill so the UI can show a generating state.
    pub fn switch_puzzle(&mut self, puzzle: &PuzzleId) -> PuzzleId {
        let puzzle = self.normalize(puzzle);
        if self.queue_len(&puzzle) == 0 {
            self.request_refill(&puzzle, REFILL_TARGET);
        }
        puzzle
    }

    /// Drains completed batches into the queues. Called from the control
    /// thread every tick; this is the only place worker output touches
    /// shared state. Returns the puzzles that received scrambles so the
    /// caller can replace a waiting placeholder.
    pub fn pump(&mut self) -> Vec<PuzzleId> {
        let mut refilled = Vec::new();
        while let Ok(batch) = self.batch_rx.try_recv() {
            self.in_flight.remove(&batch.puzzle);
            self.queues
                .entry(batch.puzzle.clone())
                .or_default()
                .extend(batch.scrambles);
            refilled.push(batch.puzzle);
        }
        if !refilled.is_empty() {
            self.persist();
        }
        refilled
    }

    fn emergency_refill(&mut self, puzzle: &PuzzleId) {
        let scrambler = match self.spec_for(puzzle) {
            Some(spec) => spec.scrambler(),
            None => return,
        };
        let mut rng = SmallRng::from_entropy();
        let batch = generate_batch(scrambler.as_ref(), EMERGENCY_BATCH, &mut rng);
        self.queues.entry(puzzle.clone()).or_default().extend(batch);
    }

    fn persist(&self) {
        let data = QueueData {
            queues: self.queues.clone(),
            ..QueueData::default()
        };
        let _ = self.store.save_queues(&data);
    }
}

/// Generates up to `count` scrambles. A failed unit is retried a bounded
/// number of times and then dropped, shrinking the batch instead of
/// aborting it.
pub fn generate_batch(scrambler: &dyn Scrambler, count: usize, rng: &mut SmallRng) -> Vec<String> {
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let mut attempts = 0;
        loop {
            match scrambler.scramble(rng) {
                Ok(scramble) => {
                    out.push(scramble);
                    break;
                }
                Err(_) if attempts < UNIT_RETRIES => attempts += 1,
                Err(_) => break,
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    use crate::scramble::{PuzzleKind, ScrambleError};
    use tempfile::TempDir;

    struct CountingScrambler {
        calls: Arc<AtomicUsize>,
    }

    impl Scrambler for CountingScrambler {
        fn scramble(&self, _rng: &mut SmallRng) -> Result<String, ScrambleError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("scramble {n}"))
        }
    }

    struct FlakyScrambler {
        calls: Arc<AtomicUsize>,
        fail_every: usize,
    }

    impl Scrambler for FlakyScrambler {
        fn scramble(&self, _rng: &mut SmallRng) -> Result<String, ScrambleError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % self.fail_every == 0 {
                Err(ScrambleError::ConstraintsUnsatisfied { attempts: 1 })
            } else {
                Ok(format!("scramble {n}"))
            }
        }
    }

    fn counted_spec(id: &str) -> (ScrambleSpec, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let spec = ScrambleSpec::new(
            id,
            PuzzleKind::Wca,
            Arc::new(CountingScrambler {
                calls: Arc::clone(&calls),
            }),
        );
        (spec, calls)
    }

    fn make_supply(specs: Vec<ScrambleSpec>) -> (TempDir, ScrambleSupply) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, ScrambleSupply::new(specs, store))
    }

    /// Pump until `done` holds or the deadline passes.
    fn pump_until(supply: &mut ScrambleSupply, done: impl Fn(&ScrambleSupply) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done(supply) {
            assert!(Instant::now() < deadline, "timed out waiting for refill");
            supply.pump();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn pop_on_empty_queue_never_fails() {
        let (spec, _calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);

        let scramble = supply.current_scramble(&PuzzleId::new("3x3x3"));
        assert!(!scramble.is_empty());
        // Emergency batch of 10 minus the pop.
        assert_eq!(supply.queue_len(&PuzzleId::new("3x3x3")), EMERGENCY_BATCH - 1);
    }

    #[test]
    fn pop_below_low_water_schedules_one_refill_to_target() {
        let (spec, calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);
        let id = PuzzleId::new("3x3x3");

        supply.current_scramble(&id);
        assert!(supply.is_generating(&id));

        pump_until(&mut supply, |s| !s.is_generating(&id));
        assert_eq!(
            supply.queue_len(&id),
            EMERGENCY_BATCH - 1 + REFILL_TARGET
        );
        assert_eq!(calls.load(Ordering::SeqCst), EMERGENCY_BATCH + REFILL_TARGET);
    }

    #[test]
    fn consumption_is_lifo() {
        let (spec, _calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);
        let id = PuzzleId::new("3x3x3");
        supply.queues.insert(
            id.clone(),
            vec!["first".into(), "second".into(), "third".into()],
        );

        assert_eq!(supply.current_scramble(&id), "third");
        assert_eq!(supply.current_scramble(&id), "second");
        assert_eq!(supply.current_scramble(&id), "first");
    }

    #[test]
    fn double_refill_request_is_single_flight() {
        let (spec, calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);
        let id = PuzzleId::new("3x3x3");

        supply.request_refill(&id, 5);
        supply.request_refill(&id, 5);
        assert!(supply.is_generating(&id));

        pump_until(&mut supply, |s| !s.is_generating(&id));
        // One worker ran, not two.
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(supply.queue_len(&id), 5);
    }

    #[test]
    fn refill_allowed_again_after_completion() {
        let (spec, calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);
        let id = PuzzleId::new("3x3x3");

        supply.request_refill(&id, 3);
        pump_until(&mut supply, |s| !s.is_generating(&id));
        supply.request_refill(&id, 3);
        pump_until(&mut supply, |s| !s.is_generating(&id));

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(supply.queue_len(&id), 6);
    }

    #[test]
    fn refills_for_different_puzzles_run_independently() {
        let (a, _) = counted_spec("3x3x3");
        let (b, _) = counted_spec("Skewb");
        let (_dir, mut supply) = make_supply(vec![a, b]);
        let cube = PuzzleId::new("3x3x3");
        let skewb = PuzzleId::new("Skewb");

        supply.request_refill(&cube, 4);
        supply.request_refill(&skewb, 4);
        assert!(supply.is_generating(&cube));
        assert!(supply.is_generating(&skewb));

        pump_until(&mut supply, |s| {
            !s.is_generating(&cube) && !s.is_generating(&skewb)
        });
        assert_eq!(supply.queue_len(&cube), 4);
        assert_eq!(supply.queue_len(&skewb), 4);
    }

    #[test]
    fn unknown_puzzle_refill_is_a_noop() {
        let (spec, calls) = counted_spec("3x3x3");
        let (_dir, mut supply) = make_supply(vec![spec]);

        supply.request_refill(&PuzzleId::new("12x12x12"), 5);
        assert!(!supply.is_generating(&PuzzleId::new("12x12x12")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unknown_puzzle_pop_falls_back_to_default() {
        let (spec, _calls) = counted_spec(DEFAULT_PUZZLE);
        let (_dir, mut supply) = make_supply(vec![spec]);

        let scramble = supply.current_scramble(&PuzzleId::new("12x12x12"));
        assert!(!scramble.is_empty());
        assert!(supply.queue_len(&PuzzleId::new(DEFAULT_PUZZLE)) > 0);
    }

    #[test]
    fn switch_to_empty_puzzle_triggers_refill() {
        let (spec, _calls) = counted_spec("Megaminx");
        let (_dir, mut supply) = make_supply(vec![spec]);

        let active = supply.switch_puzzle(&PuzzleId::new("Megaminx"));
        assert_eq!(active.as_str(), "Megaminx");
        assert!(supply.is_generating(&active));

        pump_until(&mut supply, |s| !s.is_generating(&active));
        assert_eq!(supply.queue_len(&active), REFILL_TARGET);
    }

    #[test]
    fn failed_unit_is_retried_and_batch_stays_full() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scrambler = FlakyScrambler {
            calls: Arc::clone(&calls),
            // Fails on call 0 only; the retry succeeds, so the batch stays
            // full despite the failure.
            fail_every: 1000,
        };
        let mut rng = SmallRng::seed_from_u64(1);
        let batch = generate_batch(&scrambler, 5, &mut rng);
        assert_eq!(batch.len(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn always_failing_generator_yields_empty_batch() {
        struct AlwaysFails;
        impl Scrambler for AlwaysFails {
            fn scramble(&self, _rng: &mut SmallRng) -> Result<String, ScrambleError> {
                Err(ScrambleError::ConstraintsUnsatisfied { attempts: 1 })
            }
        }
        let mut rng = SmallRng::seed_from_u64(1);
        let batch = generate_batch(&AlwaysFails, 3, &mut rng);
        assert!(batch.is_empty());
    }

    #[test]
    fn refill_completion_persists_the_queue_map() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let (spec, _calls) = counted_spec("3x3x3");
        let id = PuzzleId::new("3x3x3");

        let mut supply = ScrambleSupply::new(vec![spec.clone()], store.clone());
        supply.request_refill(&id, 7);
        pump_until(&mut supply, |s| !s.is_generating(&id));

        let reloaded = ScrambleSupply::new(vec![spec], store);
        assert_eq!(reloaded.queue_len(&id), 7);
    }
}
