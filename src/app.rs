use std::time::{Duration, Instant};

use crate::config::Config;
use crate::scramble::{PuzzleId, registry};
use crate::session::stats::format_time;
use crate::session::{SolveHistory, SolveRecord};
use crate::store::json_store::JsonStore;
use crate::store::schema::SessionData;
use crate::supply::{REFILL_TARGET, ScrambleSupply};
use crate::ui::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    Timer,
    Stats,
    PuzzleSelect,
    Settings,
}

/// What a pending history reset will clear once confirmed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetScope {
    Current,
    All,
}

/// Hold-to-start timer state machine. Space down begins a hold; a tick
/// promotes it to Armed once the threshold passes; releasing while Armed
/// starts the clock; space down while Running stops it and records the
/// solve. Terminals without key Release events fall back to
/// press-to-start / press-to-stop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimerPhase {
    Idle,
    Holding { since: Instant },
    Armed,
    Running { started: Instant },
    Finished { elapsed: f64 },
}

pub struct App {
    pub screen: AppScreen,
    pub phase: TimerPhase,
    pub current_puzzle: PuzzleId,
    pub current_scramble: String,
    /// Waiting on a background batch for the active puzzle; the scramble
    /// line shows a placeholder until `on_tick` sees the batch land.
    pub generating: bool,
    pub supply: ScrambleSupply,
    pub history: SolveHistory,
    pub config: Config,
    pub theme: &'static Theme,
    pub store: JsonStore,
    pub keyboard_enhanced: bool,
    pub selector_index: usize,
    pub settings_selected: usize,
    pub pending_reset: Option<ResetScope>,
    pub should_quit: bool,
}

impl App {
    pub fn new(mut config: Config, store: JsonStore) -> Self {
        let supply = ScrambleSupply::new(registry(), store.clone());
        {
            let known: Vec<&str> = supply.specs().iter().map(|s| s.id().as_str()).collect();
            config.normalize(&known);
        }

        let loaded_theme = Theme::load(&config.theme).unwrap_or_default();
        let theme: &'static Theme = Box::leak(Box::new(loaded_theme));

        let history = SolveHistory::load(store.clone());
        let session = store.load_session();
        let current_puzzle = supply.normalize(&session.current_puzzle);

        let mut app = Self {
            screen: AppScreen::Timer,
            phase: TimerPhase::Idle,
            current_puzzle,
            current_scramble: String::new(),
            generating: false,
            supply,
            history,
            config,
            theme,
            store,
            keyboard_enhanced: false,
            selector_index: 0,
            settings_selected: 0,
            pending_reset: None,
            should_quit: false,
        };

        if app.supply.bootstrap_needed() {
            app.supply.start_bootstrap();
            app.generating = true;
        } else if app.supply.queue_len(&app.current_puzzle) == 0 {
            app.supply.request_refill(&app.current_puzzle, REFILL_TARGET);
            app.generating = true;
        } else {
            app.next_scramble();
        }
        app
    }

    /// One control-loop tick: drain completed generation batches, replace a
    /// pending scramble placeholder, and advance the hold gesture.
    pub fn on_tick(&mut self) {
        self.supply.pump();
        if self.generating && self.supply.queue_len(&self.current_puzzle) > 0 {
            self.next_scramble();
        }

        if let TimerPhase::Holding { since } = self.phase {
            if since.elapsed() >= Duration::from_millis(self.config.hold_ms) {
                self.phase = TimerPhase::Armed;
            }
        }
    }

    pub fn space_pressed(&mut self) {
        match self.phase {
            TimerPhase::Running { started } => self.finish_solve(started),
            TimerPhase::Idle | TimerPhase::Finished { .. } => {
                if self.generating {
                    return;
                }
                if self.keyboard_enhanced {
                    self.phase = TimerPhase::Holding {
                        since: Instant::now(),
                    };
                } else {
                    self.phase = TimerPhase::Running {
                        started: Instant::now(),
                    };
                }
            }
            TimerPhase::Holding { .. } | TimerPhase::Armed => {}
        }
    }

    pub fn space_released(&mut self) {
        match self.phase {
            TimerPhase::Armed => {
                self.phase = TimerPhase::Running {
                    started: Instant::now(),
                }
            }
            TimerPhase::Holding { .. } => self.phase = TimerPhase::Idle,
            _ => {}
        }
    }

    fn finish_solve(&mut self, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();
        self.history.append(
            &self.current_puzzle,
            SolveRecord::new(elapsed, self.current_scramble.clone()),
        );
        self.phase = TimerPhase::Finished { elapsed };
        self.next_scramble();
    }

    fn next_scramble(&mut self) {
        self.current_scramble = self.supply.current_scramble(&self.current_puzzle);
        self.generating = false;
    }

    pub fn switch_puzzle(&mut self, puzzle: &PuzzleId) {
        if matches!(self.phase, TimerPhase::Running { .. }) {
            return;
        }
        self.current_puzzle = self.supply.switch_puzzle(puzzle);
        self.persist_session();
        self.phase = TimerPhase::Idle;
        if self.supply.queue_len(&self.current_puzzle) > 0 {
            self.next_scramble();
        } else {
            self.current_scramble.clear();
            self.generating = true;
        }
        self.screen = AppScreen::Timer;
    }

    pub fn delete_last_solve(&mut self) {
        if self.history.delete_last(&self.current_puzzle).is_some() {
            self.phase = match self.history.last(&self.current_puzzle) {
                Some(record) => TimerPhase::Finished {
                    elapsed: record.elapsed_secs,
                },
                None => TimerPhase::Idle,
            };
        }
    }

    pub fn reset_current(&mut self) {
        let puzzle = self.current_puzzle.clone();
        self.history.reset(&puzzle);
        self.phase = TimerPhase::Idle;
        if !self.generating {
            self.next_scramble();
        }
        self.screen = AppScreen::Timer;
    }

    pub fn reset_all(&mut self) {
        self.history.reset_all();
        self.phase = TimerPhase::Idle;
        if !self.generating {
            self.next_scramble();
        }
        self.screen = AppScreen::Timer;
    }

    fn persist_session(&self) {
        let _ = self.store.save_session(&SessionData {
            current_puzzle: self.current_puzzle.clone(),
            ..SessionData::default()
        });
    }

    pub fn go_to_timer(&mut self) {
        self.screen = AppScreen::Timer;
    }

    pub fn go_to_stats(&mut self) {
        self.pending_reset = None;
        self.screen = AppScreen::Stats;
    }

    pub fn go_to_puzzle_select(&mut self) {
        self.selector_index = self
            .supply
            .specs()
            .iter()
            .position(|s| s.id() == &self.current_puzzle)
            .unwrap_or(0);
        self.screen = AppScreen::PuzzleSelect;
    }

    pub fn go_to_settings(&mut self) {
        self.settings_selected = 0;
        self.screen = AppScreen::Settings;
    }

    pub fn selector_next(&mut self) {
        let len = self.supply.specs().len();
        if len > 0 {
            self.selector_index = (self.selector_index + 1) % len;
        }
    }

    pub fn selector_prev(&mut self) {
        let len = self.supply.specs().len();
        if len > 0 {
            self.selector_index = (self.selector_index + len - 1) % len;
        }
    }

    pub fn selector_confirm(&mut self) {
        if let Some(spec) = self.supply.specs().get(self.selector_index) {
            let id = spec.id().clone();
            self.switch_puzzle(&id);
        }
    }

    pub fn settings_cycle_forward(&mut self) {
        match self.settings_selected {
            0 => {
                let themes = Theme::available_themes();
                if let Some(idx) = themes.iter().position(|t| *t == self.config.theme) {
                    self.config.theme = themes[(idx + 1) % themes.len()].clone();
                } else if let Some(first) = themes.first() {
                    self.config.theme = first.clone();
                }
                self.reload_theme();
            }
            1 => self.config.hold_ms = (self.config.hold_ms + 50).min(2000),
            _ => {}
        }
    }

    pub fn settings_cycle_backward(&mut self) {
        match self.settings_selected {
            0 => {
                let themes = Theme::available_themes();
                if let Some(idx) = themes.iter().position(|t| *t == self.config.theme) {
                    let prev = if idx == 0 { themes.len() - 1 } else { idx - 1 };
                    self.config.theme = themes[prev].clone();
                } else if let Some(first) = themes.first() {
                    self.config.theme = first.clone();
                }
                self.reload_theme();
            }
            1 => self.config.hold_ms = self.config.hold_ms.saturating_sub(50).max(100),
            _ => {}
        }
    }

    fn reload_theme(&mut self) {
        if let Some(theme) = Theme::load(&self.config.theme) {
            let theme: &'static Theme = Box::leak(Box::new(theme));
            self.theme = theme;
        }
    }

    /// Big clock display. While running this re-renders every tick.
    pub fn clock_text(&self) -> String {
        match self.phase {
            TimerPhase::Running { started } => format_time(started.elapsed().as_secs_f64()),
            TimerPhase::Finished { elapsed } => format_time(elapsed),
            TimerPhase::Armed => "READY".to_string(),
            TimerPhase::Holding { .. } => "HOLD".to_string(),
            TimerPhase::Idle => "Ready".to_string(),
        }
    }

    /// Status line under the clock.
    pub fn status_text(&self) -> &'static str {
        if self.generating {
            return "Generating scrambles…";
        }
        match self.phase {
            TimerPhase::Idle => {
                if self.keyboard_enhanced {
                    "Hold Space to start"
                } else {
                    "Press Space to start"
                }
            }
            TimerPhase::Holding { .. } => "Holding…",
            TimerPhase::Armed => "Release to start",
            TimerPhase::Running { .. } => "Running (Space to stop)",
            TimerPhase::Finished { .. } => "Solve finished",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::TempDir;

    fn make_app() -> (TempDir, App) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        let config = Config {
            hold_ms: 100,
            ..Config::default()
        };
        let mut app = App::new(config, store);
        app.keyboard_enhanced = true;
        (dir, app)
    }

    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while app.generating {
            assert!(Instant::now() < deadline, "bootstrap never settled");
            app.on_tick();
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn first_run_bootstraps_then_serves_a_scramble() {
        let (_dir, mut app) = make_app();
        assert!(app.generating);
        settle(&mut app);
        assert!(!app.current_scramble.is_empty());
    }

    #[test]
    fn hold_release_cycle_starts_and_stops_the_clock() {
        let (_dir, mut app) = make_app();
        settle(&mut app);

        app.space_pressed();
        assert!(matches!(app.phase, TimerPhase::Holding { .. }));

        thread::sleep(Duration::from_millis(120));
        app.on_tick();
        assert_eq!(app.phase, TimerPhase::Armed);

        app.space_released();
        assert!(matches!(app.phase, TimerPhase::Running { .. }));

        let scramble_before = app.current_scramble.clone();
        app.space_pressed();
        assert!(matches!(app.phase, TimerPhase::Finished { .. }));
        assert_eq!(app.history.stats(&app.current_puzzle).count, 1);
        assert_eq!(
            app.history.last(&app.current_puzzle).unwrap().scramble,
            scramble_before
        );
        assert_ne!(app.current_scramble, scramble_before);
    }

    #[test]
    fn short_hold_cancels() {
        let (_dir, mut app) = make_app();
        settle(&mut app);

        app.space_pressed();
        app.space_released();
        assert_eq!(app.phase, TimerPhase::Idle);
        assert_eq!(app.history.stats(&app.current_puzzle).count, 0);
    }

    #[test]
    fn fallback_mode_is_press_to_start() {
        let (_dir, mut app) = make_app();
        app.keyboard_enhanced = false;
        settle(&mut app);

        app.space_pressed();
        assert!(matches!(app.phase, TimerPhase::Running { .. }));
        app.space_pressed();
        assert!(matches!(app.phase, TimerPhase::Finished { .. }));
    }

    #[test]
    fn delete_last_solve_restores_previous_display() {
        let (_dir, mut app) = make_app();
        app.keyboard_enhanced = false;
        settle(&mut app);

        app.space_pressed();
        app.space_pressed();
        assert_eq!(app.history.stats(&app.current_puzzle).count, 1);

        app.delete_last_solve();
        assert_eq!(app.history.stats(&app.current_puzzle).count, 0);
        assert_eq!(app.phase, TimerPhase::Idle);

        // Deleting again is a no-op.
        app.delete_last_solve();
        assert_eq!(app.phase, TimerPhase::Idle);
    }

    #[test]
    fn reset_clears_history_and_serves_a_fresh_scramble() {
        let (_dir, mut app) = make_app();
        app.keyboard_enhanced = false;
        settle(&mut app);

        app.space_pressed();
        app.space_pressed();
        assert_eq!(app.history.stats(&app.current_puzzle).count, 1);

        app.reset_all();
        assert_eq!(app.history.stats(&app.current_puzzle).count, 0);
        assert_eq!(app.phase, TimerPhase::Idle);
        assert!(!app.current_scramble.is_empty());
    }

    #[test]
    fn switch_puzzle_is_ignored_mid_solve() {
        let (_dir, mut app) = make_app();
        app.keyboard_enhanced = false;
        settle(&mut app);

        app.space_pressed();
        let before = app.current_puzzle.clone();
        app.switch_puzzle(&PuzzleId::new("Skewb"));
        assert_eq!(app.current_puzzle, before);
    }

    #[test]
    fn switch_puzzle_normalizes_unknown_ids() {
        let (_dir, mut app) = make_app();
        settle(&mut app);

        app.switch_puzzle(&PuzzleId::new("not-a-puzzle"));
        assert_eq!(app.current_puzzle.as_str(), "3x3x3");
    }

    #[test]
    fn current_puzzle_survives_restart() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        {
            let mut app = App::new(Config::default(), store.clone());
            settle(&mut app);
            app.switch_puzzle(&PuzzleId::new("Pyraminx"));
            settle(&mut app);
        }
        let app = App::new(Config::default(), store);
        assert_eq!(app.current_puzzle.as_str(), "Pyraminx");
    }
}
