//! Frame driver
//!
//! Owns the session and everything around it. Each animation frame feeds the
//! fixed-step clock, runs the owed ticks, then hands session events to the
//! handlers below (leaderboard submission on completion).

use crate::assets::AssetEvent;
use crate::clock::FixedStepClock;
use crate::input::InputState;
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::persistence::Storage;
use crate::settings::Settings;
use crate::sim::{RunOutcome, RunStats, Session, SessionEvent, SessionState};
use crate::tuning::Tuning;
use crate::ui::HudSnapshot;

pub struct App<S: Storage> {
    pub session: Session,
    pub clock: FixedStepClock,
    pub input: InputState,
    pub settings: Settings,
    pub leaderboard: Leaderboard,
    storage: S,
    /// Rank earned by the last completed run, if it made the board
    pub last_rank: Option<usize>,
}

impl<S: Storage> App<S> {
    /// An invalid tuning is replaced by the defaults
    pub fn new(tuning: Tuning, seed: u64, storage: S) -> Self {
        let tuning = match tuning.validate() {
            Ok(()) => tuning,
            Err(e) => {
                log::warn!("{}; using default tuning", e);
                Tuning::default()
            }
        };
        let settings = Settings::load(&storage);
        let leaderboard = Leaderboard::load(&storage);
        let mut session = Session::new(tuning, seed);
        session.set_control_scheme(settings.control_scheme);
        Self {
            session,
            clock: FixedStepClock::default(),
            input: InputState::default(),
            settings,
            leaderboard,
            storage,
            last_rank: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn start(&mut self) -> bool {
        self.session.start()
    }

    /// Restart after a finished run (skips the intro)
    pub fn reset(&mut self) -> bool {
        self.clock.reset();
        self.last_rank = None;
        self.session.reset()
    }

    pub fn quit(&mut self) -> bool {
        self.clock.reset();
        self.input.release_all();
        self.last_rank = None;
        self.session.quit()
    }

    pub fn on_asset_event(&mut self, event: AssetEvent) {
        self.session.handle_asset_event(event);
    }

    pub fn hud(&self) -> HudSnapshot {
        HudSnapshot::from_session(&self.session)
    }

    pub fn save_settings(&mut self) {
        self.session.set_control_scheme(self.settings.control_scheme);
        if let Err(e) = self.settings.save(&mut self.storage) {
            log::warn!("Could not save settings: {}", e);
        }
    }

    /// One animation frame. Returns the events raised during it.
    pub fn frame(&mut self, frame_delta: f64) -> Vec<SessionEvent> {
        if self.session.state() == SessionState::Intro {
            self.session.advance_intro(frame_delta);
        }

        if self.session.is_ticking() {
            self.clock.accumulate(frame_delta);
            for step in self.clock.drain() {
                if !self.session.is_ticking() {
                    break;
                }
                let input = self.input.snapshot();
                self.session.tick(&input, step);
            }
        } else {
            self.clock.reset();
        }

        let events = self.session.drain_events();
        for event in &events {
            self.handle_event(event);
        }
        events
    }

    fn handle_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Finished(stats) => self.on_run_finished(stats),
            SessionEvent::Collision { obstacle, count } => {
                log::debug!("Hit obstacle slot {} ({} total)", obstacle, count);
            }
            SessionEvent::Transition { from, to } => {
                log::debug!("Transition {:?} -> {:?}", from, to);
                if to.is_terminal() {
                    self.input.release_all();
                }
            }
            SessionEvent::Spawned { .. } => {}
        }
    }

    fn on_run_finished(&mut self, stats: &RunStats) {
        if stats.outcome != RunOutcome::Completed {
            return;
        }
        let Some(entry) = LeaderboardEntry::from_run(&self.settings.player_name, stats) else {
            return;
        };
        self.last_rank = self.leaderboard.insert(entry);
        match self.last_rank {
            Some(rank) => {
                log::info!("New leaderboard entry at rank {}", rank);
                if let Err(e) = self.leaderboard.save(&mut self.storage) {
                    log::warn!("Could not save leaderboard: {}", e);
                }
            }
            None => log::info!("Run did not make the leaderboard"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::STEP;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_frames_drive_full_run() {
        let mut tuning = Tuning::default();
        tuning.session.completion_distance = 20.0;
        let mut app = App::new(tuning, 7, MemoryStorage::new());
        app.input.accelerate = true;

        // Idle: frames do nothing
        app.frame(STEP);
        assert_eq!(app.state(), SessionState::Idle);

        assert!(app.start());
        for _ in 0..400 {
            app.frame(STEP);
            if app.state() == SessionState::Completed {
                break;
            }
        }
        // 2.5s intro + ~2s racing
        assert_eq!(app.state(), SessionState::Completed);
        assert_eq!(app.last_rank, Some(1));
        assert_eq!(app.leaderboard.entries().len(), 1);

        // Persisted
        let reloaded = Leaderboard::load(app.storage());
        assert_eq!(reloaded.entries().len(), 1);
        assert_eq!(reloaded.entries()[0].name, "Player");
    }

    #[test]
    fn test_invalid_tuning_falls_back_to_defaults() {
        let mut tuning = Tuning::default();
        tuning.collision.threshold = 0;
        let mut app = App::new(tuning, 7, MemoryStorage::new());
        assert_eq!(app.session.tuning(), &Tuning::default());

        // Zero hits never ends the run
        app.start();
        app.session.transition_complete();
        app.frame(STEP);
        assert_eq!(app.state(), SessionState::Racing);
    }

    #[test]
    fn test_quit_forgets_finished_run() {
        let mut tuning = Tuning::default();
        tuning.session.completion_distance = 1.0;
        let mut app = App::new(tuning, 7, MemoryStorage::new());
        app.start();
        app.session.transition_complete();
        for _ in 0..20 {
            app.frame(STEP);
        }
        assert_eq!(app.state(), SessionState::Completed);
        assert_eq!(app.last_rank, Some(1));

        assert!(app.quit());
        assert!(app.last_rank.is_none());
        assert!(app.session.last_run().is_none());
        let hud = app.hud();
        assert_eq!(hud.distance, 0.0);
        assert_eq!(hud.elapsed, 0.0);
        assert_eq!(hud.state, SessionState::Idle);
        // The ranked entry itself stays on the board
        assert_eq!(app.leaderboard.entries().len(), 1);
    }

    #[test]
    fn test_hitch_frame_is_bounded() {
        let mut app = App::new(Tuning::default(), 7, MemoryStorage::new());
        app.start();
        app.session.transition_complete();
        app.frame(10.0);
        assert_eq!(app.session.context().time_ticks, 5);
    }

    #[test]
    fn test_game_over_not_ranked() {
        let mut tuning = Tuning::default();
        tuning.collision.threshold = 1;
        tuning.collision.invulnerability = 0.0;
        let mut app = App::new(tuning, 7, MemoryStorage::new());
        app.start();
        app.session.transition_complete();
        let stats = app.session.context().stats(RunOutcome::GameOver);
        app.handle_event(&SessionEvent::Finished(stats));
        assert!(app.leaderboard.is_empty());
        assert!(app.last_rank.is_none());
    }
}
