//! Session lifecycle state machine
//!
//! ```text
//! Idle --start--> Intro --sweep done / transition_complete--> Racing
//! Racing --collision below threshold--> Warning  (one-way until the run ends)
//! Racing|Warning --count >= threshold--> GameOver
//! Racing|Warning --distance >= completion--> Completed
//! GameOver|Completed --reset--> Racing        (restart skips the intro)
//! any --quit--> Idle
//! ```
//!
//! Commands that do not apply to the current state are ignored and return false.

use super::collision::CollisionResolver;
use super::state::{RunOutcome, RunStats, SessionContext, SessionEvent, SessionState};
use super::tick::{TickInput, tick};
use super::vehicle::{ControlScheme, VehicleController};
use crate::assets::AssetEvent;
use crate::tuning::Tuning;

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    ctx: SessionContext,
    tuning: Tuning,
    controller: VehicleController,
    resolver: CollisionResolver,
    events: Vec<SessionEvent>,
    last_run: Option<RunStats>,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        let resolver = CollisionResolver::new(tuning.collision.margin);
        Self {
            state: SessionState::Idle,
            ctx: SessionContext::new(&tuning, seed),
            tuning,
            controller: VehicleController::default(),
            resolver,
            events: Vec::new(),
            last_run: None,
        }
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn control_scheme(&self) -> ControlScheme {
        self.controller.scheme
    }

    pub fn set_control_scheme(&mut self, scheme: ControlScheme) {
        self.controller.scheme = scheme;
    }

    /// Whether fixed ticks should be run in this state
    pub fn is_ticking(&self) -> bool {
        self.state.is_racing()
    }

    /// Stats of the most recent finished run
    pub fn last_run(&self) -> Option<&RunStats> {
        self.last_run.as_ref()
    }

    /// Take all events raised since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Loader signal for a model's bounding volume
    pub fn handle_asset_event(&mut self, event: AssetEvent) -> bool {
        self.ctx.volumes.apply(event)
    }

    fn transition(&mut self, to: SessionState) {
        let from = self.state;
        if from == to {
            return;
        }
        log::info!("Session {:?} -> {:?}", from, to);
        self.state = to;
        self.events.push(SessionEvent::Transition { from, to });
    }

    /// Idle -> Intro
    pub fn start(&mut self) -> bool {
        if self.state != SessionState::Idle {
            log::debug!("start() ignored in {:?}", self.state);
            return false;
        }
        self.ctx.intro.elapsed = 0.0;
        self.transition(SessionState::Intro);
        true
    }

    /// Poll the intro sweep with wall-clock time; finishes into Racing
    pub fn advance_intro(&mut self, dt: f64) -> bool {
        if self.state != SessionState::Intro {
            return false;
        }
        if self.ctx.intro.advance(dt) {
            self.transition_complete()
        } else {
            false
        }
    }

    /// Intro -> Racing (the camera collaborator may call this early)
    pub fn transition_complete(&mut self) -> bool {
        if self.state != SessionState::Intro {
            log::debug!("transition_complete() ignored in {:?}", self.state);
            return false;
        }
        self.begin_run();
        true
    }

    /// GameOver|Completed -> Racing, skipping the intro
    pub fn reset(&mut self) -> bool {
        if !self.state.is_terminal() {
            log::debug!("reset() ignored in {:?}", self.state);
            return false;
        }
        self.begin_run();
        true
    }

    /// Back to the menu from anywhere. The abandoned run is discarded so the
    /// next intro starts from a clean slate.
    pub fn quit(&mut self) -> bool {
        if self.state == SessionState::Idle {
            return false;
        }
        self.ctx.begin_run(&self.tuning);
        self.last_run = None;
        self.transition(SessionState::Idle);
        true
    }

    fn begin_run(&mut self) {
        self.ctx.begin_run(&self.tuning);
        self.last_run = None;
        self.transition(SessionState::Racing);
    }

    /// Run one fixed step. No-op outside Racing/Warning.
    pub fn tick(&mut self, input: &TickInput, dt: f64) {
        if !self.is_ticking() {
            return;
        }

        let report = tick(
            &mut self.ctx,
            input,
            &self.tuning,
            &self.controller,
            &self.resolver,
            dt,
        );

        if let Some(info) = report.spawned {
            self.events.push(SessionEvent::Spawned {
                obstacle: info.index,
                lane: info.lane,
                behind: info.behind,
            });
        }
        if report.recycled > 0 {
            log::debug!("Recycled {} out-of-range obstacles", report.recycled);
        }
        for hit in &report.hits {
            self.events.push(SessionEvent::Collision {
                obstacle: hit.obstacle,
                count: hit.count,
            });
        }

        let collisions = self.ctx.vehicle.collision_count;
        if collisions >= self.tuning.collision.threshold {
            self.finish(RunOutcome::GameOver);
        } else if self.ctx.score.distance >= self.tuning.session.completion_distance {
            self.finish(RunOutcome::Completed);
        } else if !report.hits.is_empty() {
            self.transition(SessionState::Warning);
        }
    }

    fn finish(&mut self, outcome: RunOutcome) {
        let stats = self.ctx.stats(outcome);
        match outcome {
            RunOutcome::GameOver => {
                log::info!(
                    "Game over after {:.1}s ({} collisions, {:.0}m)",
                    stats.elapsed,
                    stats.collisions,
                    stats.distance
                );
                self.transition(SessionState::GameOver);
            }
            RunOutcome::Completed => {
                log::info!(
                    "Completed {:.0}m in {:.2}s (avg {:.1} m/s, score {})",
                    stats.distance,
                    stats.elapsed,
                    stats.average_speed,
                    stats.score
                );
                self.ctx.pool.clear();
                self.transition(SessionState::Completed);
            }
        }
        self.events.push(SessionEvent::Finished(stats.clone()));
        self.last_run = Some(stats);
    }
}
