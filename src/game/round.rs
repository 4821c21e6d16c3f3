//! Round lifecycle and the game state machine.
//!
//! One [`GameController`] owns every piece of mutable game state; the shell
//! (and the tests) drive it exclusively through the transition methods here.
//! Timers and audio are capabilities handed in at construction so the whole
//! machine runs on the host without a browser.

use crate::game::layout::{self, PlacementWarning, Target};
use crate::game::particles::{self, Particle};
use crate::game::rng::Rng;

/// The single active phase of the game. Transitions are the only way in or
/// out of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    StartMenu,
    Playing,
    Paused,
    CorrectFeedback,
    WrongFeedback,
}

/// Timer slots. At most one pending timeout per key; scheduling a key again
/// replaces the pending one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKey {
    /// Ends a feedback phase (default 2000 ms).
    Feedback,
    /// Replays the spoken target while the player searches (default 5000 ms).
    Cue,
}

/// Sound identifiers handed to the audio collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CueId {
    Number(u32),
    Success,
    Failure,
}

/// What the status line shows during a feedback phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackKind {
    Correct,
    Wrong,
}

/// Audio collaborator. Implementations absorb playback failures; nothing
/// here may fail the caller.
pub trait AudioPlayer {
    fn play(&mut self, cue: CueId);
}

/// One-shot timer collaborator. `schedule` MUST cancel any pending timeout
/// for the same key before arming the new one; when a timeout fires, the
/// environment routes it back into [`GameController::on_timer`].
pub trait Scheduler {
    fn schedule(&mut self, key: TimerKey, delay_ms: f64);
    fn cancel(&mut self, key: TimerKey);
}

/// Status-line collaborator (the DOM element with the feedback CSS classes).
pub trait FeedbackDisplay {
    fn show(&mut self, kind: FeedbackKind);
    fn clear(&mut self);
}

/// Tunables for a session. Defaults mirror the classic setup: numbers 1-10,
/// five on screen, 5 s cue repeat, 2 s feedback.
#[derive(Clone, Copy, Debug)]
pub struct GameConfig {
    pub min_number: u32,
    pub max_number: u32,
    pub items_on_screen: usize,
    pub cue_repeat_ms: f64,
    pub feedback_ms: f64,
    /// Delay before the first cue of a round, so audio never races layout.
    pub first_cue_delay_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_number: 1,
            max_number: 10,
            items_on_screen: 5,
            cue_repeat_ms: 5000.0,
            feedback_ms: 2000.0,
            first_cue_delay_ms: 50.0,
        }
    }
}

/// Everything round generation needs from the rendering surface.
pub struct RoundContext<'a> {
    pub canvas_w: f64,
    pub canvas_h: f64,
    pub measure: &'a dyn layout::TextMeasure,
}

/// Owner of all mutable game state. Field writes happen only inside the
/// transition methods below, keeping the state machine auditable.
pub struct GameController<A, S, F> {
    cfg: GameConfig,
    state: GameState,
    paused_from: GameState,
    target_number: Option<u32>,
    targets: Vec<Target>,
    particles: Vec<Particle>,
    round_warnings: Vec<PlacementWarning>,
    rng: Rng,
    pub audio: A,
    pub scheduler: S,
    pub feedback: F,
}

impl<A: AudioPlayer, S: Scheduler, F: FeedbackDisplay> GameController<A, S, F> {
    pub fn new(cfg: GameConfig, rng: Rng, audio: A, scheduler: S, feedback: F) -> Self {
        Self {
            cfg,
            state: GameState::StartMenu,
            paused_from: GameState::StartMenu,
            target_number: None,
            targets: Vec::new(),
            particles: Vec::new(),
            round_warnings: Vec::new(),
            rng,
            audio,
            scheduler,
            feedback,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.cfg
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn target_number(&self) -> Option<u32> {
        self.target_number
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Drain the placement warnings of the most recent round so the shell
    /// can log them.
    pub fn take_warnings(&mut self) -> Vec<PlacementWarning> {
        std::mem::take(&mut self.round_warnings)
    }

    // --- Commands -----------------------------------------------------------

    /// Start command. Begins a fresh round from the menu, and also restarts
    /// out of pause (the start button doubles as a reset there).
    pub fn start(&mut self, ctx: &RoundContext<'_>) {
        if matches!(self.state, GameState::StartMenu | GameState::Paused) {
            self.start_new_round(ctx);
        }
    }

    /// Pause/resume toggle. Only the searching states are pausable; a
    /// correct-feedback animation is about to start a new round anyway.
    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing | GameState::WrongFeedback => {
                self.paused_from = self.state;
                self.state = GameState::Paused;
                self.scheduler.cancel(TimerKey::Cue);
                self.scheduler.cancel(TimerKey::Feedback);
            }
            GameState::Paused => {
                self.state = self.paused_from;
                match self.state {
                    GameState::Playing => {
                        self.scheduler.schedule(TimerKey::Cue, self.cfg.cue_repeat_ms);
                    }
                    GameState::WrongFeedback => {
                        // Restore the interrupted feedback, timer included,
                        // so the phase still runs its full course.
                        self.feedback.show(FeedbackKind::Wrong);
                        self.scheduler.schedule(TimerKey::Feedback, self.cfg.feedback_ms);
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    /// Exit command: back to the menu from any state, dropping the round.
    pub fn exit_to_menu(&mut self) {
        self.state = GameState::StartMenu;
        self.target_number = None;
        self.targets.clear();
        self.particles.clear();
        self.round_warnings.clear();
        self.feedback.clear();
        self.scheduler.cancel(TimerKey::Feedback);
        self.scheduler.cancel(TimerKey::Cue);
    }

    /// Pointer input, canvas-relative. Honored only while `Playing`; resolves
    /// to at most one target, most recently placed first.
    pub fn tap(&mut self, x: f64, y: f64) {
        if self.state != GameState::Playing {
            return;
        }
        let Some(idx) = layout::hit_test(&self.targets, x, y) else {
            return;
        };

        if Some(self.targets[idx].value) == self.target_number {
            let hit = self.targets.remove(idx);
            self.state = GameState::CorrectFeedback;
            self.feedback.show(FeedbackKind::Correct);
            self.audio.play(CueId::Success);
            self.particles = particles::burst(&mut self.rng, hit.center_x, hit.center_y, hit.color);
            self.scheduler.cancel(TimerKey::Cue);
            self.scheduler.schedule(TimerKey::Feedback, self.cfg.feedback_ms);
        } else {
            self.state = GameState::WrongFeedback;
            self.feedback.show(FeedbackKind::Wrong);
            self.audio.play(CueId::Failure);
            // Cue keeps repeating; the player is still searching.
            self.scheduler.schedule(TimerKey::Feedback, self.cfg.feedback_ms);
        }
    }

    /// Timer dispatch. Every firing re-validates the current state: a pause
    /// or exit may have happened while the timeout was pending.
    pub fn on_timer(&mut self, key: TimerKey, ctx: &RoundContext<'_>) {
        match key {
            TimerKey::Feedback => match self.state {
                GameState::CorrectFeedback => self.start_new_round(ctx),
                GameState::WrongFeedback => {
                    self.state = GameState::Playing;
                    self.feedback.clear();
                    self.scheduler.schedule(TimerKey::Cue, self.cfg.cue_repeat_ms);
                }
                // State moved on while the timeout was pending; the visual
                // is all that is left to clean up.
                _ => self.feedback.clear(),
            },
            TimerKey::Cue => {
                if self.state == GameState::Playing {
                    if let Some(n) = self.target_number {
                        self.audio.play(CueId::Number(n));
                        self.scheduler.schedule(TimerKey::Cue, self.cfg.cue_repeat_ms);
                    }
                }
            }
        }
    }

    /// Per-frame particle physics, active only while the reward animation is
    /// on screen. Faded particles are swept so they are never drawn stale.
    pub fn advance_particles(&mut self) {
        if self.state != GameState::CorrectFeedback {
            return;
        }
        for p in &mut self.particles {
            p.step();
        }
        self.particles.retain(Particle::alive);
    }

    // --- Round generation ---------------------------------------------------

    fn start_new_round(&mut self, ctx: &RoundContext<'_>) {
        let target = self.rng.range_u32(self.cfg.min_number, self.cfg.max_number);
        let font_px = layout::number_font_px(ctx.canvas_w);
        let (targets, warnings) = layout::place_targets(
            &mut self.rng,
            ctx.measure,
            font_px,
            target,
            (self.cfg.min_number, self.cfg.max_number),
            self.cfg.items_on_screen,
            ctx.canvas_w,
            ctx.canvas_h,
        );

        self.targets = targets;
        self.round_warnings = warnings;
        self.target_number = Some(target);
        self.particles.clear();
        self.feedback.clear();
        self.scheduler.cancel(TimerKey::Feedback);
        self.state = GameState::Playing;
        // First cue goes through the same slot; when it fires it replays
        // itself every `cue_repeat_ms` until cancelled.
        self.scheduler.schedule(TimerKey::Cue, self.cfg.first_cue_delay_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAudio;
    impl AudioPlayer for NullAudio {
        fn play(&mut self, _cue: CueId) {}
    }

    struct NullScheduler;
    impl Scheduler for NullScheduler {
        fn schedule(&mut self, _key: TimerKey, _delay_ms: f64) {}
        fn cancel(&mut self, _key: TimerKey) {}
    }

    struct NullFeedback;
    impl FeedbackDisplay for NullFeedback {
        fn show(&mut self, _kind: FeedbackKind) {}
        fn clear(&mut self) {}
    }

    fn quiet_game() -> GameController<NullAudio, NullScheduler, NullFeedback> {
        GameController::new(
            GameConfig::default(),
            Rng::new(1),
            NullAudio,
            NullScheduler,
            NullFeedback,
        )
    }

    #[test]
    fn default_config_matches_classic_setup() {
        let cfg = GameConfig::default();
        assert_eq!(cfg.min_number, 1);
        assert_eq!(cfg.max_number, 10);
        assert_eq!(cfg.items_on_screen, 5);
        assert_eq!(cfg.cue_repeat_ms, 5000.0);
        assert_eq!(cfg.feedback_ms, 2000.0);
    }

    #[test]
    fn fresh_controller_sits_in_menu() {
        let g = quiet_game();
        assert_eq!(g.state(), GameState::StartMenu);
        assert_eq!(g.target_number(), None);
        assert!(g.targets().is_empty());
        assert!(g.particles().is_empty());
    }

    #[test]
    fn menu_ignores_taps_and_pause() {
        let mut g = quiet_game();
        g.tap(100.0, 100.0);
        g.toggle_pause();
        assert_eq!(g.state(), GameState::StartMenu);
    }
}
