// Native integration tests for the round/state controller.
// Browser collaborators are replaced by recording fakes so the whole state
// machine runs under `cargo test` on the host.

use number_cue::game::layout::hit_test;
use number_cue::game::particles::BURST_SIZE;
use number_cue::{
    AudioPlayer, CueId, FeedbackDisplay, FeedbackKind, GameConfig, GameController, GameState,
    PlacementWarning, Rng, RoundContext, Scheduler, TextMeasure, TimerKey,
};

#[derive(Default)]
struct RecordingAudio {
    played: Vec<CueId>,
}

impl AudioPlayer for RecordingAudio {
    fn play(&mut self, cue: CueId) {
        self.played.push(cue);
    }
}

#[derive(Default)]
struct RecordingScheduler {
    scheduled: Vec<(TimerKey, f64)>,
    cancelled: Vec<TimerKey>,
}

impl Scheduler for RecordingScheduler {
    fn schedule(&mut self, key: TimerKey, delay_ms: f64) {
        self.scheduled.push((key, delay_ms));
    }

    fn cancel(&mut self, key: TimerKey) {
        self.cancelled.push(key);
    }
}

#[derive(Default)]
struct RecordingFeedback {
    current: Option<FeedbackKind>,
    clears: usize,
}

impl FeedbackDisplay for RecordingFeedback {
    fn show(&mut self, kind: FeedbackKind) {
        self.current = Some(kind);
    }

    fn clear(&mut self) {
        self.current = None;
        self.clears += 1;
    }
}

struct FixedMeasure;

impl TextMeasure for FixedMeasure {
    fn measure(&self, text: &str, font_px: f64) -> (f64, f64) {
        (font_px * 0.6 * text.chars().count() as f64, font_px)
    }
}

static MEASURE: FixedMeasure = FixedMeasure;

type TestGame = GameController<RecordingAudio, RecordingScheduler, RecordingFeedback>;

fn new_game(seed: u64) -> TestGame {
    GameController::new(
        GameConfig::default(),
        Rng::new(seed),
        RecordingAudio::default(),
        RecordingScheduler::default(),
        RecordingFeedback::default(),
    )
}

fn ctx(w: f64, h: f64) -> RoundContext<'static> {
    RoundContext {
        canvas_w: w,
        canvas_h: h,
        measure: &MEASURE,
    }
}

/// Center of the on-screen target matching the spoken number.
fn cued_center(game: &TestGame) -> (f64, f64) {
    let t = game
        .targets()
        .iter()
        .find(|t| Some(t.value) == game.target_number())
        .expect("cued number must be on screen");
    (t.center_x, t.center_y)
}

/// Center of some on-screen number that does NOT match the cue.
fn distractor_center(game: &TestGame) -> (f64, f64) {
    let t = game
        .targets()
        .iter()
        .find(|t| Some(t.value) != game.target_number())
        .expect("at least one distractor on screen");
    (t.center_x, t.center_y)
}

/// A canvas point that no hit box covers.
fn free_point(game: &TestGame, w: f64, h: f64) -> (f64, f64) {
    let mut y = 0.0;
    while y < h {
        let mut x = 0.0;
        while x < w {
            if hit_test(game.targets(), x, y).is_none() {
                return (x, y);
            }
            x += 7.0;
        }
        y += 7.0;
    }
    panic!("no free point on a {w}x{h} canvas");
}

#[test]
fn start_from_menu_begins_a_round() {
    let mut game = new_game(17);
    game.start(&ctx(800.0, 600.0));

    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.targets().len(), 5);
    let target = game.target_number().expect("round has a target");
    assert_eq!(
        game.targets().iter().filter(|t| t.value == target).count(),
        1,
        "exactly one on-screen number matches the cue"
    );
    // First cue is armed through the cue slot with the short layout-settle delay.
    assert_eq!(
        game.scheduler.scheduled,
        vec![(TimerKey::Cue, game.config().first_cue_delay_ms)]
    );
    assert!(game.take_warnings().is_empty());
}

#[test]
fn cue_timer_replays_and_rearms_itself() {
    let mut game = new_game(23);
    game.start(&ctx(800.0, 600.0));
    let target = game.target_number().unwrap();
    game.scheduler.scheduled.clear();

    game.on_timer(TimerKey::Cue, &ctx(800.0, 600.0));
    assert_eq!(game.audio.played, vec![CueId::Number(target)]);
    assert_eq!(game.scheduler.scheduled, vec![(TimerKey::Cue, 5000.0)]);

    // After exit the pending fire must become a no-op.
    game.exit_to_menu();
    game.audio.played.clear();
    game.scheduler.scheduled.clear();
    game.on_timer(TimerKey::Cue, &ctx(800.0, 600.0));
    assert!(game.audio.played.is_empty());
    assert!(game.scheduler.scheduled.is_empty());
}

#[test]
fn correct_tap_rewards_then_rolls_a_new_round() {
    let mut game = new_game(31);
    game.start(&ctx(800.0, 600.0));
    let (x, y) = cued_center(&game);

    game.tap(x, y);
    assert_eq!(game.state(), GameState::CorrectFeedback);
    assert_eq!(game.feedback.current, Some(FeedbackKind::Correct));
    assert!(game.audio.played.contains(&CueId::Success));
    assert_eq!(game.particles().len(), BURST_SIZE);
    assert_eq!(game.targets().len(), 4, "tapped number is consumed");
    assert!(game.scheduler.cancelled.contains(&TimerKey::Cue));
    assert!(game
        .scheduler
        .scheduled
        .contains(&(TimerKey::Feedback, 2000.0)));

    // Feedback timer elapses: fresh round, reward batch dropped.
    game.on_timer(TimerKey::Feedback, &ctx(800.0, 600.0));
    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.targets().len(), 5);
    assert!(game.particles().is_empty());
    assert!(game.target_number().is_some());
    assert_eq!(game.feedback.current, None);
}

#[test]
fn wrong_tap_keeps_the_round_intact() {
    let mut game = new_game(47);
    game.start(&ctx(800.0, 600.0));
    let target_before = game.target_number();
    let layout_before = game.targets().to_vec();
    let (x, y) = distractor_center(&game);

    game.tap(x, y);
    assert_eq!(game.state(), GameState::WrongFeedback);
    assert_eq!(game.feedback.current, Some(FeedbackKind::Wrong));
    assert!(game.audio.played.contains(&CueId::Failure));
    assert!(
        !game.scheduler.cancelled.contains(&TimerKey::Cue),
        "cue keeps repeating after a miss"
    );

    // Feedback elapses: same target, same layout, cue re-armed.
    game.scheduler.scheduled.clear();
    game.on_timer(TimerKey::Feedback, &ctx(800.0, 600.0));
    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.target_number(), target_before);
    assert_eq!(game.targets(), layout_before.as_slice());
    assert_eq!(game.scheduler.scheduled, vec![(TimerKey::Cue, 5000.0)]);
}

#[test]
fn tap_on_empty_canvas_space_does_nothing() {
    let mut game = new_game(53);
    game.start(&ctx(800.0, 600.0));
    game.audio.played.clear();
    let (x, y) = free_point(&game, 800.0, 600.0);

    game.tap(x, y);
    assert_eq!(game.state(), GameState::Playing);
    assert!(game.audio.played.is_empty());
    assert_eq!(game.targets().len(), 5);
}

#[test]
fn taps_are_ignored_during_feedback() {
    let mut game = new_game(59);
    game.start(&ctx(800.0, 600.0));
    let (x, y) = cued_center(&game);
    game.tap(x, y);
    assert_eq!(game.state(), GameState::CorrectFeedback);

    let played_before = game.audio.played.len();
    game.tap(x, y);
    assert_eq!(game.state(), GameState::CorrectFeedback);
    assert_eq!(game.audio.played.len(), played_before);
}

#[test]
fn pause_and_resume_rearm_the_cue_exactly_once() {
    let mut game = new_game(61);
    game.start(&ctx(800.0, 600.0));

    game.toggle_pause();
    assert_eq!(game.state(), GameState::Paused);
    assert!(game.scheduler.cancelled.contains(&TimerKey::Cue));
    assert!(game.scheduler.cancelled.contains(&TimerKey::Feedback));

    let scheduled_before = game.scheduler.scheduled.len();
    game.toggle_pause();
    assert_eq!(game.state(), GameState::Playing);
    let new_schedules = &game.scheduler.scheduled[scheduled_before..];
    assert_eq!(new_schedules, &[(TimerKey::Cue, 5000.0)]);
}

#[test]
fn pause_during_wrong_feedback_restores_the_phase() {
    let mut game = new_game(67);
    game.start(&ctx(800.0, 600.0));
    let (x, y) = distractor_center(&game);
    game.tap(x, y);
    assert_eq!(game.state(), GameState::WrongFeedback);

    game.toggle_pause();
    assert_eq!(game.state(), GameState::Paused);

    let scheduled_before = game.scheduler.scheduled.len();
    game.toggle_pause();
    assert_eq!(game.state(), GameState::WrongFeedback);
    assert_eq!(game.feedback.current, Some(FeedbackKind::Wrong));
    let new_schedules = &game.scheduler.scheduled[scheduled_before..];
    assert_eq!(new_schedules, &[(TimerKey::Feedback, 2000.0)]);
}

#[test]
fn start_also_restarts_out_of_pause() {
    let mut game = new_game(71);
    game.start(&ctx(800.0, 600.0));
    game.toggle_pause();

    game.start(&ctx(800.0, 600.0));
    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.targets().len(), 5);
}

#[test]
fn exit_clears_the_whole_session() {
    let mut game = new_game(73);
    game.start(&ctx(800.0, 600.0));
    let (x, y) = cued_center(&game);
    game.tap(x, y);

    game.exit_to_menu();
    assert_eq!(game.state(), GameState::StartMenu);
    assert_eq!(game.target_number(), None);
    assert!(game.targets().is_empty());
    assert!(game.particles().is_empty());
    assert!(game.scheduler.cancelled.contains(&TimerKey::Feedback));
    assert!(game.scheduler.cancelled.contains(&TimerKey::Cue));
}

#[test]
fn stale_feedback_timer_only_clears_the_text() {
    let mut game = new_game(79);
    game.start(&ctx(800.0, 600.0));
    let clears_before = game.feedback.clears;
    let layout_before = game.targets().to_vec();

    // A feedback timeout landing while we are already back in Playing must
    // not roll a new round.
    game.on_timer(TimerKey::Feedback, &ctx(800.0, 600.0));
    assert_eq!(game.state(), GameState::Playing);
    assert_eq!(game.targets(), layout_before.as_slice());
    assert_eq!(game.feedback.clears, clears_before + 1);
}

#[test]
fn degenerate_canvas_degrades_to_an_empty_round() {
    let mut game = new_game(83);
    game.start(&ctx(10.0, 10.0));

    assert_eq!(game.state(), GameState::Playing);
    assert!(game.targets().is_empty());
    assert_eq!(game.take_warnings(), vec![PlacementWarning::DegenerateCanvas]);
}

#[test]
fn reward_particles_fade_and_sweep() {
    let mut game = new_game(89);
    game.start(&ctx(800.0, 600.0));
    let (x, y) = cued_center(&game);
    game.tap(x, y);
    assert_eq!(game.particles().len(), BURST_SIZE);

    // Alpha decays 0.01 per step from 1.0; the whole batch is swept within
    // 100 steps.
    for _ in 0..100 {
        game.advance_particles();
    }
    assert!(game.particles().is_empty());
}
