//! Browser shell for the number game: canvas + DOM bootstrap, input and
//! button wiring, setTimeout-backed timer slots, audio elements, and the
//! requestAnimationFrame render loop.
//!
//! Everything stateful funnels into the [`round::GameController`] stored in a
//! thread-local singleton; this module only translates browser events into
//! controller calls and draws whatever state the controller is in.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlAudioElement, HtmlCanvasElement, window,
};

pub mod layout;
pub mod particles;
pub mod rng;
pub mod round;

use crate::game::layout::TextMeasure;
use crate::game::rng::Rng;
use crate::game::round::{
    AudioPlayer, CueId, FeedbackDisplay, FeedbackKind, GameConfig, GameController, GameState,
    RoundContext, Scheduler, TimerKey,
};

/// Height of the control-button bar the canvas sits below.
const BUTTON_AREA_PX: f64 = 60.0;
/// Number cues only play if the user interacted this recently (autoplay
/// policy); success/failure cues are exempt.
const GESTURE_WINDOW_MS: f64 = 10_000.0;

type WebGame = GameController<WebAudioPlayer, WebScheduler, DomFeedback>;

struct Game {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    controller: WebGame,
}

thread_local! {
    static GAME: RefCell<Option<Game>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

fn performance_now() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

// --- Bootstrap ---------------------------------------------------------------

pub fn boot() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("no window"))?;
    let doc = win
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas = ensure_canvas(&doc)?;
    fit_canvas_to_container(&canvas);
    let ctx: CanvasRenderingContext2d = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into()?;

    ensure_feedback_line(&doc)?;
    ensure_button(&doc, "start-button", "Start")?;
    ensure_button(&doc, "pause-button", "Pause")?;
    ensure_button(&doc, "exit-button", "Exit")?;

    let cfg = GameConfig::default();
    let controller = GameController::new(
        cfg,
        Rng::new(performance_now().to_bits()),
        WebAudioPlayer::new(cfg.min_number, cfg.max_number),
        WebScheduler::new(),
        DomFeedback,
    );

    GAME.with(|g| {
        g.replace(Some(Game {
            canvas: canvas.clone(),
            ctx,
            controller,
        }))
    });

    install_pointer_handlers(&canvas)?;
    install_button_handlers(&doc)?;
    install_resize_handler(&win)?;
    start_render_loop();
    log("number game ready");
    Ok(())
}

fn ensure_canvas(doc: &Document) -> Result<HtmlCanvasElement, JsValue> {
    if let Some(el) = doc.get_element_by_id("game-canvas") {
        return Ok(el.dyn_into()?);
    }
    let canvas: HtmlCanvasElement = doc.create_element("canvas")?.dyn_into()?;
    canvas.set_id("game-canvas");
    mount(doc, &canvas)?;
    Ok(canvas)
}

fn ensure_feedback_line(doc: &Document) -> Result<(), JsValue> {
    if doc.get_element_by_id("feedback").is_none() {
        let div = doc.create_element("div")?;
        div.set_id("feedback");
        div.set_text_content(Some(""));
        mount(doc, &div)?;
    }
    Ok(())
}

fn ensure_button(doc: &Document, id: &str, label: &str) -> Result<(), JsValue> {
    if doc.get_element_by_id(id).is_none() {
        let button = doc.create_element("button")?;
        button.set_id(id);
        button.set_text_content(Some(label));
        mount(doc, &button)?;
    }
    Ok(())
}

fn mount(doc: &Document, node: &Element) -> Result<(), JsValue> {
    if let Some(container) = doc.get_element_by_id("game-container") {
        container.append_child(node)?;
    } else if let Some(body) = doc.body() {
        body.append_child(node)?;
    }
    Ok(())
}

/// Match the canvas resolution to its container, leaving room for the button
/// bar. Already-placed targets keep their coordinates; only the next round
/// lays out against the new size.
fn fit_canvas_to_container(canvas: &HtmlCanvasElement) {
    let Some(win) = window() else { return };
    let (w, h) = match win
        .document()
        .and_then(|d| d.get_element_by_id("game-container"))
    {
        Some(container) => {
            let r = container.get_bounding_client_rect();
            (r.width(), r.height() - BUTTON_AREA_PX)
        }
        None => (
            win.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(640.0),
            win.inner_height()
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(480.0)
                - BUTTON_AREA_PX,
        ),
    };
    canvas.set_width(w.max(0.0) as u32);
    canvas.set_height(h.max(0.0) as u32);
}

// --- Text measurement --------------------------------------------------------

struct CanvasMeasure<'a> {
    ctx: &'a CanvasRenderingContext2d,
}

impl TextMeasure for CanvasMeasure<'_> {
    fn measure(&self, text: &str, font_px: f64) -> (f64, f64) {
        self.ctx.set_font(&canvas_font(font_px));
        let w = self
            .ctx
            .measure_text(text)
            .map(|m| m.width())
            .unwrap_or(font_px * 0.6 * text.chars().count() as f64);
        // Canvas text metrics have no portable height; the font size is a
        // good enough bound for digits.
        (w, font_px)
    }
}

fn canvas_font(px: f64) -> String {
    format!("bold {px}px sans-serif")
}

/// Run `f` with a [`RoundContext`] borrowed from the live canvas.
fn with_round_ctx(game: &mut Game, f: impl FnOnce(&mut WebGame, &RoundContext<'_>)) {
    let measure = CanvasMeasure { ctx: &game.ctx };
    let rctx = RoundContext {
        canvas_w: game.canvas.width() as f64,
        canvas_h: game.canvas.height() as f64,
        measure: &measure,
    };
    f(&mut game.controller, &rctx);
    for w in game.controller.take_warnings() {
        warn(&w.to_string());
    }
}

// --- Timers ------------------------------------------------------------------

/// setTimeout-backed [`Scheduler`]: one slot per [`TimerKey`], one persistent
/// callback per slot. Scheduling clears the pending timeout first, so two
/// timers of the same kind can never be in flight.
pub struct WebScheduler {
    feedback_cb: Closure<dyn FnMut()>,
    cue_cb: Closure<dyn FnMut()>,
    feedback_id: Option<i32>,
    cue_id: Option<i32>,
}

impl WebScheduler {
    pub fn new() -> Self {
        Self {
            feedback_cb: Closure::wrap(
                Box::new(|| dispatch_timer(TimerKey::Feedback)) as Box<dyn FnMut()>
            ),
            cue_cb: Closure::wrap(Box::new(|| dispatch_timer(TimerKey::Cue)) as Box<dyn FnMut()>),
            feedback_id: None,
            cue_id: None,
        }
    }
}

impl Default for WebScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for WebScheduler {
    fn schedule(&mut self, key: TimerKey, delay_ms: f64) {
        self.cancel(key);
        let Some(win) = window() else { return };
        let cb = match key {
            TimerKey::Feedback => &self.feedback_cb,
            TimerKey::Cue => &self.cue_cb,
        };
        let armed = win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            delay_ms as i32,
        );
        match armed {
            Ok(id) => match key {
                TimerKey::Feedback => self.feedback_id = Some(id),
                TimerKey::Cue => self.cue_id = Some(id),
            },
            Err(e) => warn(&format!("failed to arm {key:?} timer: {e:?}")),
        }
    }

    fn cancel(&mut self, key: TimerKey) {
        let id = match key {
            TimerKey::Feedback => self.feedback_id.take(),
            TimerKey::Cue => self.cue_id.take(),
        };
        if let (Some(id), Some(win)) = (id, window()) {
            win.clear_timeout_with_handle(id);
        }
    }
}

fn dispatch_timer(key: TimerKey) {
    GAME.with(|cell| {
        if let Some(game) = cell.borrow_mut().as_mut() {
            with_round_ctx(game, |controller, rctx| controller.on_timer(key, rctx));
        }
    });
}

// --- Audio -------------------------------------------------------------------

/// `<audio>`-element backed [`AudioPlayer`]. Clips that fail to load stay
/// silent; playback refusals are logged and swallowed.
pub struct WebAudioPlayer {
    clips: Vec<(CueId, HtmlAudioElement)>,
    last_gesture_ms: f64,
}

impl WebAudioPlayer {
    pub fn new(min_number: u32, max_number: u32) -> Self {
        let mut clips = Vec::new();
        for n in min_number..=max_number {
            if let Some(el) = load_clip(&format!("sounds/{n}.mp3")) {
                clips.push((CueId::Number(n), el));
            }
        }
        if let Some(el) = load_clip("sounds/good_job.mp3") {
            clips.push((CueId::Success, el));
        }
        if let Some(el) = load_clip("sounds/wrong_answer.mp3") {
            clips.push((CueId::Failure, el));
        }
        Self {
            clips,
            last_gesture_ms: f64::NEG_INFINITY,
        }
    }

    /// Record a user gesture; number cues are only audible near one.
    pub fn note_gesture(&mut self, now_ms: f64) {
        self.last_gesture_ms = now_ms;
    }
}

fn load_clip(src: &str) -> Option<HtmlAudioElement> {
    match HtmlAudioElement::new_with_src(src) {
        Ok(el) => {
            let src = src.to_string();
            let onerr = Closure::wrap(Box::new(move || {
                warn(&format!("failed to load sound: {src}"));
            }) as Box<dyn FnMut()>);
            el.set_onerror(Some(onerr.as_ref().unchecked_ref()));
            onerr.forget();
            Some(el)
        }
        Err(e) => {
            warn(&format!("could not create audio element for {src}: {e:?}"));
            None
        }
    }
}

impl AudioPlayer for WebAudioPlayer {
    fn play(&mut self, cue: CueId) {
        if matches!(cue, CueId::Number(_))
            && performance_now() - self.last_gesture_ms > GESTURE_WINDOW_MS
        {
            // Autoplay would be blocked anyway; skip quietly.
            log("skipping number cue: no recent user gesture");
            return;
        }
        let Some((_, el)) = self.clips.iter().find(|(id, _)| *id == cue) else {
            return;
        };
        el.set_current_time(0.0);
        if let Err(e) = el.play() {
            warn(&format!("audio playback failed: {e:?}"));
        }
    }
}

// --- Feedback line -----------------------------------------------------------

/// The `#feedback` status element, looked up on demand so DOM churn never
/// holds a stale handle.
pub struct DomFeedback;

impl DomFeedback {
    fn element() -> Option<Element> {
        window()?.document()?.get_element_by_id("feedback")
    }
}

impl FeedbackDisplay for DomFeedback {
    fn show(&mut self, kind: FeedbackKind) {
        let Some(el) = Self::element() else { return };
        let (text, class) = match kind {
            FeedbackKind::Correct => ("Good Job!", "feedback-correct"),
            FeedbackKind::Wrong => ("Wrong answer, try again", "feedback-wrong"),
        };
        el.set_text_content(Some(text));
        el.set_class_name(class);
    }

    fn clear(&mut self) {
        let Some(el) = Self::element() else { return };
        el.set_text_content(Some(""));
        el.set_class_name("");
    }
}

// --- Input & commands --------------------------------------------------------

fn install_pointer_handlers(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
    {
        let canvas_click = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::MouseEvent| {
            let rect = canvas_click.get_bounding_client_rect();
            let x = evt.client_x() as f64 - rect.left();
            let y = evt.client_y() as f64 - rect.top();
            handle_tap(x, y);
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    {
        let canvas_touch = canvas.clone();
        let closure = Closure::wrap(Box::new(move |evt: web_sys::TouchEvent| {
            // Keep a tap from scrolling/zooming the page.
            evt.prevent_default();
            if let Some(touch) = evt.touches().get(0) {
                let rect = canvas_touch.get_bounding_client_rect();
                let x = touch.client_x() as f64 - rect.left();
                let y = touch.client_y() as f64 - rect.top();
                handle_tap(x, y);
            }
        }) as Box<dyn FnMut(_)>);
        canvas.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn handle_tap(x: f64, y: f64) {
    GAME.with(|cell| {
        if let Some(game) = cell.borrow_mut().as_mut() {
            game.controller.audio.note_gesture(performance_now());
            game.controller.tap(x, y);
        }
    });
}

fn install_button_handlers(doc: &Document) -> Result<(), JsValue> {
    if let Some(start) = doc.get_element_by_id("start-button") {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    game.controller.audio.note_gesture(performance_now());
                    with_round_ctx(game, |controller, rctx| controller.start(rctx));
                    set_pause_label("Pause");
                }
            });
        }) as Box<dyn FnMut(_)>);
        start.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(pause) = doc.get_element_by_id("pause-button") {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    game.controller.audio.note_gesture(performance_now());
                    game.controller.toggle_pause();
                    set_pause_label(if game.controller.state() == GameState::Paused {
                        "Resume"
                    } else {
                        "Pause"
                    });
                }
            });
        }) as Box<dyn FnMut(_)>);
        pause.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }

    if let Some(exit) = doc.get_element_by_id("exit-button") {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            GAME.with(|cell| {
                if let Some(game) = cell.borrow_mut().as_mut() {
                    game.controller.exit_to_menu();
                    set_pause_label("Pause");
                }
            });
        }) as Box<dyn FnMut(_)>);
        exit.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
        closure.forget();
    }
    Ok(())
}

fn set_pause_label(label: &str) {
    if let Some(el) = window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("pause-button"))
    {
        el.set_text_content(Some(label));
    }
}

fn install_resize_handler(win: &web_sys::Window) -> Result<(), JsValue> {
    let closure = Closure::wrap(Box::new(move || {
        GAME.with(|cell| {
            if let Some(game) = cell.borrow_mut().as_mut() {
                fit_canvas_to_container(&game.canvas);
                if game.controller.state() != GameState::StartMenu {
                    draw_frame(game);
                }
            }
        });
    }) as Box<dyn FnMut()>);
    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

// --- Render loop -------------------------------------------------------------

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

fn start_render_loop() {
    let f: FrameCallback = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        GAME.with(|cell| {
            if let Some(game) = cell.borrow_mut().as_mut() {
                frame_tick(game);
            }
        });
        if let Some(w) = window() {
            let _ =
                w.request_animation_frame(f.borrow().as_ref().unwrap().as_ref().unchecked_ref());
        }
    }) as Box<dyn FnMut(f64)>));
    if let Some(w) = window() {
        let _ = w.request_animation_frame(g.borrow().as_ref().unwrap().as_ref().unchecked_ref());
    }
}

fn frame_tick(game: &mut Game) {
    if game.controller.state() != GameState::Paused {
        game.controller.advance_particles();
    }
    draw_frame(game);
}

fn draw_frame(game: &Game) {
    let ctx = &game.ctx;
    let w = game.canvas.width() as f64;
    let h = game.canvas.height() as f64;

    ctx.set_fill_style_str("white");
    ctx.fill_rect(0.0, 0.0, w, h);

    match game.controller.state() {
        GameState::StartMenu => {
            ctx.set_fill_style_str("black");
            ctx.set_font(&canvas_font(layout::feedback_font_px(w)));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.fill_text("Click 'Start' to Play!", w / 2.0, h / 2.0).ok();
        }
        GameState::Paused => {
            draw_numbers(game, w);
            ctx.set_fill_style_str("rgba(128,128,128,0.7)");
            ctx.fill_rect(0.0, 0.0, w, h);
            ctx.set_fill_style_str("white");
            ctx.set_font(&canvas_font(layout::number_font_px(w)));
            ctx.set_text_align("center");
            ctx.set_text_baseline("middle");
            ctx.fill_text("Paused", w / 2.0, h / 2.0).ok();
        }
        state => {
            draw_numbers(game, w);
            if state == GameState::CorrectFeedback {
                draw_particles(game);
            }
        }
    }
}

fn draw_numbers(game: &Game, canvas_w: f64) {
    let ctx = &game.ctx;
    ctx.set_font(&canvas_font(layout::number_font_px(canvas_w)));
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");
    for target in game.controller.targets() {
        ctx.set_fill_style_str(target.color.css());
        ctx.fill_text(&target.value.to_string(), target.center_x, target.center_y)
            .ok();
    }
}

fn draw_particles(game: &Game) {
    let ctx = &game.ctx;
    for p in game.controller.particles() {
        if !p.alive() {
            continue;
        }
        ctx.save();
        ctx.set_global_alpha(p.alpha);
        ctx.set_fill_style_str(p.color.css());
        ctx.fill_rect(p.x - p.size / 2.0, p.y - p.size / 2.0, p.size, p.size);
        ctx.restore();
    }
}
