//! Number Cue core crate.
//!
//! A single-screen listening game: a number is announced by audio, several
//! numbers appear on the canvas, and the player taps the one that was called.
//! All gameplay lives in the [`game`] module; `start_game()` is the JS-facing
//! entrypoint that boots the canvas, DOM controls and render loop.

use wasm_bindgen::prelude::*;

pub mod game;

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

// -----------------------------------------------------------------------------
// Re-export key types at crate root for convenience
// -----------------------------------------------------------------------------

pub use game::layout::{PlacementWarning, Rect, Target, TargetColor, TextMeasure};
pub use game::particles::Particle;
pub use game::rng::Rng;
pub use game::round::{
    AudioPlayer, CueId, FeedbackDisplay, FeedbackKind, GameConfig, GameController, GameState,
    RoundContext, Scheduler, TimerKey,
};

// -----------------------------------------------------------------------------
// Unified entrypoint
// -----------------------------------------------------------------------------

#[wasm_bindgen]
pub fn start_game() -> Result<(), JsValue> {
    game::boot()
}
