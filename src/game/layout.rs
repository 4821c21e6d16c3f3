//! Round layout: candidate number selection and non-overlapping placement of
//! tappable targets on the canvas, plus the hit test the input path uses.

use std::fmt;

use crate::game::rng::Rng;

/// Padding around a number's measured text box; the padded box is both the
/// collision footprint and the tap area.
pub const HIT_PADDING: f64 = 15.0;
/// Random placement attempts per value before giving up on that value.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

const NUMBER_FONT_BASE: f64 = 60.0;
const NUMBER_FONT_MIN: f64 = 24.0;
const FEEDBACK_FONT_BASE: f64 = 30.0;
const FEEDBACK_FONT_MIN: f64 = 18.0;

/// Number font scales with canvas width, clamped to stay legible.
pub fn number_font_px(canvas_w: f64) -> f64 {
    (canvas_w / 10.0).clamp(NUMBER_FONT_MIN, NUMBER_FONT_BASE)
}

/// Font for the start prompt and overlay captions.
pub fn feedback_font_px(canvas_w: f64) -> f64 {
    (canvas_w / 18.0).clamp(FEEDBACK_FONT_MIN, FEEDBACK_FONT_BASE)
}

/// Display colors a target can be assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetColor {
    Blue,
    Red,
    Green,
    Black,
    Orange,
    Purple,
}

pub const TARGET_COLORS: [TargetColor; 6] = [
    TargetColor::Blue,
    TargetColor::Red,
    TargetColor::Green,
    TargetColor::Black,
    TargetColor::Orange,
    TargetColor::Purple,
];

impl TargetColor {
    pub fn css(self) -> &'static str {
        match self {
            TargetColor::Blue => "#0000FF",
            TargetColor::Red => "#FF0000",
            TargetColor::Green => "#008000",
            TargetColor::Black => "#000000",
            TargetColor::Orange => "#FFA500",
            TargetColor::Purple => "#800080",
        }
    }
}

/// Axis-aligned box, top-left anchored.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.w && py >= self.y && py <= self.y + self.h
    }

    /// Strict AABB overlap; boxes that merely share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// One displayed number: center point for drawing, measured text extent, and
/// the padded hit box used for collision and tapping.
#[derive(Clone, Debug, PartialEq)]
pub struct Target {
    pub value: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub text_w: f64,
    pub text_h: f64,
    pub hit_rect: Rect,
    pub color: TargetColor,
}

/// Non-fatal layout degradation; the round proceeds with fewer targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlacementWarning {
    /// Canvas cannot fit even one padded box; placement was skipped outright.
    DegenerateCanvas,
    /// No overlap-free spot found for this value within the attempt budget.
    Unplaced { value: u32 },
}

impl fmt::Display for PlacementWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementWarning::DegenerateCanvas => {
                write!(f, "canvas too small for any target, skipping layout")
            }
            PlacementWarning::Unplaced { value } => {
                write!(f, "could not place number {value} without overlap")
            }
        }
    }
}

/// Text measurement capability. The shell backs this with canvas
/// `measure_text`; tests substitute a fixed metric.
pub trait TextMeasure {
    /// Returns (width, height) bounds of `text` at the given font size.
    fn measure(&self, text: &str, font_px: f64) -> (f64, f64);
}

/// Lay out one round: the target value plus distinct distractors, each in a
/// random overlap-free spot. Values that cannot be placed are skipped with a
/// warning rather than failing the round.
pub fn place_targets(
    rng: &mut Rng,
    measure: &dyn TextMeasure,
    font_px: f64,
    target: u32,
    range: (u32, u32),
    count: usize,
    canvas_w: f64,
    canvas_h: f64,
) -> (Vec<Target>, Vec<PlacementWarning>) {
    let values = pick_round_values(rng, target, range, count);

    let measured: Vec<(u32, f64, f64)> = values
        .iter()
        .map(|&v| {
            let (w, h) = measure.measure(&v.to_string(), font_px);
            (v, w, h)
        })
        .collect();

    // Degenerate canvas: if not even the narrowest candidate fits, bail out
    // before burning placement attempts.
    let fits_any = measured.iter().any(|&(_, w, h)| {
        w + HIT_PADDING * 2.0 <= canvas_w && h + HIT_PADDING * 2.0 <= canvas_h
    });
    if !fits_any {
        return (Vec::new(), vec![PlacementWarning::DegenerateCanvas]);
    }

    let mut placed: Vec<Target> = Vec::with_capacity(measured.len());
    let mut warnings = Vec::new();

    for (value, text_w, text_h) in measured {
        let span_w = canvas_w - text_w - HIT_PADDING * 2.0;
        let span_h = canvas_h - text_h - HIT_PADDING * 2.0;
        if span_w < 0.0 || span_h < 0.0 {
            // This value's box is wider than the canvas even though smaller
            // candidates fit; no amount of sampling helps.
            warnings.push(PlacementWarning::Unplaced { value });
            continue;
        }

        let mut attempts = 0;
        let mut done = false;
        while attempts < MAX_PLACEMENT_ATTEMPTS && !done {
            // Center constrained so the padded box lies fully inside the canvas.
            let cx = rng.next_f64() * span_w + HIT_PADDING + text_w / 2.0;
            let cy = rng.next_f64() * span_h + HIT_PADDING + text_h / 2.0;
            let hit_rect = Rect {
                x: cx - text_w / 2.0 - HIT_PADDING,
                y: cy - text_h / 2.0 - HIT_PADDING,
                w: text_w + HIT_PADDING * 2.0,
                h: text_h + HIT_PADDING * 2.0,
            };

            if !placed.iter().any(|t| t.hit_rect.overlaps(&hit_rect)) {
                placed.push(Target {
                    value,
                    center_x: cx,
                    center_y: cy,
                    text_w,
                    text_h,
                    hit_rect,
                    color: TARGET_COLORS[rng.index(TARGET_COLORS.len())],
                });
                done = true;
            }
            attempts += 1;
        }
        if !done {
            warnings.push(PlacementWarning::Unplaced { value });
        }
    }

    (placed, warnings)
}

/// The target plus up to `count - 1` distinct distractors drawn without
/// replacement, shuffled. Order carries no meaning beyond draw variety.
fn pick_round_values(rng: &mut Rng, target: u32, range: (u32, u32), count: usize) -> Vec<u32> {
    let mut values = Vec::with_capacity(count.max(1));
    values.push(target);

    let mut pool: Vec<u32> = (range.0..=range.1).filter(|&v| v != target).collect();
    let distractors = pool.len().min(count.saturating_sub(1));
    for _ in 0..distractors {
        let idx = rng.index(pool.len());
        values.push(pool.swap_remove(idx));
    }

    // Fisher-Yates
    for i in (1..values.len()).rev() {
        let j = rng.index(i + 1);
        values.swap(i, j);
    }
    values
}

/// Resolve a tap point to at most one target, most recently placed first.
pub fn hit_test(targets: &[Target], x: f64, y: f64) -> Option<usize> {
    targets
        .iter()
        .enumerate()
        .rev()
        .find(|(_, t)| t.hit_rect.contains(x, y))
        .map(|(i, _)| i)
}
