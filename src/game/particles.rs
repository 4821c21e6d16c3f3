//! Confetti burst shown while correct-answer feedback is on screen.
//!
//! Plain ballistic squares: sideways scatter, downward bias, constant gravity,
//! linear alpha fade. The whole batch belongs to the feedback animation that
//! spawned it and is dropped when the game leaves that state.

use crate::game::layout::TargetColor;
use crate::game::rng::Rng;

/// Particles spawned per correct answer.
pub const BURST_SIZE: usize = 50;

const GRAVITY: f64 = 0.15;
const ALPHA_DECAY: f64 = 0.01;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub alpha: f64,
    pub color: TargetColor,
}

impl Particle {
    fn spawn(rng: &mut Rng, x: f64, y: f64, color: TargetColor) -> Self {
        Self {
            x,
            y,
            vx: rng.range_f64(-3.0, 3.0),
            vy: rng.range_f64(-1.0, 4.0),
            size: rng.range_f64(4.0, 9.0),
            alpha: 1.0,
            color,
        }
    }

    /// One physics step. Steps are frame-paced, not dt-scaled.
    pub fn step(&mut self) {
        self.vy += GRAVITY;
        self.x += self.vx;
        self.y += self.vy;
        self.alpha -= ALPHA_DECAY;
    }

    /// Faded-out particles are inert: never drawn, eligible for sweeping.
    pub fn alive(&self) -> bool {
        self.alpha > 0.0
    }
}

/// Fixed-size burst at a tapped target's center, inheriting its color.
pub fn burst(rng: &mut Rng, x: f64, y: f64, color: TargetColor) -> Vec<Particle> {
    (0..BURST_SIZE)
        .map(|_| Particle::spawn(rng, x, y, color))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_spawns_full_batch_at_center() {
        let mut rng = Rng::new(13);
        let batch = burst(&mut rng, 120.0, 80.0, TargetColor::Orange);
        assert_eq!(batch.len(), BURST_SIZE);
        for p in &batch {
            assert_eq!((p.x, p.y), (120.0, 80.0));
            assert_eq!(p.color, TargetColor::Orange);
            assert!((-3.0..3.0).contains(&p.vx));
            assert!((-1.0..4.0).contains(&p.vy));
            assert!((4.0..9.0).contains(&p.size));
            assert_eq!(p.alpha, 1.0);
        }
    }

    #[test]
    fn step_integrates_gravity_and_fades() {
        let mut p = Particle {
            x: 0.0,
            y: 0.0,
            vx: 2.0,
            vy: 1.0,
            size: 5.0,
            alpha: 1.0,
            color: TargetColor::Blue,
        };
        p.step();
        assert!((p.vy - 1.15).abs() < 1e-9);
        assert!((p.x - 2.0).abs() < 1e-9);
        assert!((p.y - 1.15).abs() < 1e-9);
        assert!((p.alpha - 0.99).abs() < 1e-9);
    }

    #[test]
    fn particle_goes_inert_when_faded() {
        let mut p = Particle {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            size: 5.0,
            alpha: 0.005,
            color: TargetColor::Red,
        };
        assert!(p.alive());
        p.step();
        assert!(!p.alive());
    }
}
