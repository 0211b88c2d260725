use std::f32::consts::{PI, TAU};

use glam::{Mat3, Vec2};

use super::types::Planet;

const SHIP_SCALE: f32 = 0.3;
const LABEL_SCALE: f32 = 0.5;
const LABEL_OFFSET: Vec2 = Vec2::new(0.0, -0.5);

/// Circular flight path between two planets.
///
/// The circle passes through both planets with a radius equal to their
/// distance; ships travel the shorter arc, one step per turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ArcPath {
    center: Vec2,
    r: f32,
    a0: f32,
    ad: f32,
    distance: usize,
}

/// Wraps an angle into `[0, 2π)`.
fn wrap(angle: f32) -> f32 {
    angle.rem_euclid(TAU)
}

impl ArcPath {
    pub fn new(from: &Planet, to: &Planet) -> Self {
        let (p1, p2) = (Vec2::new(from.x, from.y), Vec2::new(to.x, to.y));
        let q = p1.distance(p2);
        if q == 0.0 {
            return Self { center: p1, r: 0.0, a0: 0.0, ad: 0.0, distance: 1 };
        }

        let r = q;
        let mid = (p1 + p2) / 2.0;
        let h = (r * r - (q / 2.0).powi(2)).sqrt();
        let center = mid + h * Vec2::new(p1.y - p2.y, p2.x - p1.x) / q;

        let a0 = wrap((center.y - p1.y).atan2(center.x - p1.x));
        let a2 = wrap((center.y - p2.y).atan2(center.x - p2.x));
        let mut ad = wrap(a0 - a2);
        if ad > PI {
            ad = wrap(a2 - a0);
        }

        Self { center, r, a0, ad, distance: q.ceil() as usize + 1 }
    }

    /// Arc length in turns.
    pub fn distance(&self) -> usize {
        self.distance
    }

    pub fn angle(&self, remaining: usize) -> f32 {
        self.a0 + (1.0 - remaining as f32 / self.distance as f32) * self.ad
    }

    /// Ship position with `remaining` turns to go.
    pub fn position(&self, remaining: usize) -> Vec2 {
        let alpha = self.angle(remaining);
        self.center - self.r * Vec2::new(alpha.cos(), alpha.sin())
    }

    /// Scaled, rotated ship transform.
    pub fn ship_transform(&self, remaining: usize) -> Mat3 {
        Mat3::from_scale_angle_translation(
            Vec2::splat(SHIP_SCALE),
            self.angle(remaining) + PI,
            self.position(remaining),
        )
    }

    /// Upright label transform, just below the ship.
    pub fn label_transform(&self, remaining: usize) -> Mat3 {
        Mat3::from_scale_angle_translation(Vec2::splat(LABEL_SCALE), 0.0, self.position(remaining) + LABEL_OFFSET)
    }

    /// `(now, next)` remaining counts for interpolation; next moves one
    /// step closer to the destination.
    pub fn steps(&self, remaining: usize) -> (usize, usize) {
        let now = remaining.min(self.distance);
        (now, now.saturating_sub(1))
    }
}
