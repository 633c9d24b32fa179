//! Orbit geometry for ring instances.
//!
//! All functions are pure in `(parameters, t)`; `t` is in seconds.
//!
//! The tilt compensation factor `1 / |cos(tilt)|` diverges as the tilt approaches ±90°, so
//! callers must keep the tilt strictly inside `(-90°, 90°)`. This module does not re-check it.

use std::f64::consts::{PI, TAU};

use crate::foundation::core::Vec2;
use crate::motion::period::Period;

/// Ellipse factor used when the ellipse modulation period is static.
pub const STATIC_ELLIPSE_FACTOR: f64 = 0.75;

/// Orbit direction of a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Ring A.
    Clockwise,
    /// Ring B.
    Anticlockwise,
}

impl Direction {
    /// Multiplier applied to the orbit angular velocity.
    pub fn sign(self) -> f64 {
        match self {
            Self::Clockwise => -1.0,
            Self::Anticlockwise => 1.0,
        }
    }
}

/// Constant phase of instance `i` out of `n`: `2πi / n`.
///
/// `n` must be at least 1.
pub fn instance_phase(i: u32, n: u32) -> f64 {
    debug_assert!(n >= 1, "ring count must be >= 1");
    TAU * f64::from(i) / f64::from(n)
}

/// Angular position on the orbit at time `t`.
pub fn orbit_angle(orbit: Period, direction: Direction, phase: f64, t: f64) -> f64 {
    orbit.angle_at(t) * direction.sign() + phase
}

/// Ellipse modulation argument: `πt / period`, or [`STATIC_ELLIPSE_FACTOR`] when static.
///
/// Only its sine and cosine are used, so the ring cycles vertical ellipse -> circle ->
/// horizontal ellipse and back every `2 * period` seconds.
pub fn ellipse_factor(period: Period, t: f64) -> f64 {
    match period {
        Period::Static => STATIC_ELLIPSE_FACTOR,
        Period::Finite(p) => PI * t / p.get(),
    }
}

/// Self-rotation angle at time `t`; `0` when the spin period is static.
pub fn spin_angle(spin: Period, t: f64) -> f64 {
    spin.angle_at(t)
}

/// Resolved orbit parameters of one ring for a given output size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitParams {
    /// Orbit radius in pixels (`orbit_radius * size`).
    pub radius_px: f64,
    /// Time for one full orbit.
    pub orbit_period: Period,
    /// Half-cycle of the ellipse modulation.
    pub ellipse_period: Period,
    /// Tilt of the ellipse in radians, strictly inside `(-π/2, π/2)`.
    pub tilt_rad: f64,
    /// Orbit direction.
    pub direction: Direction,
}

impl OrbitParams {
    /// Offset from the composition center of instance `i` of `n` at time `t`.
    pub fn offset(&self, i: u32, n: u32, t: f64) -> Vec2 {
        let theta = orbit_angle(
            self.orbit_period,
            self.direction,
            instance_phase(i, n),
            t,
        );
        let e = ellipse_factor(self.ellipse_period, t);
        let (sin_tilt, cos_tilt) = self.tilt_rad.sin_cos();
        let k = 1.0 / cos_tilt.abs();

        let raw_x = theta.sin() * self.radius_px * e.sin() * k;
        let raw_y = theta.cos() * self.radius_px * e.cos() * k;

        Vec2::new(
            raw_x * cos_tilt - raw_y * sin_tilt,
            raw_x * sin_tilt + raw_y * cos_tilt,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/motion/orbit.rs"]
mod tests;
