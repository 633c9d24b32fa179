use crate::assets::handle::ImageHandle;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{KasuError, KasuResult};
use crate::motion::orbit::Direction;
use crate::motion::period::Period;

/// Maximum number of instances in one ring.
pub const MAX_RING_COUNT: u32 = 100;
/// Default orbit radius as a fraction of the output side.
pub const DEFAULT_ORBIT_RADIUS: f64 = 0.4;
/// Default ellipse modulation period in seconds.
pub const DEFAULT_ELLIPSE_PERIOD_SECS: f64 = 0.5;

/// Scene-wide settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BaseConfig {
    /// Flat fill drawn over the whole output before any object.
    pub background: Rgba8,
}

/// The spinning image in the middle of the composition.
#[derive(Clone, Debug, PartialEq)]
pub struct CenterObject {
    image: ImageHandle,
    scale: f64,
    spin: Period,
}

impl CenterObject {
    /// Build a center object; `scale` must be in `[0, 1]`.
    pub fn new(image: ImageHandle, scale: f64, spin_period_secs: f64) -> KasuResult<Self> {
        Ok(Self {
            image,
            scale: check_unit("center scale", scale)?,
            spin: Period::from_secs("center spin period", spin_period_secs)?,
        })
    }

    /// Drawable handle.
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    /// Larger image dimension as a fraction of the output side.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Time for one full self-rotation.
    pub fn spin(&self) -> Period {
        self.spin
    }
}

/// A ring of `count` identical images orbiting the center.
#[derive(Clone, Debug, PartialEq)]
pub struct RingObject {
    image: ImageHandle,
    count: u32,
    scale: f64,
    orbit_period: Period,
    orbit_radius: f64,
    ellipse_period: Period,
    tilt_deg: f64,
    spin: Period,
    direction: Direction,
}

impl RingObject {
    /// Build a ring with `count` instances in `[1, 100]`.
    ///
    /// Other fields start at: scale `0.1`, orbit period `5 s`, orbit radius `0.4`, ellipse
    /// period `0.5 s`, tilt `0°`, spin period `1 s`, clockwise.
    pub fn new(image: ImageHandle, count: u32) -> KasuResult<Self> {
        if !(1..=MAX_RING_COUNT).contains(&count) {
            return Err(KasuError::validation(format!(
                "ring count must be in [1, {MAX_RING_COUNT}], got {count}"
            )));
        }
        Ok(Self {
            image,
            count,
            scale: 0.1,
            orbit_period: Period::from_secs("ring orbit period", 5.0)?,
            orbit_radius: DEFAULT_ORBIT_RADIUS,
            ellipse_period: Period::from_secs("ring ellipse period", DEFAULT_ELLIPSE_PERIOD_SECS)?,
            tilt_deg: 0.0,
            spin: Period::from_secs("ring spin period", 1.0)?,
            direction: Direction::Clockwise,
        })
    }

    /// Set the image scale, in `[0, 1]`.
    pub fn with_scale(mut self, scale: f64) -> KasuResult<Self> {
        self.scale = check_unit("ring scale", scale)?;
        Ok(self)
    }

    /// Set the orbit period in seconds; `0` freezes the instances at their phases.
    pub fn with_orbit_period(mut self, secs: f64) -> KasuResult<Self> {
        self.orbit_period = Period::from_secs("ring orbit period", secs)?;
        Ok(self)
    }

    /// Set the orbit radius as a fraction of the output side, in `[0, 1]`.
    pub fn with_orbit_radius(mut self, radius: f64) -> KasuResult<Self> {
        self.orbit_radius = check_unit("ring orbit radius", radius)?;
        Ok(self)
    }

    /// Set the ellipse modulation period in seconds; `0` pins the ellipse shape.
    pub fn with_ellipse_period(mut self, secs: f64) -> KasuResult<Self> {
        self.ellipse_period = Period::from_secs("ring ellipse period", secs)?;
        Ok(self)
    }

    /// Set the ellipse tilt in degrees, strictly inside `(-90, 90)`.
    pub fn with_tilt_deg(mut self, deg: f64) -> KasuResult<Self> {
        if !deg.is_finite() || deg.abs() >= 90.0 {
            return Err(KasuError::validation(format!(
                "ring tilt must be inside (-90, 90) degrees, got {deg}"
            )));
        }
        self.tilt_deg = deg;
        Ok(self)
    }

    /// Set the self-rotation period in seconds; `0` disables spinning.
    pub fn with_spin_period(mut self, secs: f64) -> KasuResult<Self> {
        self.spin = Period::from_secs("ring spin period", secs)?;
        Ok(self)
    }

    /// Drawable handle.
    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    /// Number of instances.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Larger image dimension as a fraction of the output side.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Time for one full orbit.
    pub fn orbit_period(&self) -> Period {
        self.orbit_period
    }

    /// Orbit radius as a fraction of the output side.
    pub fn orbit_radius(&self) -> f64 {
        self.orbit_radius
    }

    /// Ellipse modulation period.
    pub fn ellipse_period(&self) -> Period {
        self.ellipse_period
    }

    /// Ellipse tilt in degrees.
    pub fn tilt_deg(&self) -> f64 {
        self.tilt_deg
    }

    /// Time for one full self-rotation.
    pub fn spin(&self) -> Period {
        self.spin
    }

    /// Orbit direction, fixed by the scene slot the ring occupies.
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Everything drawn in one render: optional background, center object, and two rings.
///
/// Ring A always orbits clockwise and ring B anticlockwise.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    base: Option<BaseConfig>,
    center: Option<CenterObject>,
    ring_a: Option<RingObject>,
    ring_b: Option<RingObject>,
}

impl Scene {
    /// An empty scene; rendering it leaves the surface untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the output with `color` before drawing objects.
    pub fn with_background(mut self, color: Rgba8) -> Self {
        self.base = Some(BaseConfig { background: color });
        self
    }

    /// Set the center object.
    pub fn with_center(mut self, center: CenterObject) -> Self {
        self.center = Some(center);
        self
    }

    /// Place `ring` in slot A (clockwise).
    pub fn with_ring_a(mut self, mut ring: RingObject) -> Self {
        ring.direction = Direction::Clockwise;
        self.ring_a = Some(ring);
        self
    }

    /// Place `ring` in slot B (anticlockwise).
    pub fn with_ring_b(mut self, mut ring: RingObject) -> Self {
        ring.direction = Direction::Anticlockwise;
        self.ring_b = Some(ring);
        self
    }

    /// Scene-wide settings, if any.
    pub fn base(&self) -> Option<&BaseConfig> {
        self.base.as_ref()
    }

    /// Center object, if any.
    pub fn center(&self) -> Option<&CenterObject> {
        self.center.as_ref()
    }

    /// Ring A, if any.
    pub fn ring_a(&self) -> Option<&RingObject> {
        self.ring_a.as_ref()
    }

    /// Ring B, if any.
    pub fn ring_b(&self) -> Option<&RingObject> {
        self.ring_b.as_ref()
    }
}

fn check_unit(field: &str, v: f64) -> KasuResult<f64> {
    if !(0.0..=1.0).contains(&v) {
        return Err(KasuError::validation(format!(
            "{field} must be in [0, 1], got {v}"
        )));
    }
    Ok(v)
}
