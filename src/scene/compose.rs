use crate::assets::handle::ImageHandle;
use crate::foundation::core::{Point, Rect, Rgba8, Vec2};
use crate::motion::orbit::{OrbitParams, spin_angle};
use crate::scene::model::{RingObject, Scene};

/// One image placement: translate to `center`, rotate by `rotation_rad`, draw centered.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawInstruction {
    /// Image to draw.
    pub image: ImageHandle,
    /// Placement origin in canvas pixels.
    pub center: Point,
    /// Destination width in pixels.
    pub width: f64,
    /// Destination height in pixels.
    pub height: f64,
    /// Self-rotation about `center`, in radians.
    pub rotation_rad: f64,
}

impl DrawInstruction {
    /// Unrotated destination rectangle in canvas space.
    pub fn dest_rect(&self) -> Rect {
        Rect::from_center_size(self.center, (self.width, self.height))
    }

    /// Destination rectangle relative to the placement origin.
    pub fn local_rect(&self) -> Rect {
        Rect::from_center_size(Point::ORIGIN, (self.width, self.height))
    }
}

/// A single step of a composed frame.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// Flat fill of the whole output.
    Fill(Rgba8),
    /// Image placement.
    Image(DrawInstruction),
}

/// Fit an image of natural size `(w, h)` so its larger side is `scale * size`.
pub fn fit_to_scale(natural: (f64, f64), scale: f64, size: f64) -> (f64, f64) {
    let (w, h) = natural;
    let aspect = w / h;
    let side = size * scale;
    if aspect >= 1.0 {
        (side, side / aspect)
    } else {
        (side * aspect, side)
    }
}

/// Compose the draw list of `scene` for a square output of `size` pixels at time `t` seconds.
///
/// Order: background, center, every instance of ring A, every instance of ring B.
pub fn compose(scene: &Scene, size: f64, t: f64) -> Vec<DrawOp> {
    let ring_len = |r: Option<&RingObject>| r.map_or(0, |r| r.count() as usize);
    let mut ops = Vec::with_capacity(2 + ring_len(scene.ring_a()) + ring_len(scene.ring_b()));

    if let Some(base) = scene.base() {
        ops.push(DrawOp::Fill(base.background));
    }

    let mid = Point::new(size / 2.0, size / 2.0);

    if let Some(center) = scene.center() {
        let (width, height) = fit_to_scale(center.image().intrinsic_size(), center.scale(), size);
        ops.push(DrawOp::Image(DrawInstruction {
            image: center.image().clone(),
            center: mid,
            width,
            height,
            rotation_rad: spin_angle(center.spin(), t),
        }));
    }

    for ring in [scene.ring_a(), scene.ring_b()].into_iter().flatten() {
        push_ring(&mut ops, ring, mid, size, t);
    }

    ops
}

fn push_ring(ops: &mut Vec<DrawOp>, ring: &RingObject, mid: Point, size: f64, t: f64) {
    let (width, height) = fit_to_scale(ring.image().intrinsic_size(), ring.scale(), size);
    let params = OrbitParams {
        radius_px: ring.orbit_radius() * size,
        orbit_period: ring.orbit_period(),
        ellipse_period: ring.ellipse_period(),
        tilt_rad: ring.tilt_deg().to_radians(),
        direction: ring.direction(),
    };
    let rotation_rad = spin_angle(ring.spin(), t);

    for i in 0..ring.count() {
        let offset: Vec2 = params.offset(i, ring.count(), t);
        ops.push(DrawOp::Image(DrawInstruction {
            image: ring.image().clone(),
            center: mid + offset,
            width,
            height,
            rotation_rad,
        }));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/compose.rs"]
mod tests;
