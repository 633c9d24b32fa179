use crate::assets::handle::ImageHandle;
use crate::foundation::core::{Rect, Rgba8, Vec2};
use crate::foundation::error::KasuResult;
use crate::scene::compose::{DrawOp, compose};
use crate::scene::model::Scene;

/// A 2D drawing target with a save/restore transform stack.
///
/// Transforms compose like a canvas context: `translate` then `rotate` maps local points
/// through the rotation first.
pub trait Surface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);
    /// Reset every pixel to transparent.
    fn clear(&mut self) -> KasuResult<()>;
    /// Composite `color` over the whole surface.
    fn fill(&mut self, color: Rgba8) -> KasuResult<()>;
    /// Push the current transform.
    fn save(&mut self);
    /// Pop the transform pushed by the matching [`Surface::save`].
    fn restore(&mut self);
    /// Append a translation to the current transform.
    fn translate(&mut self, offset: Vec2);
    /// Append a rotation (radians) to the current transform.
    fn rotate(&mut self, rad: f64);
    /// Draw `image` stretched into `dest` under the current transform.
    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) -> KasuResult<()>;
}

/// Apply a composed draw list to `surface`.
///
/// Each image placement is wrapped in `save`/`restore`, so the surface transform is unchanged
/// when this returns.
pub fn render_ops(surface: &mut dyn Surface, ops: &[DrawOp]) -> KasuResult<()> {
    for op in ops {
        match op {
            DrawOp::Fill(color) => surface.fill(*color)?,
            DrawOp::Image(instr) => {
                surface.save();
                surface.translate(instr.center.to_vec2());
                surface.rotate(instr.rotation_rad);
                let drawn = surface.draw_image(&instr.image, instr.local_rect());
                surface.restore();
                drawn?;
            }
        }
    }
    Ok(())
}

/// Compose `scene` at time `t` for the surface's side length and draw it.
pub fn render_scene(surface: &mut dyn Surface, scene: &Scene, t: f64) -> KasuResult<()> {
    let (width, _) = surface.size();
    let ops = compose(scene, f64::from(width), t);
    render_ops(surface, &ops)
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
