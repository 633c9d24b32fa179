use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::Arc;

use crate::assets::handle::{ImageHandle, ImageSource, rasterize_svg_to_premul_rgba8};
use crate::foundation::core::{Affine, Rect, Rgba8, Vec2};
use crate::foundation::error::{KasuError, KasuResult};
use crate::foundation::math::{premul_over_in_place, premul_over_px};
use crate::render::frame::FrameRGBA;
use crate::render::surface::Surface;

/// Paints kept per surface before the least recently used one is dropped.
const PAINT_CACHE_CAPACITY: usize = 16;

struct PaintCache<K> {
    paints: HashMap<K, vello_cpu::Image>,
    lru: VecDeque<K>,
    capacity: usize,
}

impl<K: Copy + Eq + Hash> PaintCache<K> {
    fn new(capacity: usize) -> Self {
        Self {
            paints: HashMap::new(),
            lru: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&mut self, key: K) -> Option<vello_cpu::Image> {
        let paint = self.paints.get(&key).cloned()?;
        self.touch(key);
        Some(paint)
    }

    fn insert(&mut self, key: K, paint: vello_cpu::Image) {
        self.paints.insert(key, paint);
        self.touch(key);
        while self.lru.len() > self.capacity {
            if let Some(old) = self.lru.pop_front() {
                self.paints.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: K) {
        if let Some(pos) = self.lru.iter().position(|k| *k == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }

    fn len(&self) -> usize {
        self.paints.len()
    }

    fn clear(&mut self) {
        self.paints.clear();
        self.lru.clear();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct VectorRasterKey {
    id: u64,
    width: u32,
    height: u32,
}

/// Square premultiplied RGBA8 surface rendered on the CPU with `vello_cpu`.
///
/// Image draws are recorded into a `vello_cpu` context and composited source-over onto the
/// committed pixels when the next fill, clear, or readback happens, so whatever was on the
/// surface before a draw stays visible underneath it.
pub struct CpuSurface {
    size: u16,
    pixmap: vello_cpu::Pixmap,
    scratch: vello_cpu::Pixmap,
    ctx: vello_cpu::RenderContext,
    pending: bool,
    transform: Affine,
    stack: Vec<Affine>,
    raster_cache: PaintCache<u64>,
    vector_cache: PaintCache<VectorRasterKey>,
}

impl CpuSurface {
    /// Acquire a transparent `size x size` surface.
    pub fn new(size: u32) -> KasuResult<Self> {
        let side: u16 = size
            .try_into()
            .map_err(|_| KasuError::surface(format!("surface size {size} exceeds u16")))?;
        if side == 0 {
            return Err(KasuError::surface("surface size must be non-zero"));
        }
        Ok(Self {
            size: side,
            pixmap: vello_cpu::Pixmap::new(side, side),
            scratch: vello_cpu::Pixmap::new(side, side),
            ctx: vello_cpu::RenderContext::new(side, side),
            pending: false,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
            raster_cache: PaintCache::new(PAINT_CACHE_CAPACITY),
            vector_cache: PaintCache::new(PAINT_CACHE_CAPACITY),
        })
    }

    /// Side length in pixels.
    pub fn side(&self) -> u32 {
        u32::from(self.size)
    }

    /// Read back the current pixels.
    pub fn snapshot(&mut self) -> KasuResult<FrameRGBA> {
        self.flush_pending()?;
        Ok(FrameRGBA {
            width: self.side(),
            height: self.side(),
            data: self.pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    /// Drop every cached image paint. Pending draws keep their own references.
    pub fn purge_caches(&mut self) {
        self.raster_cache.clear();
        self.vector_cache.clear();
    }

    /// Number of image paints currently cached.
    pub fn cached_paints(&self) -> usize {
        self.raster_cache.len() + self.vector_cache.len()
    }

    fn flush_pending(&mut self) -> KasuResult<()> {
        if !self.pending {
            return Ok(());
        }
        self.ctx.flush();
        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.render_to_pixmap(&mut self.scratch);
        self.ctx.reset();
        self.pending = false;
        premul_over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
        )
    }

    fn discard_pending(&mut self) {
        if self.pending {
            self.ctx.reset();
            self.pending = false;
        }
    }

    fn paint_for(&mut self, image: &ImageHandle, dest: Rect) -> KasuResult<vello_cpu::Image> {
        match image.source() {
            ImageSource::Raster(img) => {
                if let Some(paint) = self.raster_cache.get(image.id()) {
                    return Ok(paint);
                }
                let pixmap = premul_bytes_to_pixmap(&img.rgba8_premul, img.width, img.height)?;
                let paint = pixmap_paint(pixmap);
                self.raster_cache.insert(image.id(), paint.clone());
                Ok(paint)
            }
            ImageSource::Vector(svg) => {
                let key = VectorRasterKey {
                    id: image.id(),
                    width: raster_extent(dest.width())?,
                    height: raster_extent(dest.height())?,
                };
                if let Some(paint) = self.vector_cache.get(key) {
                    return Ok(paint);
                }
                let bytes = rasterize_svg_to_premul_rgba8(&svg.tree, key.width, key.height)?;
                let paint = pixmap_paint(premul_bytes_to_pixmap(&bytes, key.width, key.height)?);
                self.vector_cache.insert(key, paint.clone());
                Ok(paint)
            }
        }
    }
}

impl Surface for CpuSurface {
    fn size(&self) -> (u32, u32) {
        (self.side(), self.side())
    }

    fn clear(&mut self) -> KasuResult<()> {
        self.discard_pending();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        Ok(())
    }

    fn fill(&mut self, color: Rgba8) -> KasuResult<()> {
        self.flush_pending()?;
        let premul = color.to_premul().to_array();
        for px in self.pixmap.data_as_u8_slice_mut().chunks_exact_mut(4) {
            premul_over_px(px, premul);
        }
        Ok(())
    }

    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    fn translate(&mut self, offset: Vec2) {
        self.transform = self.transform * Affine::translate(offset);
    }

    fn rotate(&mut self, rad: f64) {
        self.transform = self.transform * Affine::rotate(rad);
    }

    fn draw_image(&mut self, image: &ImageHandle, dest: Rect) -> KasuResult<()> {
        if dest.width() <= 0.0 || dest.height() <= 0.0 {
            return Ok(());
        }
        let paint = self.paint_for(image, dest)?;
        let (w, h) = paint_size(&paint)?;

        let placement = self.transform
            * Affine::translate((dest.x0, dest.y0))
            * Affine::scale_non_uniform(dest.width() / w, dest.height() / h);

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(placement));
        self.ctx.set_paint(paint);
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));
        self.pending = true;
        Ok(())
    }
}

fn raster_extent(v: f64) -> KasuResult<u32> {
    const MAX_DIM: f64 = 16_384.0;
    let px = v.ceil().max(1.0);
    if !px.is_finite() || px > MAX_DIM {
        return Err(KasuError::surface(format!(
            "vector raster size too large: {v} (max {MAX_DIM})"
        )));
    }
    Ok(px as u32)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn pixmap_paint(pixmap: vello_cpu::Pixmap) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> KasuResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| KasuError::surface("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| KasuError::surface("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(KasuError::surface("image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        may_have_opacities |= px[3] != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

fn paint_size(image: &vello_cpu::Image) -> KasuResult<(f64, f64)> {
    match &image.image {
        vello_cpu::ImageSource::Pixmap(p) => Ok((f64::from(p.width()), f64::from(p.height()))),
        vello_cpu::ImageSource::OpaqueId(_) => Err(KasuError::surface(
            "cpu surface does not support opaque image ids",
        )),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
