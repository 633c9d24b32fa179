use std::path::Path;
use std::sync::{Arc, OnceLock};

use anyhow::Context;

use crate::foundation::error::{KasuError, KasuResult};
use crate::foundation::math::{Fnv1a64, mul_div255_u8};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Parsed vector image.
#[derive(Clone, Debug)]
pub struct VectorImage {
    /// Parsed SVG tree.
    pub tree: Arc<usvg::Tree>,
}

/// The two kinds of drawable image a handle can carry.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Bitmap image; intrinsic size is its pixel dimensions.
    Raster(RasterImage),
    /// SVG image; intrinsic size comes from its own width/height metadata.
    Vector(VectorImage),
}

#[derive(Debug)]
struct ImageInner {
    id: u64,
    source: ImageSource,
}

/// Opaque, cheaply clonable drawable handle.
///
/// The identity returned by [`ImageHandle::id`] is derived from the source bytes, so two handles
/// built from the same file compare equal and share renderer caches.
#[derive(Clone, Debug)]
pub struct ImageHandle(Arc<ImageInner>);

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl ImageHandle {
    /// Decode PNG/JPEG/... bytes with the `image` crate.
    pub fn decode_raster(bytes: &[u8]) -> KasuResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba8(width, height, rgba.into_raw())
    }

    /// Build a raster handle from straight-alpha RGBA8 pixels.
    pub fn from_rgba8(width: u32, height: u32, mut rgba8: Vec<u8>) -> KasuResult<Self> {
        if width == 0 || height == 0 {
            return Err(KasuError::validation("image width/height must be non-zero"));
        }
        if rgba8.len() != width as usize * height as usize * 4 {
            return Err(KasuError::validation(format!(
                "rgba8 byte length {} does not match {width}x{height}",
                rgba8.len()
            )));
        }

        let mut h = Fnv1a64::new_default();
        h.write_u8(b'r');
        h.write_u32(width);
        h.write_u32(height);
        h.write_bytes(&rgba8);

        premultiply_rgba8_in_place(&mut rgba8);
        Ok(Self(Arc::new(ImageInner {
            id: h.finish(),
            source: ImageSource::Raster(RasterImage {
                width,
                height,
                rgba8_premul: Arc::new(rgba8),
            }),
        })))
    }

    /// Parse SVG bytes with `usvg`. Text is shaped with the system fonts.
    pub fn parse_svg(bytes: &[u8]) -> KasuResult<Self> {
        Self::parse_svg_in(bytes, None)
    }

    /// Parse SVG bytes, resolving relative `href`s against `resources_dir`.
    pub fn parse_svg_in(bytes: &[u8], resources_dir: Option<&Path>) -> KasuResult<Self> {
        let opts = usvg::Options {
            resources_dir: resources_dir.map(Path::to_path_buf),
            fontdb: system_fontdb(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

        let mut h = Fnv1a64::new_default();
        h.write_u8(b'v');
        h.write_bytes(bytes);

        Ok(Self(Arc::new(ImageInner {
            id: h.finish(),
            source: ImageSource::Vector(VectorImage {
                tree: Arc::new(tree),
            }),
        })))
    }

    /// Build a handle from encoded bytes.
    ///
    /// `hint` is a file extension; without one, bytes that look like XML are treated as SVG.
    pub fn from_bytes(bytes: &[u8], hint: Option<&str>) -> KasuResult<Self> {
        let is_svg = match hint {
            Some(ext) => ext.eq_ignore_ascii_case("svg"),
            None => looks_like_svg(bytes),
        };
        if is_svg {
            Self::parse_svg(bytes)
        } else {
            Self::decode_raster(bytes)
        }
    }

    /// Load an image file; `.svg` files are parsed as vectors, everything else is decoded.
    pub fn open(path: &Path) -> KasuResult<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        let ext = path.extension().and_then(|e| e.to_str());
        let handle = if ext.is_some_and(|e| e.eq_ignore_ascii_case("svg")) {
            Self::parse_svg_in(&bytes, path.parent())
        } else {
            Self::from_bytes(&bytes, ext)
        };
        handle.map_err(|e| {
            KasuError::Other(anyhow::anyhow!("load image '{}': {e}", path.display()))
        })
    }

    /// Stable identity of the underlying image.
    pub fn id(&self) -> u64 {
        self.0.id
    }

    /// Borrow the decoded source.
    pub fn source(&self) -> &ImageSource {
        &self.0.source
    }

    /// Natural `(width, height)` of the image in its own units.
    pub fn intrinsic_size(&self) -> (f64, f64) {
        match &self.0.source {
            ImageSource::Raster(img) => (f64::from(img.width), f64::from(img.height)),
            ImageSource::Vector(svg) => {
                let size = svg.tree.size();
                (f64::from(size.width()), f64::from(size.height()))
            }
        }
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(256)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    text.starts_with("<svg") || text.starts_with("<?xml")
}

fn system_fontdb() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u8(u16::from(*c), a);
        }
    }
}

/// Rasterize a vector image to premultiplied RGBA8 at exactly `width x height`.
pub(crate) fn rasterize_svg_to_premul_rgba8(
    tree: &usvg::Tree,
    width: u32,
    height: u32,
) -> KasuResult<Vec<u8>> {
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| KasuError::surface("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Ok(pixmap.data().to_vec())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/handle.rs"]
mod tests;
