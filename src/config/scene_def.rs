use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assets::color::ColorDef;
use crate::assets::handle::ImageHandle;
use crate::encode::sink::ContainerFormat;
use crate::export::job::{ExportJob, MAX_EXPORT_DURATION_SECS, MAX_EXPORT_FPS};
use crate::foundation::error::{KasuError, KasuResult};
use crate::scene::model::{
    CenterObject, DEFAULT_ELLIPSE_PERIOD_SECS, DEFAULT_ORBIT_RADIUS, MAX_RING_COUNT, RingObject,
    Scene,
};

const MAX_PERIOD_SECS: f64 = 60.0;
const MAX_MOVE_ANGLE_DEG: f64 = 45.0;

/// JSON scene document: every setting the composition exposes, plus an export block.
///
/// Absent objects are not drawn. An object without an `image` is skipped the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    /// Background fill; `None` leaves prior pixels untouched.
    #[serde(default)]
    pub bg_color: Option<ColorDef>,
    /// Spinning image in the middle.
    #[serde(default)]
    pub center: Option<CenterDef>,
    /// Clockwise ring.
    #[serde(default)]
    pub ring_a: Option<RingDef>,
    /// Anticlockwise ring.
    #[serde(default)]
    pub ring_b: Option<RingDef>,
    /// Video export settings.
    #[serde(default)]
    pub export: ExportDef,
}

/// Center object settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CenterDef {
    /// Image path, relative to the document's directory.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Larger side as a fraction of the output side.
    #[serde(default = "default_center_scale")]
    pub scale: f64,
    /// Spin period in seconds; `0` disables spinning.
    #[serde(default = "default_rot_speed")]
    pub rot_speed: f64,
}

impl Default for CenterDef {
    fn default() -> Self {
        Self {
            image: None,
            scale: default_center_scale(),
            rot_speed: default_rot_speed(),
        }
    }
}

/// Ring settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingDef {
    /// Image path, relative to the document's directory.
    #[serde(default)]
    pub image: Option<PathBuf>,
    /// Number of instances.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Larger side of each instance as a fraction of the output side.
    #[serde(default = "default_ring_scale")]
    pub scale: f64,
    /// Orbit period in seconds; `0` freezes the orbit.
    #[serde(default = "default_move_speed")]
    pub move_speed: f64,
    /// Orbit radius as a fraction of the output side.
    #[serde(default = "default_move_radius")]
    pub move_radius: f64,
    /// Ellipse modulation period in seconds; `0` holds a fixed ellipse.
    #[serde(default = "default_ellipse_ratio_speed")]
    pub ellipse_ratio_speed: f64,
    /// Tilt of the orbit path in degrees.
    #[serde(default)]
    pub move_angle: f64,
    /// Spin period in seconds; `0` disables spinning.
    #[serde(default = "default_rot_speed")]
    pub rot_speed: f64,
}

impl Default for RingDef {
    fn default() -> Self {
        Self {
            image: None,
            count: default_count(),
            scale: default_ring_scale(),
            move_speed: default_move_speed(),
            move_radius: default_move_radius(),
            ellipse_ratio_speed: default_ellipse_ratio_speed(),
            move_angle: 0.0,
            rot_speed: default_rot_speed(),
        }
    }
}

/// Export block of a scene document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportDef {
    /// Clip length in seconds.
    #[serde(default = "default_duration_sec")]
    pub duration_sec: f64,
    /// Frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Output side length in pixels, clamped into `[64, 3072]`.
    #[serde(default = "default_size")]
    pub size: u32,
    /// Output container.
    #[serde(default)]
    pub format: ContainerFormat,
}

impl Default for ExportDef {
    fn default() -> Self {
        Self {
            duration_sec: default_duration_sec(),
            fps: default_fps(),
            size: default_size(),
            format: ContainerFormat::default(),
        }
    }
}

impl ExportDef {
    /// Convert into an [`ExportJob`].
    pub fn to_job(&self) -> KasuResult<ExportJob> {
        ExportJob::new(self.size, self.duration_sec, self.fps, self.format)
    }
}

fn default_center_scale() -> f64 {
    0.25
}
fn default_ring_scale() -> f64 {
    0.1
}
fn default_rot_speed() -> f64 {
    1.0
}
fn default_count() -> u32 {
    20
}
fn default_move_speed() -> f64 {
    5.0
}
fn default_move_radius() -> f64 {
    DEFAULT_ORBIT_RADIUS
}
fn default_ellipse_ratio_speed() -> f64 {
    DEFAULT_ELLIPSE_PERIOD_SECS
}
fn default_duration_sec() -> f64 {
    10.0
}
fn default_fps() -> u32 {
    30
}
fn default_size() -> u32 {
    2048
}

impl SceneDef {
    /// Parse a scene document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> KasuResult<Self> {
        serde_json::from_reader(r).map_err(|e| KasuError::serde(format!("parse scene JSON: {e}")))
    }

    /// Parse a scene document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> KasuResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KasuError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Check every setting against the range the controls allow.
    pub fn validate(&self) -> KasuResult<()> {
        if let Some(center) = &self.center {
            check_range("center.scale", center.scale, 0.0, 1.0)?;
            check_range("center.rot_speed", center.rot_speed, 0.0, MAX_PERIOD_SECS)?;
        }
        for (name, ring) in [("ring_a", &self.ring_a), ("ring_b", &self.ring_b)] {
            let Some(ring) = ring else { continue };
            if !(1..=MAX_RING_COUNT).contains(&ring.count) {
                return Err(KasuError::validation(format!(
                    "{name}.count must be in [1, {MAX_RING_COUNT}], got {}",
                    ring.count
                )));
            }
            let field = |f: &str| format!("{name}.{f}");
            check_range(&field("scale"), ring.scale, 0.0, 1.0)?;
            check_range(&field("move_speed"), ring.move_speed, 0.0, MAX_PERIOD_SECS)?;
            check_range(&field("move_radius"), ring.move_radius, 0.0, 1.0)?;
            check_range(
                &field("ellipse_ratio_speed"),
                ring.ellipse_ratio_speed,
                0.0,
                MAX_PERIOD_SECS,
            )?;
            check_range(
                &field("move_angle"),
                ring.move_angle,
                -MAX_MOVE_ANGLE_DEG,
                MAX_MOVE_ANGLE_DEG,
            )?;
            check_range(&field("rot_speed"), ring.rot_speed, 0.0, MAX_PERIOD_SECS)?;
        }
        check_range(
            "export.duration_sec",
            self.export.duration_sec,
            0.0,
            MAX_EXPORT_DURATION_SECS,
        )?;
        if !(1..=MAX_EXPORT_FPS).contains(&self.export.fps) {
            return Err(KasuError::validation(format!(
                "export.fps must be in [1, {MAX_EXPORT_FPS}], got {}",
                self.export.fps
            )));
        }
        Ok(())
    }

    /// Validate, load images relative to `assets_root`, and build the [`Scene`].
    pub fn load(&self, assets_root: &Path) -> KasuResult<Scene> {
        self.validate()?;
        let mut scene = Scene::new();

        if let Some(bg) = self.bg_color {
            scene = scene.with_background(bg.to_rgba8());
        }
        if let Some(def) = &self.center
            && let Some(image) = open_image(assets_root, def.image.as_deref(), "center")?
        {
            scene = scene.with_center(CenterObject::new(image, def.scale, def.rot_speed)?);
        }
        if let Some(def) = &self.ring_a
            && let Some(ring) = build_ring(assets_root, def, "ring_a")?
        {
            scene = scene.with_ring_a(ring);
        }
        if let Some(def) = &self.ring_b
            && let Some(ring) = build_ring(assets_root, def, "ring_b")?
        {
            scene = scene.with_ring_b(ring);
        }
        Ok(scene)
    }
}

fn build_ring(assets_root: &Path, def: &RingDef, name: &str) -> KasuResult<Option<RingObject>> {
    let Some(image) = open_image(assets_root, def.image.as_deref(), name)? else {
        return Ok(None);
    };
    RingObject::new(image, def.count)?
        .with_scale(def.scale)?
        .with_orbit_period(def.move_speed)?
        .with_orbit_radius(def.move_radius)?
        .with_ellipse_period(def.ellipse_ratio_speed)?
        .with_tilt_deg(def.move_angle)?
        .with_spin_period(def.rot_speed)
        .map(Some)
}

fn open_image(
    assets_root: &Path,
    image: Option<&Path>,
    name: &str,
) -> KasuResult<Option<ImageHandle>> {
    let Some(rel) = image else {
        tracing::debug!(object = name, "no image, object skipped");
        return Ok(None);
    };
    ImageHandle::open(&assets_root.join(rel)).map(Some)
}

fn check_range(field: &str, v: f64, lo: f64, hi: f64) -> KasuResult<()> {
    if !(lo..=hi).contains(&v) {
        return Err(KasuError::validation(format!(
            "{field} must be in [{lo}, {hi}], got {v}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/config/scene_def.rs"]
mod tests;
