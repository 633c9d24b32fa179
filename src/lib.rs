//! Kasu renders an orbiting composition: a spinning center image surrounded by two rings of
//! images travelling on tilted, breathing ellipses.
//!
//! The crate is split along one seam: a pure `(Scene, t) -> pixels` path, and the time sources
//! that feed it `t`.
//!
//! - Build a [`Scene`] directly or load one from a JSON [`SceneDef`]
//! - Render single frames with [`render_scene`] onto a [`CpuSurface`]
//! - Drive a [`LivePreview`] from a wall clock, or export a video with [`export_video`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod clock;
mod config;
mod encode;
mod export;
mod foundation;
mod motion;
mod render;
mod scene;

pub use crate::foundation::core::{Affine, Fps, FrameIndex, Point, Rect, Rgba8, Rgba8Premul, Vec2};
pub use crate::foundation::error::{KasuError, KasuResult};

pub use crate::assets::color::{ColorDef, parse_color};
pub use crate::assets::handle::{ImageHandle, ImageSource, RasterImage, VectorImage};
pub use crate::clock::live::{
    ClockSource, DEFAULT_FPS_REFRESH_SECS, LiveClock, LiveFrame, LivePreview, LiveTick, LoopToken,
    SystemClock,
};
pub use crate::clock::sampled::SampledClock;
pub use crate::config::scene_def::{CenterDef, ExportDef, RingDef, SceneDef};
pub use crate::encode::ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::encode::sink::{
    ContainerFormat, EncodeConfig, InMemoryEncoder, VideoCodec, VideoEncoder,
};
pub use crate::export::driver::{export_to_file, export_video};
pub use crate::export::job::{
    ExportJob, ExportProgress, MAX_EXPORT_DURATION_SECS, MAX_EXPORT_FPS, MAX_EXPORT_SIZE_PX,
    MIN_EXPORT_SIZE_PX,
};
pub use crate::motion::orbit::{
    Direction, OrbitParams, STATIC_ELLIPSE_FACTOR, ellipse_factor, instance_phase, orbit_angle,
    spin_angle,
};
pub use crate::motion::period::{Period, PositiveSecs};
pub use crate::render::cpu::CpuSurface;
pub use crate::render::frame::FrameRGBA;
pub use crate::render::surface::{Surface, render_ops, render_scene};
pub use crate::scene::compose::{DrawInstruction, DrawOp, compose, fit_to_scale};
pub use crate::scene::model::{
    BaseConfig, CenterObject, DEFAULT_ELLIPSE_PERIOD_SECS, DEFAULT_ORBIT_RADIUS, MAX_RING_COUNT,
    RingObject, Scene,
};
