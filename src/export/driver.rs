use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::clock::sampled::SampledClock;
use crate::encode::sink::{EncodeConfig, VideoEncoder};
use crate::export::job::{ExportJob, ExportProgress};
use crate::foundation::error::KasuResult;
use crate::render::cpu::CpuSurface;
use crate::render::surface::{Surface, render_scene};
use crate::scene::model::Scene;

/// Render `scene` for every sampled instant of `job` and encode the frames.
///
/// Frames are produced strictly in order, one in flight. `on_progress` runs after each accepted
/// frame. On any failure the encoder session is aborted and the error returned; no partial buffer
/// escapes.
#[tracing::instrument(skip(scene, encoder, on_progress), fields(frames = job.total_frames()))]
pub fn export_video<E, F>(
    scene: &Scene,
    job: &ExportJob,
    encoder: &mut E,
    mut on_progress: F,
) -> KasuResult<Vec<u8>>
where
    E: VideoEncoder + ?Sized,
    F: FnMut(ExportProgress),
{
    let mut surface = CpuSurface::new(job.size_px())?;
    encoder.begin(EncodeConfig::square(job.size_px(), job.fps(), job.format()))?;

    let total = job.total_frames();
    let frames = SampledClock::new(job.fps(), total);
    let rendered = render_frames(scene, &mut surface, encoder, frames, total, &mut on_progress);

    match rendered.and_then(|()| encoder.finish()) {
        Ok(bytes) => {
            tracing::info!(bytes = bytes.len(), "export finished");
            Ok(bytes)
        }
        Err(err) => {
            tracing::warn!(error = %err, "export aborted");
            encoder.abort();
            Err(err)
        }
    }
}

fn render_frames<E, F>(
    scene: &Scene,
    surface: &mut CpuSurface,
    encoder: &mut E,
    frames: SampledClock,
    total: u64,
    on_progress: &mut F,
) -> KasuResult<()>
where
    E: VideoEncoder + ?Sized,
    F: FnMut(ExportProgress),
{
    for (idx, t) in frames {
        surface.clear()?;
        render_scene(surface, scene, t)?;
        let frame = surface.snapshot()?;
        encoder.push_frame(&frame, t)?;
        tracing::debug!(frame = idx.0, t, "frame encoded");
        on_progress(ExportProgress {
            completed: idx.0 + 1,
            total,
        });
    }
    Ok(())
}

/// Run [`export_video`] and write the container to `out_path` once it succeeded.
///
/// A directory `out_path` receives the job's default file name. Returns the written path.
pub fn export_to_file<E, F>(
    scene: &Scene,
    job: &ExportJob,
    encoder: &mut E,
    out_path: &Path,
    on_progress: F,
) -> KasuResult<PathBuf>
where
    E: VideoEncoder + ?Sized,
    F: FnMut(ExportProgress),
{
    let path = if out_path.is_dir() {
        out_path.join(job.file_name())
    } else {
        out_path.to_path_buf()
    };

    let bytes = export_video(scene, job, encoder, on_progress)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    std::fs::write(&path, &bytes)
        .with_context(|| format!("failed to write video '{}'", path.display()))?;
    Ok(path)
}

#[cfg(test)]
#[path = "../../tests/unit/export/driver.rs"]
mod tests;
