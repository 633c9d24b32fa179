use crate::encode::sink::ContainerFormat;
use crate::foundation::core::Fps;
use crate::foundation::error::{KasuError, KasuResult};

/// Smallest exported side length; smaller requests are raised to it.
pub const MIN_EXPORT_SIZE_PX: u32 = 64;
/// Largest exported side length; larger requests are lowered to it.
pub const MAX_EXPORT_SIZE_PX: u32 = 3072;
/// Longest exportable clip.
pub const MAX_EXPORT_DURATION_SECS: f64 = 60.0;
/// Highest export frame rate.
pub const MAX_EXPORT_FPS: u32 = 60;

/// Parameters of one video export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportJob {
    size_px: u32,
    duration_secs: f64,
    fps: Fps,
    format: ContainerFormat,
}

impl ExportJob {
    /// Build a job. `size_px` is clamped into `[64, 3072]`; duration and fps are validated.
    pub fn new(
        size_px: u32,
        duration_secs: f64,
        fps: u32,
        format: ContainerFormat,
    ) -> KasuResult<Self> {
        if !(0.0..=MAX_EXPORT_DURATION_SECS).contains(&duration_secs) {
            return Err(KasuError::validation(format!(
                "export duration must be in [0, {MAX_EXPORT_DURATION_SECS}] s, got {duration_secs}"
            )));
        }
        if fps > MAX_EXPORT_FPS {
            return Err(KasuError::validation(format!(
                "export fps must be in [1, {MAX_EXPORT_FPS}], got {fps}"
            )));
        }
        Ok(Self {
            size_px: size_px.clamp(MIN_EXPORT_SIZE_PX, MAX_EXPORT_SIZE_PX),
            duration_secs,
            fps: Fps::new(fps)?,
            format,
        })
    }

    /// Output side length in pixels.
    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Export frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output container.
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// `floor(duration * fps)`.
    pub fn total_frames(&self) -> u64 {
        self.fps.secs_to_frames_floor(self.duration_secs)
    }

    /// Conventional download name, e.g. `kasu_video.mp4`.
    pub fn file_name(&self) -> String {
        format!("kasu_video.{}", self.format.extension())
    }
}

impl Default for ExportJob {
    fn default() -> Self {
        Self {
            size_px: 2048,
            duration_secs: 10.0,
            fps: Fps::THIRTY,
            format: ContainerFormat::Mp4,
        }
    }
}

/// Frames finished out of the total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportProgress {
    /// Frames submitted and accepted so far.
    pub completed: u64,
    /// Frames in the whole export.
    pub total: u64,
}

impl ExportProgress {
    /// Completion in `[0, 1]`. An empty export counts as complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.completed as f64 / self.total as f64
    }

    /// Percentage to three significant digits, e.g. `"12.3%"`, `"5.00%"`, `"100%"`.
    ///
    /// An empty export reads `"0.0%"`.
    pub fn percent_label(&self) -> String {
        if self.total == 0 {
            return "0.0%".to_owned();
        }
        let pct = self.fraction() * 100.0;
        if pct == 0.0 {
            return "0.00%".to_owned();
        }
        let int_digits = pct.abs().log10().floor() as i32 + 1;
        let mut decimals = (3 - int_digits).max(0) as usize;
        let mut label = format!("{pct:.decimals$}");
        // Rounding may carry into a new leading digit, e.g. 9.996 -> 10.00.
        let carried = label
            .parse::<f64>()
            .is_ok_and(|r| r.abs() >= 10f64.powi(int_digits));
        if decimals > 0 && carried {
            decimals -= 1;
            label = format!("{pct:.decimals$}");
        }
        label.push('%');
        label
    }
}
