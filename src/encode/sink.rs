use crate::foundation::core::Fps;
use crate::foundation::error::{KasuError, KasuResult};
use crate::render::frame::FrameRGBA;

/// Output container kind.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    /// MP4 with H.264.
    #[default]
    Mp4,
    /// WebM with VP9.
    Webm,
}

impl ContainerFormat {
    /// Codec used when the caller does not pick one.
    pub fn default_codec(self) -> VideoCodec {
        match self {
            Self::Mp4 => VideoCodec::Avc,
            Self::Webm => VideoCodec::Vp9,
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// MIME type of the finished buffer.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }
}

/// Video codec of the encoded stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// H.264 / AVC.
    Avc,
    /// VP9.
    Vp9,
}

/// Session parameters handed to [`VideoEncoder::begin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncodeConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frame rate.
    pub fps: Fps,
    /// Target container.
    pub format: ContainerFormat,
    /// Video codec, normally `format.default_codec()`.
    pub codec: VideoCodec,
}

impl EncodeConfig {
    /// Square `size x size` session with the container's default codec.
    pub fn square(size: u32, fps: Fps, format: ContainerFormat) -> Self {
        Self {
            width: size,
            height: size,
            fps,
            format,
            codec: format.default_codec(),
        }
    }
}

/// Encoder/muxer session.
///
/// Protocol: one `begin`, then `push_frame` with strictly increasing timestamps, then either
/// `finish` for the container bytes or `abort` to drop everything.
pub trait VideoEncoder {
    /// Open a session.
    fn begin(&mut self, cfg: EncodeConfig) -> KasuResult<()>;
    /// Submit one frame. Returns once the encoder has accepted it.
    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_secs: f64) -> KasuResult<()>;
    /// Close the session and return the finished container.
    fn finish(&mut self) -> KasuResult<Vec<u8>>;
    /// Drop the session and any partial output.
    fn abort(&mut self);
}

/// Encoder that keeps frames in memory, for tests and dry runs.
///
/// `finish` returns the concatenated frame bytes in submission order.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncodeConfig>,
    frames: Vec<(f64, FrameRGBA)>,
    fail_at: Option<usize>,
    aborted: bool,
}

impl InMemoryEncoder {
    /// Create an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the frame with zero-based submission index `frame`.
    pub fn fail_at(mut self, frame: usize) -> Self {
        self.fail_at = Some(frame);
        self
    }

    /// Configuration captured by `begin`, if a session is open.
    pub fn config(&self) -> Option<EncodeConfig> {
        self.cfg
    }

    /// Frames accepted so far, with their timestamps.
    pub fn frames(&self) -> &[(f64, FrameRGBA)] {
        &self.frames
    }

    /// Whether the last session ended in `abort`.
    pub fn was_aborted(&self) -> bool {
        self.aborted
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> KasuResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KasuError::encode("frame size must be non-zero"));
        }
        self.cfg = Some(cfg);
        self.frames.clear();
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_secs: f64) -> KasuResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| KasuError::encode("encoder session not started"))?;
        if self.fail_at == Some(self.frames.len()) {
            return Err(KasuError::encode(format!(
                "frame {} rejected",
                self.frames.len()
            )));
        }
        check_frame(&cfg, frame)?;
        if let Some((last, _)) = self.frames.last()
            && timestamp_secs <= *last
        {
            return Err(KasuError::encode("timestamps must strictly increase"));
        }
        self.frames.push((timestamp_secs, frame.clone()));
        Ok(())
    }

    fn finish(&mut self) -> KasuResult<Vec<u8>> {
        self.cfg
            .take()
            .ok_or_else(|| KasuError::encode("encoder session not started"))?;
        Ok(self
            .frames
            .iter()
            .flat_map(|(_, f)| f.data.iter().copied())
            .collect())
    }

    fn abort(&mut self) {
        self.cfg = None;
        self.frames.clear();
        self.aborted = true;
    }
}

pub(crate) fn check_frame(cfg: &EncodeConfig, frame: &FrameRGBA) -> KasuResult<()> {
    if frame.width != cfg.width || frame.height != cfg.height {
        return Err(KasuError::encode(format!(
            "frame size mismatch: got {}x{}, expected {}x{}",
            frame.width, frame.height, cfg.width, cfg.height
        )));
    }
    if frame.data.len() != cfg.width as usize * cfg.height as usize * 4 {
        return Err(KasuError::encode("frame data size mismatch with width*height*4"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
