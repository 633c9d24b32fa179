use std::io::{Read, Write as _};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;

use crate::encode::sink::{ContainerFormat, EncodeConfig, VideoCodec, VideoEncoder, check_frame};
use crate::foundation::core::Rgba8;
use crate::foundation::error::{KasuError, KasuResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::frame::FrameRGBA;

type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// Encoder that pipes raw frames through the system `ffmpeg` and collects the muxed container
/// from its stdout.
///
/// `ffmpeg` has no notion of premultiplied alpha, so frames are flattened over `background`
/// before they are written.
pub struct FfmpegEncoder {
    background: Rgba8,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout_drain: Option<Drain>,
    stderr_drain: Option<Drain>,
    scratch: Vec<u8>,
    cfg: Option<EncodeConfig>,
    last_ts: Option<f64>,
}

impl FfmpegEncoder {
    /// Encoder flattening alpha over opaque black.
    pub fn new() -> Self {
        Self::with_background(Rgba8::BLACK)
    }

    /// Encoder flattening alpha over `background`.
    pub fn with_background(background: Rgba8) -> Self {
        Self {
            background,
            child: None,
            stdin: None,
            stdout_drain: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_ts: None,
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn begin(&mut self, cfg: EncodeConfig) -> KasuResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(KasuError::encode("frame size must be non-zero"));
        }
        if self.child.is_some() {
            return Err(KasuError::encode("ffmpeg session already running"));
        }
        if !is_ffmpeg_on_path() {
            return Err(KasuError::encode(
                "ffmpeg is required for video export, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args(ffmpeg_args(&cfg));
        tracing::debug!(?cfg, "spawning ffmpeg");

        let mut child = cmd
            .spawn()
            .map_err(|e| KasuError::encode(format!("failed to spawn ffmpeg: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| KasuError::encode("failed to open ffmpeg stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| KasuError::encode("failed to open ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| KasuError::encode("failed to open ffmpeg stderr"))?;

        self.scratch = vec![0u8; cfg.width as usize * cfg.height as usize * 4];
        self.stdout_drain = Some(drain(stdout));
        self.stderr_drain = Some(drain(stderr));
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.cfg = Some(cfg);
        self.last_ts = None;
        Ok(())
    }

    fn push_frame(&mut self, frame: &FrameRGBA, timestamp_secs: f64) -> KasuResult<()> {
        let cfg = self
            .cfg
            .ok_or_else(|| KasuError::encode("ffmpeg session not started"))?;
        if let Some(last) = self.last_ts
            && timestamp_secs <= last
        {
            return Err(KasuError::encode(format!(
                "timestamps must strictly increase: {timestamp_secs} after {last}"
            )));
        }
        check_frame(&cfg, frame)?;
        self.last_ts = Some(timestamp_secs);

        if frame.premultiplied {
            flatten_premul_over_bg(&mut self.scratch, &frame.data, self.background)?;
        } else {
            flatten_straight_over_bg(&mut self.scratch, &frame.data, self.background)?;
        }

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| KasuError::encode("ffmpeg session is already finalized"))?;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| KasuError::encode(format!("failed to write frame to ffmpeg: {e}")))
    }

    fn finish(&mut self) -> KasuResult<Vec<u8>> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| KasuError::encode("ffmpeg session not started"))?;
        self.cfg = None;

        let status = child
            .wait()
            .map_err(|e| KasuError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let out = join_drain(self.stdout_drain.take(), "stdout")?;
        let err = join_drain(self.stderr_drain.take(), "stderr")?;

        if !status.success() {
            return Err(KasuError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                String::from_utf8_lossy(&err).trim()
            )));
        }
        if out.is_empty() {
            return Err(KasuError::encode("ffmpeg produced no output"));
        }
        Ok(out)
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        for handle in [self.stdout_drain.take(), self.stderr_drain.take()]
            .into_iter()
            .flatten()
        {
            let _ = handle.join();
        }
        self.cfg = None;
        self.last_ts = None;
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn ffmpeg_args(cfg: &EncodeConfig) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgba",
    ]
    .map(String::from)
    .to_vec();
    args.extend([
        "-s".to_owned(),
        format!("{}x{}", cfg.width, cfg.height),
        "-r".to_owned(),
        cfg.fps.get().to_string(),
        "-i".to_owned(),
        "pipe:0".to_owned(),
        "-an".to_owned(),
    ]);

    // yuv420p needs even dimensions.
    if cfg.width % 2 != 0 || cfg.height % 2 != 0 {
        args.extend(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"].map(String::from));
    }

    let codec: &[&str] = match cfg.codec {
        VideoCodec::Avc => &["-c:v", "libx264", "-preset", "medium", "-crf", "23"],
        VideoCodec::Vp9 => &["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "32"],
    };
    args.extend(codec.iter().map(|s| s.to_string()));
    args.extend(["-pix_fmt", "yuv420p"].map(String::from));

    // Output goes to a pipe, so MP4 has to be fragmented.
    let container: &[&str] = match cfg.format {
        ContainerFormat::Mp4 => &[
            "-movflags",
            "frag_keyframe+empty_moov+default_base_moof",
            "-f",
            "mp4",
        ],
        ContainerFormat::Webm => &["-f", "webm"],
    };
    args.extend(container.iter().map(|s| s.to_string()));
    args.push("pipe:1".to_owned());
    args
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        pipe.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

fn join_drain(handle: Option<Drain>, name: &str) -> KasuResult<Vec<u8>> {
    match handle {
        Some(h) => h
            .join()
            .map_err(|_| KasuError::encode(format!("ffmpeg {name} drain thread panicked")))?
            .map_err(|e| KasuError::encode(format!("ffmpeg {name} read failed: {e}"))),
        None => Ok(Vec::new()),
    }
}

fn flatten_premul_over_bg(dst: &mut [u8], src_premul: &[u8], bg: Rgba8) -> KasuResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(KasuError::encode(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    let bg = [u16::from(bg.r), u16::from(bg.g), u16::from(bg.b)];

    for (d, s) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(s[3]);
        for c in 0..3 {
            d[c] = (u16::from(s[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn flatten_straight_over_bg(dst: &mut [u8], src: &[u8], bg: Rgba8) -> KasuResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(KasuError::encode(
            "flatten expects equal-length rgba8 buffers",
        ));
    }
    let bg = [u16::from(bg.r), u16::from(bg.g), u16::from(bg.b)];

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        for c in 0..3 {
            d[c] = (mul_div255_u16(u16::from(s[c]), a) + mul_div255_u16(bg[c], 255 - a)).min(255)
                as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
