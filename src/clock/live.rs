use std::time::Instant;

use crate::foundation::error::{KasuError, KasuResult};
use crate::render::cpu::CpuSurface;
use crate::render::frame::FrameRGBA;
use crate::render::surface::{Surface, render_scene};
use crate::scene::model::Scene;

/// Default interval between smoothed fps reports.
pub const DEFAULT_FPS_REFRESH_SECS: f64 = 0.5;

/// Monotonic millisecond time source for the live path.
pub trait ClockSource {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> f64;
}

/// [`ClockSource`] backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Start counting from now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Result of one [`LiveClock::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveTick {
    /// Seconds since the epoch captured on the first tick.
    pub t_secs: f64,
    /// Smoothed frame rate, present only when the refresh interval has elapsed.
    pub fps_report: Option<f64>,
}

/// Wall-clock adapter: epoch plus a two-tap smoothed frame-rate estimate.
#[derive(Clone, Debug)]
pub struct LiveClock {
    fps_refresh_ms: f64,
    epoch_ms: Option<f64>,
    prev_ms: Option<f64>,
    fps_est: f64,
    reported_ms: f64,
}

impl LiveClock {
    /// Clock reporting fps at most once every `fps_refresh_secs`.
    pub fn new(fps_refresh_secs: f64) -> KasuResult<Self> {
        if !fps_refresh_secs.is_finite() || fps_refresh_secs < 0.0 {
            return Err(KasuError::validation(format!(
                "fps refresh interval must be finite and >= 0, got {fps_refresh_secs}"
            )));
        }
        Ok(Self {
            fps_refresh_ms: fps_refresh_secs * 1000.0,
            epoch_ms: None,
            prev_ms: None,
            fps_est: 0.0,
            reported_ms: 0.0,
        })
    }

    /// Advance to `now_ms`.
    ///
    /// The first tick after construction or [`LiveClock::reset`] becomes the epoch and yields
    /// `t = 0`.
    pub fn tick(&mut self, now_ms: f64) -> LiveTick {
        let epoch = *self.epoch_ms.get_or_insert_with(|| {
            self.reported_ms = now_ms;
            now_ms
        });

        let dt = now_ms - self.prev_ms.unwrap_or(now_ms);
        let inst = if dt > 0.0 { 1000.0 / dt } else { 0.0 };
        self.fps_est = (self.fps_est + inst) / 2.0;
        self.prev_ms = Some(now_ms);

        let fps_report = if now_ms - self.reported_ms >= self.fps_refresh_ms {
            self.reported_ms = now_ms;
            Some(self.fps_est)
        } else {
            None
        };

        LiveTick {
            t_secs: ((now_ms - epoch) / 1000.0).max(0.0),
            fps_report,
        }
    }

    /// Current smoothed estimate, whether or not it has been reported.
    pub fn fps_estimate(&self) -> f64 {
        self.fps_est
    }

    /// Forget the epoch and smoothing state.
    pub fn reset(&mut self) {
        self.epoch_ms = None;
        self.prev_ms = None;
        self.fps_est = 0.0;
        self.reported_ms = 0.0;
    }
}

impl Default for LiveClock {
    fn default() -> Self {
        Self {
            fps_refresh_ms: DEFAULT_FPS_REFRESH_SECS * 1000.0,
            epoch_ms: None,
            prev_ms: None,
            fps_est: 0.0,
            reported_ms: 0.0,
        }
    }
}

/// Generation of a live render loop. Ticks carrying an older generation are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LoopToken(u64);

impl LoopToken {
    /// Raw generation number.
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Output of one accepted live tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveFrame {
    /// Token to schedule the next tick with.
    pub token: LoopToken,
    /// Time the frame was rendered at.
    pub t_secs: f64,
    /// Smoothed fps, when due.
    pub fps_report: Option<f64>,
}

/// Live preview loop: owns its surface, the current scene snapshot and the live clock.
///
/// The host calls [`LivePreview::refresh`] (or [`LivePreview::on_refresh`] with its own
/// timestamp) once per display refresh, passing the token from the previous frame.
pub struct LivePreview<C: ClockSource = SystemClock> {
    source: C,
    clock: LiveClock,
    surface: CpuSurface,
    scene: Scene,
    generation: u64,
}

impl<C: ClockSource> LivePreview<C> {
    /// Preview `scene` on a `size x size` surface.
    pub fn new(source: C, clock: LiveClock, size: u32, scene: Scene) -> KasuResult<Self> {
        Ok(Self {
            source,
            clock,
            surface: CpuSurface::new(size)?,
            scene,
            generation: 0,
        })
    }

    /// Begin a new loop, invalidating every outstanding token.
    pub fn start(&mut self) -> LoopToken {
        self.generation += 1;
        self.clock.reset();
        tracing::debug!(generation = self.generation, "live preview started");
        LoopToken(self.generation)
    }

    /// Swap the scene snapshot and restart the loop.
    pub fn set_scene(&mut self, scene: Scene) -> LoopToken {
        self.scene = scene;
        self.surface.purge_caches();
        self.start()
    }

    /// Reacquire the surface at a new side length without restarting the clock.
    pub fn resize(&mut self, size: u32) -> KasuResult<()> {
        if size != self.surface.side() {
            self.surface = CpuSurface::new(size)?;
        }
        Ok(())
    }

    /// Whether `token` belongs to the current loop.
    pub fn is_current(&self, token: LoopToken) -> bool {
        token.0 == self.generation
    }

    /// Tick at the clock source's current time.
    pub fn refresh(&mut self, token: LoopToken) -> KasuResult<Option<LiveFrame>> {
        let now = self.source.now_ms();
        self.on_refresh(token, now)
    }

    /// Tick at `now_ms`. Stale tokens are a no-op returning `None`.
    pub fn on_refresh(&mut self, token: LoopToken, now_ms: f64) -> KasuResult<Option<LiveFrame>> {
        if !self.is_current(token) {
            return Ok(None);
        }
        let tick = self.clock.tick(now_ms);
        self.surface.clear()?;
        render_scene(&mut self.surface, &self.scene, tick.t_secs)?;
        if let Some(fps) = tick.fps_report {
            tracing::trace!(fps, "live fps");
        }
        Ok(Some(LiveFrame {
            token,
            t_secs: tick.t_secs,
            fps_report: tick.fps_report,
        }))
    }

    /// Pixels of the most recent frame.
    pub fn frame(&mut self) -> KasuResult<FrameRGBA> {
        self.surface.snapshot()
    }

    /// Current scene snapshot.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/live.rs"]
mod tests;
