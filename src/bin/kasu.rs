use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use kasu::{ContainerFormat, ExportDef, FrameRGBA, SceneDef};

#[derive(Parser, Debug)]
#[command(name = "kasu", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Export a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Run the live preview loop against the system clock.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Time in seconds.
    #[arg(long, default_value_t = 0.0)]
    t: f64,

    /// Output side length in pixels (defaults to the scene's export size).
    #[arg(long)]
    size: Option<u32>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output video path, or a directory to receive `kasu_video.<ext>`.
    #[arg(long)]
    out: PathBuf,

    /// Clip length in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Frames per second.
    #[arg(long)]
    fps: Option<u32>,

    /// Output side length in pixels.
    #[arg(long)]
    size: Option<u32>,

    /// Output container.
    #[arg(long, value_enum)]
    format: Option<ContainerFormat>,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Input scene JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// How long to run, in seconds.
    #[arg(long, default_value_t = 3.0)]
    seconds: f64,

    /// Surface side length in pixels.
    #[arg(long, default_value_t = 512)]
    size: u32,

    /// Target refresh rate of the simulated display.
    #[arg(long, default_value_t = 60)]
    refresh_hz: u32,

    /// Save the last rendered frame as a PNG.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn load(in_path: &Path) -> anyhow::Result<(SceneDef, kasu::Scene)> {
    let def = SceneDef::from_path(in_path)?;
    let assets_root = in_path.parent().unwrap_or_else(|| Path::new("."));
    let scene = def
        .load(assets_root)
        .with_context(|| format!("load scene '{}'", in_path.display()))?;
    Ok((def, scene))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (def, scene) = load(&args.in_path)?;
    let size = args.size.unwrap_or(def.export.size);

    let mut surface = kasu::CpuSurface::new(size)?;
    kasu::render_scene(&mut surface, &scene, args.t)?;
    let frame = surface.snapshot()?;

    write_png(&args.out, &frame)?;
    tracing::info!(path = %args.out.display(), t = args.t, size, "wrote frame");
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let (def, scene) = load(&args.in_path)?;
    let export = ExportDef {
        duration_sec: args.duration.unwrap_or(def.export.duration_sec),
        fps: args.fps.unwrap_or(def.export.fps),
        size: args.size.unwrap_or(def.export.size),
        format: args.format.unwrap_or(def.export.format),
    };
    let job = export.to_job()?;

    let mut encoder = kasu::FfmpegEncoder::new();
    let mut last_decile = None;
    let path = kasu::export_to_file(&scene, &job, &mut encoder, &args.out, |p| {
        let decile = (p.fraction() * 10.0).floor() as u32;
        if last_decile != Some(decile) {
            last_decile = Some(decile);
            tracing::info!(
                completed = p.completed,
                total = p.total,
                "exporting {}",
                p.percent_label()
            );
        }
    })?;

    tracing::info!(path = %path.display(), frames = job.total_frames(), "wrote video");
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.refresh_hz > 0, "--refresh-hz must be > 0");
    let (_, scene) = load(&args.in_path)?;

    let mut preview = kasu::LivePreview::new(
        kasu::SystemClock::new(),
        kasu::LiveClock::default(),
        args.size,
        scene,
    )?;
    let interval = Duration::from_secs_f64(1.0 / f64::from(args.refresh_hz));

    let mut token = preview.start();
    loop {
        let Some(tick) = preview.refresh(token)? else {
            break;
        };
        if let Some(fps) = tick.fps_report {
            tracing::info!(t = tick.t_secs, "{fps:.1} fps");
        }
        if tick.t_secs >= args.seconds {
            break;
        }
        token = tick.token;
        std::thread::sleep(interval);
    }

    if let Some(out) = &args.out {
        write_png(out, &preview.frame()?)?;
        tracing::info!(path = %out.display(), "wrote last preview frame");
    }
    Ok(())
}

fn write_png(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &frame.to_straight_rgba8(),
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", path.display()))
}
