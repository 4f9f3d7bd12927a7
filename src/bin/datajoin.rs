use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

use datajoin::{
    Chart, ChartConfig, ChartKind, DataSet, Ease, Mark, Millis, Point, SvgRenderer, rasterize_svg,
    write_png,
};

#[derive(Parser, Debug)]
#[command(name = "datajoin", version)]
#[command(about = "Animated bar races and scatterplots from a year/entity CSV")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a JSON summary of a dataset.
    Inspect(SourceArgs),
    /// Simulate playback up to a point in time and write that frame as SVG (and optionally PNG).
    Frame(FrameArgs),
    /// Write an SVG sequence sampled at a fixed frame rate.
    Frames(FramesArgs),
    /// Print the entity nearest to a pointer position (scatter charts).
    Hover(HoverArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Input CSV with one row per entity and year.
    #[arg(long)]
    data: PathBuf,

    /// Chart configuration JSON. Defaults to the bar race preset.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the scatter preset when no config is given.
    #[arg(long)]
    scatter: bool,

    /// Override the transition easing (e.g. `linear`, `cubic-out`, `poly-out`).
    #[arg(long)]
    ease: Option<Ease>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Virtual time since playback started, in milliseconds.
    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Simulation steps per second while catching up to `--at-ms`.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Output SVG path.
    #[arg(long)]
    out: PathBuf,

    /// Also rasterize to this PNG path.
    #[arg(long)]
    png: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FramesArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Length of the sequence in milliseconds.
    #[arg(long)]
    duration_ms: u64,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory receiving `frame_00000.svg`, `frame_00001.svg`, ...
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct HoverArgs {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, default_value_t = 0)]
    at_ms: u64,

    /// Pointer position in canvas pixels.
    #[arg(long)]
    x: f64,

    #[arg(long)]
    y: f64,
}

#[derive(serde::Serialize)]
struct Summary<'a> {
    rows: usize,
    skipped: usize,
    missing_values: usize,
    entities: usize,
    first_year: Option<i32>,
    last_year: Option<i32>,
    metrics: &'a [String],
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "datajoin=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Frames(args) => cmd_frames(args),
        Command::Hover(args) => cmd_hover(args),
    }
}

fn load(source: &SourceArgs) -> anyhow::Result<(ChartConfig, DataSet)> {
    let mut config = match &source.config {
        Some(path) => ChartConfig::from_path(path)?,
        None if source.scatter => ChartConfig::scatter(),
        None => ChartConfig::default(),
    };
    if let Some(ease) = source.ease {
        config.animation.ease = ease;
    }
    let data = DataSet::from_path(&source.data, &config.load)
        .with_context(|| format!("load dataset '{}'", source.data.display()))?;
    info!(
        rows = data.report().rows,
        skipped = data.report().skipped.len(),
        "dataset loaded"
    );
    Ok((config, data))
}

fn mark_for(config: &ChartConfig) -> Mark {
    match config.kind {
        ChartKind::BarRace => Mark::Bar,
        ChartKind::Scatter => Mark::Dot,
    }
}

/// Play from t=0 and step the clock at `fps` until `until`, finishing exactly on it.
fn simulate(chart: &mut Chart, svg: &mut SvgRenderer, until: Millis, fps: u32) {
    let step = (1000 / u64::from(fps.max(1))).max(1);
    chart.play(Millis::ZERO);
    let mut now = 0u64;
    loop {
        chart.advance(Millis(now.min(until.0)), svg);
        if now >= until.0 {
            break;
        }
        now = now.saturating_add(step);
    }
}

/// Frames covering `[0, duration_ms]` at `fps`, both ends included.
fn frame_count(duration_ms: u64, fps: u64) -> anyhow::Result<u64> {
    duration_ms
        .checked_mul(fps)
        .and_then(|n| (n / 1000).checked_add(1))
        .filter(|n| n.checked_mul(1000).is_some())
        .with_context(|| format!("{duration_ms} ms at {fps} fps is too many frames"))
}

fn cmd_inspect(args: SourceArgs) -> anyhow::Result<()> {
    let (_, data) = load(&args)?;
    let domain = data.domain();
    let summary = Summary {
        rows: data.report().rows,
        skipped: data.report().skipped.len(),
        missing_values: data.report().missing_values,
        entities: data.entities().count(),
        first_year: domain.map(|d| d.min.0),
        last_year: domain.map(|d| d.max.0),
        metrics: data.metric_names(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (config, data) = load(&args.source)?;
    let mut svg = SvgRenderer::new(mark_for(&config));
    let mut chart = Chart::new(config, data)?;
    simulate(&mut chart, &mut svg, Millis(args.at_ms), args.fps);

    let doc = chart.render_svg(&svg);
    write_text(&args.out, &doc)?;
    eprintln!("wrote {}", args.out.display());

    if let Some(png) = &args.png {
        let img = rasterize_svg(&doc)?;
        write_png(png, &img)?;
        eprintln!("wrote {}", png.display());
    }
    Ok(())
}

fn cmd_frames(args: FramesArgs) -> anyhow::Result<()> {
    let (config, data) = load(&args.source)?;
    let mut svg = SvgRenderer::new(mark_for(&config));
    let mut chart = Chart::new(config, data)?;
    let fps = u64::from(args.fps.max(1));
    let count = frame_count(args.duration_ms, fps)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    chart.play(Millis::ZERO);
    for i in 0..count {
        chart.advance(Millis(i * 1000 / fps), &mut svg);
        let path = args.out_dir.join(format!("frame_{i:05}.svg"));
        write_text(&path, &chart.render_svg(&svg))?;
    }
    eprintln!("wrote {count} frames to {}", args.out_dir.display());
    Ok(())
}

fn cmd_hover(args: HoverArgs) -> anyhow::Result<()> {
    let (config, data) = load(&args.source)?;
    let mut svg = SvgRenderer::new(mark_for(&config));
    let mut chart = Chart::new(config, data)?;
    simulate(&mut chart, &mut svg, Millis(args.at_ms), 60);

    match chart.hover(Point::new(args.x, args.y)) {
        Some(id) => println!("{id}"),
        None => println!("none"),
    }
    Ok(())
}

fn write_text(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, text).with_context(|| format!("write '{}'", path.display()))
}
