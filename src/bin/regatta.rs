use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "regatta", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single day's frame as a PNG.
    Frame(FrameArgs),
    /// Render the whole sequence, one frame per day, plus an optional MP4.
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Boat shape SVG.
    #[arg(long)]
    svg: PathBuf,

    /// Progress CSV (date,first_miles,second_miles,method).
    #[arg(long)]
    data: PathBuf,

    /// Day to render (YYYY-MM-DD); defaults to the last day in the data.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Optional config JSON overriding course defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Boat shape SVG.
    #[arg(long)]
    svg: PathBuf,

    /// Progress CSV (date,first_miles,second_miles,method).
    #[arg(long)]
    data: PathBuf,

    /// Directory for the per-day PNG frames.
    #[arg(long)]
    out_dir: PathBuf,

    /// Output MP4 path (requires `ffmpeg` on PATH; skipped with a warning if
    /// absent). Defaults to <out-dir>/regatta.mp4.
    #[arg(long)]
    mp4: Option<PathBuf>,

    /// Write frames only, never attempt animation assembly.
    #[arg(long)]
    skip_animation: bool,

    /// Optional config JSON overriding course defaults.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<regatta::RegattaConfig> {
    let config = match path {
        Some(p) => regatta::RegattaConfig::load(p)?,
        None => regatta::RegattaConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let shape = regatta::load_boat_svg(&args.svg)?;
    let records = regatta::load_progress_csv(&args.data, config.course_length)?;

    let record = match args.date {
        Some(date) => records
            .iter()
            .find(|r| r.date == date)
            .copied()
            .with_context(|| format!("no progress row for {date}"))?,
        None => *records.last().context("progress data is empty")?,
    };

    let params = regatta::layout(
        config.course_length,
        config.boat_width,
        shape.width,
        shape.height,
    )?;
    let entries = regatta::sequence::lane_entries(&shape, &record, &config);
    let frame = regatta::render_frame(
        &params,
        &entries,
        &regatta::sequence::day_title(&record, &config),
        &record.date.to_string(),
        config.canvas,
        config.buoys_per_line,
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    regatta::write_png(&frame, &args.out)?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    let shape = regatta::load_boat_svg(&args.svg)?;
    let records = regatta::load_progress_csv(&args.data, config.course_length)?;

    let mp4 = if args.skip_animation {
        None
    } else {
        Some(
            args.mp4
                .unwrap_or_else(|| args.out_dir.join("regatta.mp4")),
        )
    };

    let summary = regatta::run_sequence(
        &records,
        &shape,
        &config,
        &args.out_dir,
        mp4.as_deref(),
    )?;

    eprintln!(
        "wrote {} frames to {}",
        summary.frames.len(),
        args.out_dir.display()
    );
    if let Some(out) = summary.animation {
        eprintln!("wrote {}", out.display());
    }
    Ok(())
}
