use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use qoe_lib::{
    config::{read_config, QoeConfig},
    io::text::{parse_series, read_series, MalformedPolicy},
    metrics::qoe::{qoe_score, resolution_changes, summarize},
    pipeline::QoePipeline,
    plot::{figure_for_chart, ChartKind, PlotBackend},
    signal::{SessionMode, TimeSeries},
};
use serde::Serialize;
use std::{
    io::{self, Read},
    path::{Path, PathBuf},
};

mod plotting;

use plotting::PlottersBackend;

#[derive(Parser)]
#[command(
    name = "qoe",
    version,
    about = "Quality-of-Experience charts for adaptive streaming sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeArg {
    Live,
    Recorded,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Live => SessionMode::Live,
            ModeArg::Recorded => SessionMode::Recorded,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Png,
    Svg,
}

impl FormatArg {
    fn extension(&self) -> &'static str {
        match self {
            FormatArg::Png => "png",
            FormatArg::Svg => "svg",
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum KindArg {
    #[value(name = "resolution-quality")]
    ResolutionQuality,
    #[value(name = "frame-buffering")]
    FrameBuffering,
    #[value(name = "resolution-changes")]
    ResolutionChanges,
    #[value(name = "overall-qoe")]
    OverallQoe,
}

impl From<KindArg> for ChartKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ResolutionQuality => ChartKind::ResolutionQuality,
            KindArg::FrameBuffering => ChartKind::FrameBuffering,
            KindArg::ResolutionChanges => ChartKind::ResolutionChanges,
            KindArg::OverallQoe => ChartKind::OverallQoe,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load both session series, derive changes and QoE, and write all four charts
    Render {
        /// TOML configuration; flags below override its values
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        input_dir: Option<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        mode: Option<ModeArg>,
        #[arg(long)]
        seconds: Option<usize>,
        #[arg(long)]
        format: Option<FormatArg>,
        /// Keep non-numeric records as NaN instead of failing
        #[arg(long)]
        nan_passthrough: bool,
    },
    /// Print per-second resolution changes from a resolution series (stdin or --input)
    Changes {
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print the per-second QoE series and its summary
    Score {
        #[arg(long)]
        resolution: PathBuf,
        #[arg(long)]
        buffering: PathBuf,
        #[arg(long, default_value_t = 32.0)]
        normalization_max: f64,
    },
    /// Render a single chart from one series file
    Plot {
        #[arg(long)]
        kind: KindArg,
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value = "live")]
        mode: ModeArg,
        #[arg(long, default_value_t = 60)]
        seconds: usize,
        /// Keep non-numeric records as NaN instead of failing
        #[arg(long)]
        nan_passthrough: bool,
    },
}

#[derive(Serialize)]
struct ScoreOutput {
    qoe: Vec<f64>,
    summary: qoe_lib::metrics::QoeSummary,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Render {
            config,
            input_dir,
            output_dir,
            mode,
            seconds,
            format,
            nan_passthrough,
        } => cmd_render(
            config.as_deref(),
            input_dir,
            output_dir,
            mode,
            seconds,
            format,
            nan_passthrough,
        )?,
        Commands::Changes { input } => cmd_changes(input.as_deref())?,
        Commands::Score {
            resolution,
            buffering,
            normalization_max,
        } => cmd_score(&resolution, &buffering, normalization_max)?,
        Commands::Plot {
            kind,
            input,
            out,
            mode,
            seconds,
            nan_passthrough,
        } => cmd_plot(
            kind.into(),
            &input,
            &out,
            mode.into(),
            seconds,
            nan_passthrough,
        )?,
    }
    Ok(())
}

fn read_samples(input: Option<&Path>) -> Result<TimeSeries> {
    let series = match input {
        Some(path) => read_series(path, MalformedPolicy::Fail)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            parse_series(buf.as_bytes(), Path::new("<stdin>"), MalformedPolicy::Fail)?
        }
    };
    Ok(series)
}

fn cmd_render(
    config: Option<&Path>,
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    mode: Option<ModeArg>,
    seconds: Option<usize>,
    format: Option<FormatArg>,
    nan_passthrough: bool,
) -> Result<()> {
    let mut cfg = match config {
        Some(path) => read_config(path)?,
        None => QoeConfig::default(),
    };
    if let Some(dir) = input_dir {
        cfg.input_dir = dir;
    }
    if let Some(dir) = output_dir {
        cfg.output_dir = dir;
    }
    if let Some(mode) = mode {
        cfg.session_mode = mode.into();
    }
    if let Some(seconds) = seconds {
        cfg.streaming_seconds = seconds;
    }
    if let Some(format) = format {
        cfg.image_format = format.extension().into();
    }
    if nan_passthrough {
        cfg.malformed = MalformedPolicy::NotANumber;
    }
    let mut backend = PlottersBackend::new(cfg.image_width, cfg.image_height);
    let pipeline = QoePipeline::new(cfg)?;
    let report = pipeline.run(&mut backend)?;
    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}

fn cmd_changes(input: Option<&Path>) -> Result<()> {
    let resolution = read_samples(input)?;
    let changes = resolution_changes(&resolution);
    println!("{}", serde_json::to_string(&changes)?);
    Ok(())
}

fn cmd_score(resolution: &Path, buffering: &Path, normalization_max: f64) -> Result<()> {
    let cfg = QoeConfig {
        normalization_max,
        ..QoeConfig::default()
    };
    cfg.validate()?;
    let res = read_series(resolution, cfg.malformed)?;
    let buf = read_series(buffering, cfg.malformed)?;
    let changes = resolution_changes(&res);
    let qoe = qoe_score(&res, &buf, &changes, &cfg.reference())?;
    let summary = summarize(&qoe, &res);
    let out = ScoreOutput {
        qoe: qoe.data,
        summary,
    };
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}

fn cmd_plot(
    kind: ChartKind,
    input: &Path,
    out: &Path,
    mode: SessionMode,
    seconds: usize,
    nan_passthrough: bool,
) -> Result<()> {
    let cfg = QoeConfig {
        session_mode: mode,
        streaming_seconds: seconds,
        malformed: if nan_passthrough {
            MalformedPolicy::NotANumber
        } else {
            MalformedPolicy::Fail
        },
        ..QoeConfig::default()
    };
    cfg.validate()?;
    let series = read_series(input, cfg.malformed)?;
    let fig = figure_for_chart(kind, &series, mode, &cfg);
    let mut backend = PlottersBackend::new(cfg.image_width, cfg.image_height);
    backend
        .draw(&fig, out)
        .with_context(|| format!("rendering {} chart", kind.name()))?;
    info!("wrote {}", out.display());
    Ok(())
}
