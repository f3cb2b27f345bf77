use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use gaslens::data::loader::{self, InstrumentExport};
use gaslens::processing::view_range::fit_value_range;
use gaslens::{
    detect_spans, evaluate, report, split_at_gaps, AnalysisConfig, ChannelSpecs, EvaluationMode,
    EvaluationOutcome, Interval, WindowAccumulator,
};

#[derive(Parser, Debug)]
#[command(name = "gaslens")]
#[command(about = "Operational spans and tolerance checks for gas-analyzer exports")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect spans, classify channels and print window statistics
    Report(ReportArgs),
    /// Write one channel as a gap-split (time, value) CSV for plotting
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Instrument export files; several files are merged by time
    #[arg(short, long, required = true, num_args = 1..)]
    data: Vec<PathBuf>,

    /// Analysis config JSON (thresholds, column names, mode)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Per-channel tolerance bands JSON
    #[arg(long)]
    channels: Option<PathBuf>,

    /// Visible time range in seconds (defaults to the whole dataset)
    #[arg(long, num_args = 2, value_names = ["START", "END"])]
    window: Option<Vec<f64>>,

    /// Sample selection for classification
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Width of the shutdown phase in seconds
    #[arg(long)]
    shutdown_threshold: Option<f64>,

    /// Show span boundaries as date and time in the export's timezone
    #[arg(long)]
    human_time: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Channel (column) name to export
    #[arg(long)]
    channel: String,

    /// Break the line where samples are further apart than this many seconds
    #[arg(long)]
    gap_threshold: Option<f64>,

    /// Output CSV path (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    None,
    Running,
    Iqr,
}

impl From<ModeArg> for EvaluationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::None => EvaluationMode::All,
            ModeArg::Running => EvaluationMode::Running,
            ModeArg::Iqr => EvaluationMode::Iqr,
        }
    }
}

fn read_to_string(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => Ok(AnalysisConfig::from_json(&read_to_string(path)?)?),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_source(source: &SourceArgs, config: &AnalysisConfig) -> Result<InstrumentExport> {
    let mut export = loader::load_and_merge(&source.data, &config.columns.time)?;
    if let Some(code) = config.error_code {
        export.series.clean_error_codes(code);
    }
    Ok(export)
}

fn run_report(args: ReportArgs) -> Result<()> {
    let mut config = load_config(args.source.config.as_deref())?;
    if let Some(mode) = args.mode {
        config.mode = mode.into();
    }
    if let Some(threshold) = args.shutdown_threshold {
        config.shutdown_threshold = threshold;
    }
    config.validate()?;

    let export = load_source(&args.source, &config)?;
    let series = &export.series;

    let specs = match &args.channels {
        Some(path) => ChannelSpecs::from_json(&read_to_string(path)?)?.bind_to(series),
        None => ChannelSpecs::default(),
    };

    let window = match args.window.as_deref() {
        Some(&[start, end]) => Interval::from_bounds(start, end).context("invalid --window")?,
        Some(_) => bail!("--window takes START and END"),
        None => {
            let start = series.time.iter().copied().fold(f64::INFINITY, f64::min);
            let end = series.time.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            Interval::new(start, end)
        }
    };

    let spans = detect_spans(series, &config);
    let mut acc = WindowAccumulator::new();
    if evaluate(&mut acc, series, &specs, &spans, window, &config) == EvaluationOutcome::EmptyWindow {
        tracing::warn!("no samples in the selected window for mode {}", config.mode.label());
    }

    let mut out = std::io::stdout().lock();
    writeln!(out, "LI-78{}: {}", export.model.get(2..).unwrap_or("??"), export.serial())?;
    writeln!(out)?;
    write!(out, "{}", report::render_spans(&spans, args.human_time, export.timezone()))?;
    writeln!(out)?;
    write!(out, "{}", report::render_statuses(&acc, &specs))?;
    writeln!(out)?;
    write!(out, "{}", report::render_stats(&acc))?;

    let plotted = specs.autoplot_channels();
    if let Some((lo, hi)) = fit_value_range(series, &plotted, &spans, window, &config) {
        writeln!(out, "Value axis for autoplot channels: {lo:.3} .. {hi:.3}")?;
    }
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<()> {
    let mut config = load_config(args.source.config.as_deref())?;
    if let Some(threshold) = args.gap_threshold {
        config.gap_threshold = threshold;
    }
    config.validate()?;

    let export = load_source(&args.source, &config)?;
    let series = &export.series;
    let Some(values) = series.plot_values(&args.channel) else {
        bail!("channel {:?} not found", args.channel);
    };
    let (x, y) = split_at_gaps(&series.time, &values, config.gap_threshold);

    let sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("cannot create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record([series.time_column.as_str(), args.channel.as_str()])?;
    let cell = |v: f64| if v.is_finite() { v.to_string() } else { String::new() };
    for (xv, yv) in x.iter().zip(y.iter()) {
        writer.write_record([cell(*xv), cell(*yv)])?;
    }
    writer.flush()?;

    if let Some(path) = &args.out {
        tracing::info!("exported {} points to {:?}", x.len(), path);
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Report(args) => run_report(args),
        Command::Export(args) => run_export(args),
    }
}
