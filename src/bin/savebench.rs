use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use savebench::measure::{ElapsedCell, ScopedTimer};
use savebench::{
    BenchmarkConfig, FrameStream, ImageBatch, OutputFormat, PixelFormat, ProgressObserver,
    StrategyOptions, generate, run_benchmark,
};

const DEFAULT_IMAGE_COUNT: u64 = 1000;

const CLI_AFTER_HELP: &str = "Examples:\n  savebench -n 1000 --width 512 --height 512\n  savebench -n 500 --formats jpg --threads 4 --progress\n  savebench --input clip.mp4 --width 640 --height 360 --out frames\n  savebench -n 200 --json";

#[derive(Debug, Parser)]
#[command(
    name = "savebench",
    version,
    about = "Benchmark sequential, worker-pool, and cooperative-offload image saving",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Number of images to generate [default: 1000]. Ignored with --input.
    #[arg(short = 'n', long)]
    number: Option<u64>,

    /// Width of the images.
    #[arg(short = 'y', long, default_value_t = 512)]
    width: u32,

    /// Height of the images.
    #[arg(short = 'x', long, default_value_t = 512)]
    height: u32,

    /// Channel depth: 1 (gray), 3 (rgb), 4 (rgba).
    #[arg(short = 'd', long, default_value_t = 3)]
    depth: usize,

    /// Decode frames from this media file instead of generating noise.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output root directory. Defaults to a temporary output* directory
    /// under the current directory, removed on exit.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Output formats to compare, comma-separated (png, jpg).
    #[arg(long, default_value = "png,jpg")]
    formats: String,

    /// Worker pool size for the concurrent strategies.
    #[arg(long)]
    threads: Option<usize>,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Print the report as machine-readable JSON.
    #[arg(long)]
    json: bool,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn parse_formats(value: &str) -> Result<Vec<OutputFormat>, String> {
    let mut formats = Vec::new();
    for name in value.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let format =
            OutputFormat::parse(name).ok_or_else(|| format!("unsupported format: {name}"))?;
        if !formats.contains(&format) {
            formats.push(format);
        }
    }
    if formats.is_empty() {
        return Err("--formats must name at least one format".to_string());
    }
    Ok(formats)
}

fn parse_depth(depth: usize) -> Result<PixelFormat, String> {
    PixelFormat::from_channel_count(depth)
        .ok_or_else(|| format!("unsupported --depth: {depth} (expected 1, 3, or 4)"))
}

/// An indicatif bar fed by strategy completion signals.
///
/// A fresh bar is created per strategy run; batches of unknown cardinality
/// get a spinner instead of a bounded bar.
#[derive(Default)]
struct TerminalProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressObserver for TerminalProgress {
    fn on_run_start(&self, label: &str, total: Option<u64>) {
        let bar = match total {
            Some(total) => {
                let bar = ProgressBar::new(total);
                if let Ok(style) =
                    ProgressStyle::with_template("{msg} {bar:40.cyan/blue} {pos}/{len}")
                {
                    bar.set_style(style.progress_chars("##-"));
                }
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(label.to_string());
        *self.bar.lock().unwrap() = Some(bar);
    }

    fn on_item_complete(&self) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn on_run_finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pixel_format = parse_depth(cli.depth)?;
    let formats = parse_formats(&cli.formats)?;

    let cpu_count = std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1);
    println!("{} {cpu_count}", "CPU count:".cyan().bold());

    // Keep the TempDir guard alive for the whole run; dropping it removes
    // the default output directory, mirroring a temporary working dir.
    let (root, _tempdir) = match &cli.out {
        Some(path) => (path.clone(), None),
        None => {
            let tempdir = tempfile::Builder::new().prefix("output").tempdir_in(".")?;
            (tempdir.path().to_path_buf(), Some(tempdir))
        }
    };
    println!(
        "{} {}",
        "writing to".cyan().bold(),
        std::path::absolute(&root)?.display()
    );

    let generation = ElapsedCell::new();
    let batch = {
        let _timer = ScopedTimer::new(&generation);
        match &cli.input {
            Some(input) => {
                if cli.number.is_some() {
                    eprintln!(
                        "{} {}",
                        "warning:".yellow().bold(),
                        "--number is ignored in --input mode".yellow()
                    );
                }
                ImageBatch::from_stream(FrameStream::spawn(
                    input,
                    cli.width,
                    cli.height,
                    pixel_format,
                )?)
            }
            None => ImageBatch::from_images(
                generate(
                    cli.number.unwrap_or(DEFAULT_IMAGE_COUNT),
                    cli.width,
                    cli.height,
                    pixel_format,
                )
                .collect(),
            ),
        }
    };
    println!(
        "Execution time generate {} images: {:.4} seconds",
        batch.len(),
        generation.elapsed().as_secs_f64(),
    );

    let mut options = StrategyOptions::new();
    if let Some(threads) = cli.threads {
        options = options.with_threads(threads);
    }
    if cli.progress {
        options = options.with_progress(Arc::new(TerminalProgress::default()));
    }

    let config = BenchmarkConfig::new().with_formats(formats);
    let report = run_benchmark(&batch, &root, &config, &options)?;

    if cli.json {
        let payload = json!({
            "cpu_count": cpu_count,
            "image_count": batch.len(),
            "generation_seconds": generation.elapsed().as_secs_f64(),
            "runs": report.timings().iter().map(|timing| json!({
                "strategy": timing.strategy(),
                "format": timing.format().extension(),
                "elapsed_seconds": timing.result().elapsed().as_secs_f64(),
                "completed": timing.result().completed(),
            })).collect::<Vec<_>>(),
            "speedups": report.speedups().iter().map(|speedup| json!({
                "strategy": speedup.strategy,
                "format": speedup.format.extension(),
                "ratio": speedup.ratio,
            })).collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for line in report.summary_lines() {
            println!("{line}");
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
