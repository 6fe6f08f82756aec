//! Screenflow CLI Tool
//!
//! Command-line interface for turning screen recordings into keyframes and
//! navigation sitemap diagrams.

mod analyzer;
mod output;
mod signal;

use analyzer::CommandAnalysisService;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use screenflow_core::{AnalysisRequest, AnalysisService, SitemapGraph};
use screenflow_extract::{
    CaptureFormat, CheckpointScheduler, ExtractionConfig, ExtractionPipeline, ExtractionReport,
    LastFramePolicy, VideoReader,
};
use screenflow_layout::{Layout, LayoutConfig, LayoutEngine};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

#[derive(Parser)]
#[command(name = "screenflow")]
#[command(about = "Screenflow - turn screen recordings into navigation sitemaps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show video information and the checkpoints that would be scanned
    Info {
        /// Input video file path
        input: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Extract distinct keyframes from a screen recording
    Extract {
        /// Input video file path
        input: PathBuf,

        /// Output directory for frames and the frame manifest
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        extract: ExtractArgs,
    },

    /// Lay out a sitemap JSON file
    Layout {
        /// Sitemap JSON file ({"screens": [...], "edges": [...]})
        input: PathBuf,

        /// Output layout JSON file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Extract keyframes, analyze them with an external command and lay out the result
    Map {
        /// Input video file path
        input: PathBuf,

        /// Analyzer command; receives the frames as JSON on stdin and prints the sitemap
        #[arg(long)]
        analyzer: String,

        /// Output layout JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the extracted frames to this directory
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        #[command(flatten)]
        extract: ExtractArgs,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Args, Debug, Default)]
struct ExtractArgs {
    /// JSON file with extraction settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between checkpoints (0.05-60)
    #[arg(long)]
    interval: Option<f64>,

    /// Maximum number of kept frames (0 = unlimited)
    #[arg(long)]
    max_frames: Option<usize>,

    /// Similarity above which a frame counts as a duplicate (0.5-1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// Color deviation below which a frame counts as blank (0-255)
    #[arg(long)]
    complexity: Option<f64>,

    /// Drop the final frame when it is at least this similar to the last kept one
    #[arg(long)]
    skip_duplicate_last: Option<f64>,

    /// Longest side of saved frames in pixels (0 = native resolution)
    #[arg(long)]
    max_dimension: Option<u32>,

    /// Save frames as PNG instead of JPEG
    #[arg(long)]
    png: bool,

    /// JPEG quality (1-100)
    #[arg(long)]
    quality: Option<u8>,
}

impl ExtractArgs {
    /// Builds the extraction settings: defaults, then the config file, then flags
    fn to_config(&self) -> Result<ExtractionConfig> {
        let mut config = match &self.config {
            Some(path) => read_json::<ExtractionConfig>(path)?,
            None => ExtractionConfig::default(),
        };

        if let Some(interval) = self.interval {
            config.scan_interval = interval;
        }
        if let Some(max_frames) = self.max_frames {
            config.max_frames = (max_frames > 0).then_some(max_frames);
        }
        if let Some(threshold) = self.threshold {
            config.duplicate_threshold = threshold;
        }
        if let Some(complexity) = self.complexity {
            config.complexity_threshold = complexity;
        }
        if let Some(threshold) = self.skip_duplicate_last {
            config.last_frame = LastFramePolicy::SkipIfDuplicate { threshold };
        }
        if let Some(max_dimension) = self.max_dimension {
            config.max_dimension = (max_dimension > 0).then_some(max_dimension);
        }
        if self.png {
            config.capture_format = CaptureFormat::Png;
        } else if let Some(quality) = self.quality {
            config.capture_format = CaptureFormat::Jpeg { quality };
        }

        config.validate().context("Invalid extraction settings")?;
        Ok(config)
    }
}

#[derive(Args, Debug, Default)]
struct LayoutArgs {
    /// JSON file with layout settings (node size, gaps, margin)
    #[arg(long)]
    layout_config: Option<PathBuf>,
}

impl LayoutArgs {
    fn to_config(&self) -> Result<LayoutConfig> {
        let config = match &self.layout_config {
            Some(path) => read_json::<LayoutConfig>(path)?,
            None => LayoutConfig::default(),
        };
        config.validate().context("Invalid layout settings")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { input, extract } => show_info(&input, &extract.to_config()?)?,

        Commands::Extract {
            input,
            output,
            extract,
        } => extract_frames(&input, &output, extract.to_config()?)?,

        Commands::Layout {
            input,
            output,
            layout,
        } => layout_sitemap(&input, &output, layout.to_config()?)?,

        Commands::Map {
            input,
            analyzer,
            output,
            frames_dir,
            extract,
            layout,
        } => map_video(
            &input,
            &analyzer,
            &output,
            frames_dir.as_deref(),
            extract.to_config()?,
            layout.to_config()?,
        )?,
    }

    Ok(())
}

fn show_info(input: &Path, config: &ExtractionConfig) -> Result<()> {
    let reader = open_video(input)?;
    let (fps_num, fps_den) = reader.frame_rate();
    let duration = reader.duration_secs();

    println!("\n=== Video Information ===");
    println!("File: {}", input.display());
    println!("Resolution: {}x{}", reader.width(), reader.height());
    if fps_den > 0 {
        println!(
            "Frame rate: {}/{} ({:.2} fps)",
            fps_num,
            fps_den,
            fps_num as f64 / fps_den as f64
        );
    }
    match duration {
        Some(duration) => println!("Duration: {:.2} seconds", duration),
        None => println!("Duration: unknown"),
    }

    let checkpoints = CheckpointScheduler::from_config(config)
        .schedule(duration)
        .context("Failed to schedule checkpoints")?;
    println!("\n=== Checkpoints (every {:.2}s) ===", config.scan_interval);
    println!("Count: {}", checkpoints.len());
    for time in checkpoints.iter().take(10) {
        println!("  {:.2}s", time);
    }
    if checkpoints.len() > 10 {
        println!("  ... and {} more", checkpoints.len() - 10);
    }

    Ok(())
}

fn extract_frames(input: &Path, output: &Path, config: ExtractionConfig) -> Result<()> {
    let cancel = signal::setup_cancel_signal()?;
    let report = run_extraction(input, config, &cancel)?;

    let manifest = output::write_frames(output, input, &report)?;
    println!(
        "Saved {} frames and {} to {}",
        manifest.frames.len(),
        output::MANIFEST_NAME,
        output.display()
    );

    Ok(())
}

fn layout_sitemap(input: &Path, output: &Path, config: LayoutConfig) -> Result<()> {
    let graph: SitemapGraph = read_json(input)?;
    println!(
        "Loaded {} screens and {} edges from {}",
        graph.nodes.len(),
        graph.edges.len(),
        input.display()
    );

    let layout = compute_layout(&graph, config)?;
    output::write_json(output, &layout)?;
    println!("Saved layout to {}", output.display());

    Ok(())
}

fn map_video(
    input: &Path,
    analyzer: &str,
    output: &Path,
    frames_dir: Option<&Path>,
    extract_config: ExtractionConfig,
    layout_config: LayoutConfig,
) -> Result<()> {
    let service = CommandAnalysisService::from_command_line(analyzer).context("Analyzer command is empty")?;
    let cancel = signal::setup_cancel_signal()?;

    let report = run_extraction(input, extract_config, &cancel)?;
    if let Some(dir) = frames_dir {
        output::write_frames(dir, input, &report)?;
        println!("Saved frames to {}", dir.display());
    }

    let request = AnalysisRequest::from_frames(&report.frames);
    println!("Analyzing {} frames with '{}'...", request.len(), service.program());
    let graph = service.analyze(&request).context("Screen analysis failed")?;
    println!("Found {} screens and {} transitions", graph.nodes.len(), graph.edges.len());

    let layout = compute_layout(&graph, layout_config)?;
    output::write_json(output, &layout)?;
    println!("Saved sitemap layout to {}", output.display());

    Ok(())
}

fn open_video(input: &Path) -> Result<VideoReader> {
    VideoReader::open(input).with_context(|| format!("Failed to open video file {}", input.display()))
}

fn run_extraction(input: &Path, config: ExtractionConfig, cancel: &AtomicBool) -> Result<ExtractionReport> {
    println!("Extracting keyframes from: {}", input.display());

    let pipeline = ExtractionPipeline::new(config).context("Invalid extraction settings")?;
    let reader = open_video(input)?;
    let report = pipeline.run(reader, cancel).context("Failed to extract keyframes")?;

    println!(
        "Kept {} of {} checkpoints ({} blank, {} duplicates{})",
        report.stats.kept,
        report.stats.checkpoints,
        report.stats.low_complexity,
        report.stats.duplicates,
        if report.stats.reached_frame_cap {
            ", frame cap reached"
        } else {
            ""
        }
    );
    Ok(report)
}

fn compute_layout(graph: &SitemapGraph, config: LayoutConfig) -> Result<Layout> {
    let engine = LayoutEngine::new(config).context("Invalid layout settings")?;
    let layout = engine.layout(graph).context("Failed to lay out sitemap")?;
    info!(
        "Layout: {} levels on a {}x{} canvas",
        layout.level_count(),
        layout.width,
        layout.height
    );
    Ok(layout)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file)).with_context(|| format!("Failed to parse {}", path.display()))
}
