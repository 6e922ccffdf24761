mod batch;
mod config;
mod error;
mod features;
mod layout;
mod model;
mod pdf;
mod pipeline;
mod reconcile;
mod style;
mod table;
mod types;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::Env;
use pdfium_render::prelude::*;

use config::ExtractConfig;
use model::LabelClassifier;
use pdf::{PageSource, PdfiumSource};
use style::WeightPolicy;
use types::LabeledSegment;

#[derive(Parser)]
#[command(name = "pdf-outline", about = "Extract the title and heading outline of PDF documents")]
struct Cli {
    /// PDF file, or a directory of PDF files
    input: PathBuf,

    /// Directory for `<name>.json` results (required for directory input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Trained classifier exported as JSON
    #[arg(short, long, env = "OUTLINE_MODEL")]
    model: PathBuf,

    /// Pretty-print JSON written to stdout
    #[arg(long)]
    pretty: bool,

    /// Print per-segment features and labels instead of the outline (debug)
    #[arg(long)]
    debug_features: bool,

    /// Override pdfium library path
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_path: Option<String>,

    /// Maximum top-coordinate difference for fragments on one visual line
    #[arg(long, default_value_t = config::DEFAULT_TOP_TOLERANCE)]
    top_tolerance: f32,

    /// Left margin subtracted from x0 to compute indentation
    #[arg(long, default_value_t = config::DEFAULT_MARGIN)]
    margin: f32,

    /// Title lines must be closer than this many anchor font sizes
    #[arg(long, default_value_t = config::DEFAULT_TITLE_SPACING)]
    title_spacing: f32,

    /// Font-name substring marking a bold face (repeatable; replaces the defaults)
    #[arg(long = "bold-marker", value_name = "SUBSTRING")]
    bold_markers: Vec<String>,
}

impl Cli {
    fn extract_config(&self) -> ExtractConfig {
        let weight_policy = if self.bold_markers.is_empty() {
            WeightPolicy::default()
        } else {
            WeightPolicy::with_markers(&self.bold_markers)
        };
        ExtractConfig {
            top_tolerance: self.top_tolerance,
            margin: self.margin,
            title_spacing: self.title_spacing,
            weight_policy,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.extract_config();
    log::debug!("Bold font markers: {:?}", config.weight_policy.markers());
    let classifier = model::load_model(&cli.model)
        .with_context(|| format!("Failed to load model: {}", cli.model.display()))?;
    let source = PdfiumSource::new(bind_pdfium(&cli.pdfium_path)?);

    if cli.input.is_dir() {
        let Some(output_dir) = &cli.output_dir else {
            bail!("--output-dir is required when INPUT is a directory");
        };
        let summary = batch::run(&cli.input, output_dir, &source, &classifier, &config)?;
        log::info!(
            "{} written, {} without text, {} failed",
            summary.written,
            summary.empty,
            summary.failed.len()
        );
        return Ok(());
    }

    if cli.debug_features {
        return print_debug_features(&cli.input, &source, &classifier, &config);
    }

    let result = pipeline::process_document(&source, &cli.input, &classifier, &config)
        .with_context(|| format!("Failed to process {}", cli.input.display()))?;
    let Some(result) = result else {
        log::warn!("No text segments in {}, nothing written", cli.input.display());
        return Ok(());
    };

    match &cli.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = batch::output_path(&cli.input, dir);
            std::fs::write(&path, batch::to_json_pretty(&result)?)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print_output(&result, cli.pretty)?,
    }
    Ok(())
}

fn bind_pdfium(pdfium_path: &Option<String>) -> Result<Pdfium> {
    let bindings = if let Some(path) = pdfium_path {
        Pdfium::bind_to_library(path)
            .with_context(|| format!("Failed to load pdfium from: {path}"))?
    } else {
        Pdfium::bind_to_system_library()
            .context("Failed to find pdfium. Install pdfium-binaries or use --pdfium-path")?
    };
    Ok(Pdfium::new(bindings))
}

fn print_output(result: &types::DocumentResult, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };
    println!("{json}");
    Ok(())
}

fn print_debug_features(
    path: &Path,
    source: &dyn PageSource,
    classifier: &dyn LabelClassifier,
    config: &ExtractConfig,
) -> Result<()> {
    let pages = source.load_pages(path)?;
    let mut segments = pipeline::extract_segments(&pages, config);
    if segments.is_empty() {
        return Ok(());
    }
    pipeline::classify(&mut segments, classifier)?;
    let result = reconcile::reconcile(&mut segments, config.title_spacing);
    for s in &segments {
        print_segment(s);
    }
    println!("title: {:?}", result.title);
    Ok(())
}

fn print_segment(s: &LabeledSegment) {
    let f = &s.features;
    let preview: String = s.text().chars().take(80).collect();
    println!(
        "#{:<4} p{} [{:<5}] top={:6.1} fs={:4.1} w={} caps={} bullet={} gap={:6.1} | {}",
        s.segment.id,
        f.page,
        s.label.as_str(),
        f.top,
        f.font_size,
        f.font_weight,
        f.is_all_caps,
        f.has_bullet_or_number,
        f.line_spacing_above,
        preview
    );
}
