//! questtrack CLI: run the extraction pipeline over a directory of
//! captured frames and report the derived events.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use questtrack_cv::{CalibrationProfile, PipelineConfig, PipelineRegistry, TemplateSet};

mod report;

use report::RunReport;

#[derive(Parser)]
#[command(name = "questtrack")]
#[command(about = "Extract stable game state and semantic events from captured gameplay frames")]
#[command(version)]
struct Cli {
    /// Directory of captured frames (png/jpg), processed in filename order.
    #[arg(long)]
    frames: PathBuf,

    /// Template asset directory.
    #[arg(long, default_value = "assets/templates")]
    templates: PathBuf,

    /// Calibration profile JSON. Defaults to treating each frame as the
    /// full game picture.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Pipeline configuration JSON overriding the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Entity id stamped onto every event.
    #[arg(long, default_value = "player-1")]
    entity: String,

    /// Capture rate the frame files were sampled at, used to synthesize
    /// timestamps.
    #[arg(long, default_value = "4.0")]
    fps: f64,

    /// Also write the full run report as JSON.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let templates = TemplateSet::load(&cli.templates)?;
    tracing::info!(count = templates.len(), "templates loaded");

    let config: PipelineConfig = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config: {path:?}"))?;
            serde_json::from_str(&text)
                .with_context(|| format!("failed to parse config: {path:?}"))?
        }
        None => PipelineConfig::default(),
    };

    let frames = frame_files(&cli.frames)?;
    if frames.is_empty() {
        anyhow::bail!("no frames found in {:?}", cli.frames);
    }

    let profile = match &cli.profile {
        Some(path) => CalibrationProfile::load(path)
            .with_context(|| format!("failed to load profile: {path:?}"))?,
        None => {
            let first = image::open(&frames[0])
                .with_context(|| format!("failed to open frame: {:?}", frames[0]))?
                .to_rgb8();
            CalibrationProfile::full_frame(first.width(), first.height())
        }
    };

    let mut registry = PipelineRegistry::new(templates, config);
    registry.register(cli.entity.clone(), profile)?;
    let pipeline = registry
        .get_mut(&cli.entity)
        .context("pipeline registration failed")?;

    let frame_ms = (1000.0 / cli.fps.max(0.001)) as u64;
    let mut processed = 0u64;
    for (index, path) in frames.iter().enumerate() {
        let frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(err) => {
                tracing::warn!("skipping unreadable frame {path:?}: {err}");
                continue;
            }
        };
        let events = pipeline.process_frame(&frame, index as u64, index as u64 * frame_ms);
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        processed += 1;
    }

    let report = RunReport {
        entity: cli.entity.clone(),
        frames_processed: processed,
        events: pipeline.drain_events(),
        anomalies: pipeline.anomalies().to_vec(),
        final_state: pipeline.stable_state().clone(),
    };

    eprintln!("{}", report.render());
    if let Some(path) = &cli.out {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write report: {path:?}"))?;
    }

    Ok(())
}

/// All frame image files in the directory, in filename order.
fn frame_files(dir: &PathBuf) -> anyhow::Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read frame directory: {dir:?}"))?;
    let mut frames: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .map(|ext| {
                    let ext = ext.to_string_lossy().to_lowercase();
                    matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp")
                })
                .unwrap_or(false)
        })
        .collect();
    frames.sort();
    Ok(frames)
}
