use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use vista_core::background::{OutputMode, TemporalMedianConfig};
use vista_core::consts::{DEFAULT_BACKGROUND_FRAMES, DEFAULT_TEMPORAL_OFFSET};
use vista_core::job::{start_temporal_median, JobEvent};

use crate::image_io::{list_frame_files, load_stack, save_stack, FrameFormat};
use crate::summary::print_median_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Tiff,
    Png,
    FloatTiff,
}

impl From<FormatArg> for FrameFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Tiff => FrameFormat::Tiff,
            FormatArg::Png => FrameFormat::Png,
            FormatArg::FloatTiff => FrameFormat::FloatTiff,
        }
    }
}

#[derive(Args)]
pub struct MedianArgs {
    /// Directory of grayscale frames (TIFF/PNG), processed in file-name order
    pub input: PathBuf,

    /// Algorithm config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames taken on each side of the excluded window
    #[arg(long, default_value_t = DEFAULT_BACKGROUND_FRAMES)]
    pub background: usize,

    /// Frames excluded on each side of the target frame
    #[arg(long, default_value_t = DEFAULT_TEMPORAL_OFFSET)]
    pub offset: usize,

    /// Write frame minus background instead of the background estimate
    #[arg(long)]
    pub subtract: bool,

    /// Output image format [default: tiff, or float-tiff with --subtract]
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Output directory
    #[arg(short, long, default_value = "temporal_median")]
    pub output: PathBuf,
}

pub fn run(args: &MedianArgs) -> Result<()> {
    let config = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid temporal median config")?
    } else {
        build_config_from_args(args)
    };

    let files = list_frame_files(&args.input)
        .with_context(|| format!("Failed to list frames in {}", args.input.display()))?;
    if files.is_empty() {
        bail!("No TIFF or PNG frames found in {}", args.input.display());
    }

    let stack = Arc::new(load_stack(stack_name(&args.input), &files)?);
    print_median_summary(&config, &stack, &args.output);

    let total = stack.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Median [{bar:40}] {pos}/{len} frames")?
            .progress_chars("=> "),
    );

    let format = output_format(args, &config);
    let (tx, rx) = mpsc::channel();
    let handle = start_temporal_median(stack, config, tx)?;

    let output = loop {
        match rx.recv().context("Worker exited without a result")? {
            JobEvent::Progress { frame_index, total } => {
                debug!(frame_index, total, "Progress");
                pb.set_position(frame_index as u64);
            }
            JobEvent::Completed(output) => break output,
            JobEvent::Cancelled => {
                pb.abandon();
                bail!("Processing cancelled");
            }
            JobEvent::Failed { message } => {
                pb.abandon();
                bail!(message);
            }
        }
    };
    pb.finish();
    let status = handle.join()?;
    info!(%status, "Worker finished");

    let written = save_stack(&output, &args.output, format)?;
    println!(
        "\nSaved {} frames of \"{}\" to {}",
        written.len(),
        output.name(),
        args.output.display()
    );
    Ok(())
}

fn build_config_from_args(args: &MedianArgs) -> TemporalMedianConfig {
    TemporalMedianConfig {
        background_frames: args.background,
        temporal_offset: args.offset,
        output: if args.subtract {
            OutputMode::Subtract
        } else {
            OutputMode::Background
        },
    }
}

/// Residual frames go negative, so subtraction defaults to float output.
fn output_format(args: &MedianArgs, config: &TemporalMedianConfig) -> FrameFormat {
    let subtract = config.output == OutputMode::Subtract;
    match args.format.map(FrameFormat::from) {
        Some(format) => {
            if subtract && !format.is_lossless() {
                warn!(
                    ?format,
                    "Residuals outside [0, 1] will be clamped; use --format float-tiff to keep them"
                );
            }
            format
        }
        None if subtract => FrameFormat::FloatTiff,
        None => FrameFormat::default(),
    }
}

fn stack_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frames".to_string())
}
