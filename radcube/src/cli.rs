use clap::{ArgGroup, Args, Parser, Subcommand};
use radcube_lib::{FileType, FrameError, FrameGeometry};
use simplelog::LevelFilter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Log level for output (error, warn, info, debug, trace)
    #[arg(global = true, long, default_value = "info")]
    pub loglevel: LevelFilter,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn the frames of a raw ADC capture into radar cubes
    Process(ProcessArgs),

    /// Report how a capture file splits into frames
    Inspect(InspectArgs),
}

/// Dimensions of a capture frame
#[derive(Args, Clone, Copy)]
pub struct GeometryArgs {
    /// Chirp loops per frame
    #[arg(long, default_value = "128")]
    pub chirp_loops: usize,

    /// Number of transmit channels
    #[arg(long, default_value = "3")]
    pub tx: usize,

    /// Number of receive channels
    #[arg(long, default_value = "4")]
    pub rx: usize,

    /// ADC samples per chirp
    #[arg(long, default_value = "256")]
    pub samples: usize,
}

impl GeometryArgs {
    pub fn geometry(&self) -> Result<FrameGeometry, FrameError> {
        FrameGeometry::new(self.chirp_loops, self.tx, self.rx, self.samples)
    }
}

#[derive(Parser)]
#[command(group = ArgGroup::new("output").required(true).multiple(true).args(&["out", "print"]))]
pub struct ProcessArgs {
    /// Raw ADC capture to read frames from
    #[arg(long)]
    pub bin_in: PathBuf,

    /// Number of frames to process (default: all full frames)
    #[arg(long)]
    pub frames: Option<usize>,

    /// Number of frames to skip at the start of the capture
    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Output file for the radar cubes
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Specify output format, e.g., 'cf32' or 'parquet'
    #[arg(long, default_value = "cf32")]
    pub format: FileType,

    /// Whether to print a summary line per frame
    #[arg(long, default_value = "false")]
    pub print: bool,

    #[command(flatten)]
    pub geometry: GeometryArgs,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Raw ADC capture to inspect
    #[arg(long)]
    pub bin_in: PathBuf,

    #[command(flatten)]
    pub geometry: GeometryArgs,
}
