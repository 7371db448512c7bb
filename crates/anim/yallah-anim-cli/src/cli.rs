//! Command-line definitions for yallah-anim

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use yallah_anim_core::Preset;

#[derive(Parser)]
#[command(name = "yallah-anim")]
#[command(version, about = "Retarget rig animations with per-bone rotation offsets")]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// JSON configuration file (missing fields keep their defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Log filter for the verbosity flags; `RUST_LOG` can still override it.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply rotation offsets to an exported action
    Apply(ApplyArgs),

    /// Classify a rest skeleton as T-pose or A-pose
    DetectPose {
        /// Rest skeleton JSON file
        skeleton: PathBuf,
    },

    /// Add a constant to every value of one curve
    Shift(ShiftArgs),

    /// Print a built-in offset table as JSON
    Preset {
        #[arg(value_enum)]
        name: PresetArg,
    },
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Exported action JSON file
    pub action: PathBuf,

    #[command(flatten)]
    pub source: OffsetSource,

    /// Apply the inverse offsets, undoing an earlier run
    #[arg(long)]
    pub invert: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Where the offset table comes from; exactly one is required.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct OffsetSource {
    /// Offset table JSON file
    #[arg(long)]
    pub offsets: Option<PathBuf>,

    /// Built-in offset table
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Rest skeleton JSON; the table is chosen by detected rest pose
    #[arg(long)]
    pub skeleton: Option<PathBuf>,
}

#[derive(Args)]
pub struct ShiftArgs {
    /// Exported action JSON file
    pub action: PathBuf,

    /// Amount added to every keyframe value
    #[arg(long, allow_hyphen_values = true)]
    pub delta: f64,

    /// Bone whose location curve is shifted
    #[arg(long, default_value = "root", conflicts_with = "data_path")]
    pub bone: String,

    /// Explicit data path instead of a bone location
    #[arg(long)]
    pub data_path: Option<String>,

    /// Array index of the curve (2 = Z for locations)
    #[arg(long, default_value_t = 2)]
    pub index: usize,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PresetArg {
    TPose,
    APose,
    TPoseTwist,
}

impl From<PresetArg> for Preset {
    fn from(p: PresetArg) -> Self {
        match p {
            PresetArg::TPose => Preset::TPose,
            PresetArg::APose => Preset::APose,
            PresetArg::TPoseTwist => Preset::TPoseTwist,
        }
    }
}
