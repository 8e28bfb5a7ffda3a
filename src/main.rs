//! `chisel`: inspect, convert and transform stored chiseled-block worlds.

mod commands;
mod config;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "chisel", version, about = "Sub-block voxel world tool")]
struct Cli {
    /// Config file; defaults apply when it does not exist
    #[arg(long, short, global = true, default_value = "chisel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a summary of every chiseled block in a world document
    Inspect {
        world: PathBuf,
        /// Only this block, as x,y,z
        #[arg(long, value_parser = parse_triplet)]
        block: Option<[i64; 3]>,
    },
    /// Re-encode every block in another byte layout
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Target layout; the configured default when omitted
        #[arg(long, value_enum)]
        to: Option<VersionArg>,
    },
    /// Rotate or mirror blocks in place
    Transform {
        input: PathBuf,
        /// Output file; overwrites the input when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only this block, as x,y,z
        #[arg(long, value_parser = parse_triplet)]
        block: Option<[i64; 3]>,
        #[command(subcommand)]
        op: TransformOp,
    },
    /// Chisel or fill bits with a tool shape
    Carve(CarveArgs),
    /// Exchange regions as `[C&B](...)[C&B]` strings
    Share {
        #[command(subcommand)]
        op: ShareOp,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum TransformOp {
    Rotate {
        #[arg(long, value_enum)]
        axis: AxisArg,
        /// Quarter turns
        #[arg(long, default_value_t = 1)]
        times: u32,
    },
    Mirror {
        #[arg(long, value_enum)]
        axis: AxisArg,
    },
}

#[derive(Args, Debug)]
struct CarveArgs {
    world: PathBuf,
    /// Target bit, as x,y,z
    #[arg(long, value_parser = parse_triplet)]
    at: [i64; 3],
    #[arg(long, value_enum, default_value_t = ShapeArg::Single)]
    shape: ShapeArg,
    /// Cube edge or sphere diameter in bits
    #[arg(long, default_value_t = 1)]
    size: u32,
    /// Fill with this state name instead of removing bits
    #[arg(long)]
    place: Option<String>,
    /// Show what would change, then undo it
    #[arg(long)]
    preview: bool,
}

#[derive(Subcommand, Debug)]
enum ShareOp {
    /// Print the share string for the blocks between two corners
    Export {
        world: PathBuf,
        #[arg(long, value_parser = parse_triplet)]
        from: [i64; 3],
        #[arg(long, value_parser = parse_triplet)]
        to: [i64; 3],
        /// Write the string here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Paste a share string into a world
    Import {
        world: PathBuf,
        /// File holding the share string
        input: PathBuf,
        /// Lowest block of the pasted region, as x,y,z
        #[arg(long, value_parser = parse_triplet, default_value = "0,0,0")]
        at: [i64; 3],
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AxisArg {
    X,
    Y,
    Z,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum VersionArg {
    Legacy,
    Compact,
    Paletted,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeArg {
    Single,
    Cube,
    Sphere,
}

fn parse_triplet(s: &str) -> Result<[i64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z, got `{s}`"));
    };
    let p = |v: &str| v.parse::<i64>().map_err(|e| format!("`{v}`: {e}"));
    Ok([p(x)?, p(y)?, p(z)?])
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
