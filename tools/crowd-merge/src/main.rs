//! crowd-merge - character GLB consolidation tool
//!
//! Merges skinned character GLBs into a single atlased, optionally
//! decimated GLB for crowd rendering.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crowd_merge::config::{self, AtlasFormat, Lod, MergeOptions};
use crowd_merge::{io, pipeline, report};

#[derive(Parser)]
#[command(name = "crowd-merge")]
#[command(about = "Character GLB consolidation tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge GLB files into one
    Merge {
        /// GLB files to merge
        #[arg(short, long, num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Output GLB file
        #[arg(short, long)]
        output: PathBuf,

        /// Level of detail, 0-3
        #[arg(short, long, default_value = "0", value_parser = parse_lod)]
        lod: Lod,

        /// Merge meshes into one and textures into one atlas per slot
        #[arg(short, long)]
        merge: bool,

        /// Resize textures to fit within this size (ignored with --merge)
        #[arg(short, long)]
        resize: Option<u32>,

        /// Geometry compression level, 0-10. No codec ships with the tool,
        /// so without one plugged in the step only logs a warning
        #[arg(short, long, allow_negative_numbers = true)]
        draco: Option<i32>,

        /// Print the output structure as JSON
        #[arg(short, long)]
        inspect: bool,

        /// Atlas image encoding
        #[arg(long, value_enum, default_value_t = AtlasFormat::Jpeg)]
        atlas_format: AtlasFormat,
    },

    /// Run a merge described by a job file
    Build {
        /// Path to job.toml
        #[arg(default_value = "job.toml")]
        job: PathBuf,
    },

    /// Print sizes and structure of an existing GLB
    Inspect {
        /// Input GLB file
        input: PathBuf,
    },
}

fn parse_lod(value: &str) -> Result<Lod, String> {
    let level: u8 = value.parse().map_err(|_| format!("invalid LOD {:?}", value))?;
    Lod::new(level).map_err(|err| err.to_string())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Merge {
            files,
            output,
            lod,
            merge,
            resize,
            draco,
            inspect,
            atlas_format,
        } => {
            let options = MergeOptions {
                lod,
                merge,
                resize,
                draco,
                inspect,
                atlas_format,
                ..MergeOptions::new(files, output)
            };
            pipeline::run(&options, None)?;
        }

        Commands::Build { job } => {
            tracing::info!("Running job {:?}", job);
            let options = config::load_job(&job)?;
            pipeline::run(&options, None)?;
        }

        Commands::Inspect { input } => {
            let size = std::fs::metadata(&input)
                .with_context(|| format!("Failed to stat {:?}", input))?
                .len();
            let doc = io::load(&input)?;
            let report = report::inspect(&doc);
            tracing::info!("{:?}: {}", input, report::human_file_size(size));
            tracing::info!("    Meshes\t{}", report::human_file_size(report.sizes.meshes));
            tracing::info!("    Textures\t{}", report::human_file_size(report.sizes.textures));
            tracing::info!("    VRAM\t{}", report::human_file_size(report.sizes.vram));
            println!("{}", report.to_json()?);
        }
    }

    Ok(())
}
