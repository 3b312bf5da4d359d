//! ifsegment — 荧光显微镜细胞图像分割与定量的命令行入口.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use if_berry::normalize::Projection;
use if_berry::pipeline;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "ifsegment")]
#[command(about = "Cell segmentation and per-channel quantification from IF images")]
#[command(version)]
struct Cli {
    /// Print debug-level progress logs.
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Process images in parallel across worker threads.
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate cytoplasmic masks for every stack in a folder.
    CytoMask(CliCytoMaskArgs),

    /// Run the full segmentation pipeline and save trinary masks.
    Mask(CliMaskArgs),

    /// Quantify per-channel intensities under previously saved masks.
    Quantify(CliQuantifyArgs),
}

#[derive(Debug, Clone, Args)]
struct CliCytoMaskArgs {
    /// Path to directory with .npy image stacks.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to directory to save masks.
    #[arg(short, long)]
    output: PathBuf,

    /// Channel number of cytoplasmic marker (0-indexed).
    #[arg(short, long)]
    channel: usize,

    /// Z-projection mode: max or mean ("avg" is accepted for mean).
    #[arg(long, default_value = "max")]
    projection: Projection,
}

#[derive(Debug, Clone, Args)]
struct CliMaskArgs {
    /// Path to directory with .npy image stacks.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to directory to save masks.
    #[arg(short, long)]
    output: PathBuf,

    /// Channel number of nuclear marker (0-indexed).
    #[arg(short, long, default_value = "0")]
    nuclear_channel: usize,

    /// Channel number of cytoplasmic marker (0-indexed).
    #[arg(short, long, default_value = "3")]
    cyto_channel: usize,

    /// Z-projection mode: max or mean ("avg" is accepted for mean).
    #[arg(long, default_value = "max")]
    projection: Projection,
}

#[derive(Debug, Clone, Args)]
struct CliQuantifyArgs {
    /// Path to directory with .npy image stacks.
    #[arg(short, long)]
    input: PathBuf,

    /// Path to directory with saved trinary masks.
    #[arg(short, long)]
    masks: PathBuf,

    /// Path of the CSV file to write.
    #[arg(short, long)]
    output: PathBuf,

    /// Channel numbers to quantify (0-indexed, comma separated).
    #[arg(long, value_delimiter = ',', default_values_t = [1, 2])]
    channels: Vec<usize>,

    /// Z-projection mode: max or mean ("avg" is accepted for mean).
    #[arg(long, default_value = "max")]
    projection: Projection,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logger::SimpleLogger::new().with_level(level).init()?;

    match cli.command {
        Commands::CytoMask(args) => run_cyto_mask(&args, cli.parallel),
        Commands::Mask(args) => run_mask(&args, cli.parallel),
        Commands::Quantify(args) => run_quantify(&args, cli.parallel),
    }
}

fn run_cyto_mask(args: &CliCytoMaskArgs, parallel: bool) -> CliResult<()> {
    if parallel {
        pipeline::par_cyto_mask_folder(&args.input, &args.output, args.channel, args.projection)?;
    } else {
        pipeline::cyto_mask_folder(&args.input, &args.output, args.channel, args.projection)?;
    }
    Ok(())
}

fn run_mask(args: &CliMaskArgs, parallel: bool) -> CliResult<()> {
    let counts = if parallel {
        pipeline::par_mask_folder(
            &args.input,
            &args.output,
            args.nuclear_channel,
            args.cyto_channel,
            args.projection,
        )?
    } else {
        pipeline::mask_folder(
            &args.input,
            &args.output,
            args.nuclear_channel,
            args.cyto_channel,
            args.projection,
        )?
    };

    // 按输入顺序打一份孔位-细胞数清单, 失败的孔位记 NaN.
    println!("Well, Count");
    for (well, count) in &counts {
        match count {
            Some(n) => println!("{well}, {n}"),
            None => println!("{well}, NaN"),
        }
    }
    Ok(())
}

fn run_quantify(args: &CliQuantifyArgs, parallel: bool) -> CliResult<()> {
    let rows = if parallel {
        pipeline::par_quantify_folder(
            &args.input,
            &args.masks,
            &args.output,
            &args.channels,
            args.projection,
        )?
    } else {
        pipeline::quantify_folder(
            &args.input,
            &args.masks,
            &args.output,
            &args.channels,
            args.projection,
        )?
    };
    println!("{} rows written to {}", rows.len(), args.output.display());
    Ok(())
}
