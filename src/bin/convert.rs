//! Model tooling: inspect a shape-predictor file, optionally convert it to
//! the native encoding for faster startup.
//!
//! Usage:
//!   yawncam-convert shape_predictor_68_face_landmarks.dat.bz2
//!   yawncam-convert model.dat -o model.bin

use clap::Parser;
use std::path::PathBuf;
use yawncam::ShapePredictor;

#[derive(Parser, Debug)]
#[command(name = "yawncam-convert")]
#[command(author, version, about = "Inspect and convert landmark models", long_about = None)]
struct Args {
    /// Model file (.dat, .dat.bz2, or native .bin)
    #[arg(required = true)]
    model: PathBuf,

    /// Write the native encoding here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let model = ShapePredictor::from_path(&args.model)?;

    println!("Model: {}", args.model.display());
    println!("Landmarks: {}", model.landmark_count());
    println!("Cascade stages: {}", model.stage_count());

    let mut total_trees = 0usize;
    let mut total_leaves = 0usize;
    for (i, stage) in model.stages().iter().enumerate() {
        let splits: usize = stage.trees.iter().map(|t| t.splits.len()).sum();
        let leaves: usize = stage.trees.iter().map(|t| t.leaves.len()).sum();
        total_trees += stage.trees.len();
        total_leaves += leaves;
        println!(
            "  stage {:2}: {} trees, {} sampled features, {} splits, {} leaves",
            i,
            stage.trees.len(),
            stage.feature_count(),
            splits,
            leaves
        );
    }
    println!("Total: {} trees, {} leaf shapes", total_trees, total_leaves);

    if let Some(ref path) = args.output {
        model.save(path)?;
        println!("Native model written to {}", path.display());
    }

    Ok(())
}
