//! CLI application for yawning detection on a single image.
//!
//! Usage:
//!   yawncam photo.jpg                     # Human-readable report
//!   yawncam photo.jpg --json              # JSON report
//!   yawncam photo.jpg -o annotated.png    # Save an annotated copy

use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;
use yawncam::{mark_inner_lip, outline_face, YawnAnalyzer, YAWN_RATIO_LIMIT};

#[derive(Parser, Debug)]
#[command(name = "yawncam")]
#[command(author, version, about = "Yawning detection on a single image", long_about = None)]
struct Args {
    /// Input image file
    #[arg(required = true)]
    image: PathBuf,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Write an annotated copy of the image here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Face detector model path
    #[arg(long, default_value = "seeta_fd_frontal_v1.0.bin")]
    detector: PathBuf,

    /// Landmark model path (.dat, .dat.bz2, or native .bin)
    #[arg(long, default_value = "shape_predictor_68_face_landmarks.dat")]
    landmarks: PathBuf,

    /// Minimum face size for detection
    #[arg(long, default_value_t = yawncam::DEFAULT_MIN_FACE_SIZE)]
    min_face_size: u32,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Report {
    image: String,
    width: u32,
    height: u32,
    faces_detected: usize,
    status: String,
    yawn_ratio: Option<f32>,
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
    let mut analyzer =
        YawnAnalyzer::from_files(&args.detector, &args.landmarks, args.min_face_size)?;

    let img = image::open(&args.image)?;
    let gray = img.to_luma8();
    let (width, height) = gray.dimensions();

    let analysis = analyzer.analyze(&gray);

    if let Some(ref path) = args.output {
        let mut annotated = img.to_rgba8();
        if let Some(ref face) = analysis.face {
            outline_face(&mut annotated, face);
        }
        if let Some(ref lm) = analysis.landmarks {
            mark_inner_lip(&mut annotated, lm);
        }
        annotated.save(path)?;
        log::info!("annotated copy written to {}", path.display());
    }

    let report = Report {
        image: args.image.display().to_string(),
        width,
        height,
        faces_detected: analysis.faces,
        status: analysis.status.label().to_string(),
        yawn_ratio: analysis.ratio,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_human_readable(&report));
    }

    Ok(())
}

fn format_human_readable(report: &Report) -> String {
    let mut s = String::new();

    s.push_str(&format!(
        "Image: {} ({}x{})\n",
        report.image, report.width, report.height
    ));
    s.push_str(&format!("Faces detected: {}\n", report.faces_detected));
    match report.yawn_ratio {
        Some(ratio) => s.push_str(&format!(
            "Mouth ratio: {:.3} (limit {})\n",
            ratio, YAWN_RATIO_LIMIT
        )),
        None => s.push_str("Mouth ratio: n/a\n"),
    }
    s.push_str(&format!("Status: {}\n", report.status));

    s
}
