//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - sets up logging
//! - parses CLI arguments
//! - runs the fit pipeline or the synthetic generator
//! - prints the summary and writes optional exports

use clap::Parser;
use log::info;

use crate::cli::{Command, FitArgs, ShapeArg, SynthArgs};
use crate::data::{SyntheticShape, SyntheticSpec, generate_capture};
use crate::domain::Roi;
use crate::error::AppError;

pub mod pipeline;

/// Skipped-row lines shown in the terminal summary.
const MAX_ROW_ERRORS_SHOWN: usize = 10;

/// Entry point for the `vfit` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry RUST_LOG.
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Synth(args) => handle_synth(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let run = pipeline::run_fit(&args)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.capture, &run.outcome.report, &run.config)
    );
    if !run.capture.row_errors.is_empty() {
        println!("Skipped rows:");
        print!("{}", crate::report::format_row_errors(&run.capture, MAX_ROW_ERRORS_SHOWN));
    }

    if let Some(path) = &args.export {
        crate::io::write_report_json(path, &run.outcome.report, &run.config)?;
        info!("wrote report {}", path.display());
    }
    if let Some(path) = &args.export_inliers {
        crate::io::write_inliers_csv(path, &run.outcome)?;
        info!("wrote inliers {}", path.display());
    }

    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = synthetic_spec_from_args(&args)?;
    let capture = generate_capture(&spec)?;
    crate::io::write_capture_csv(&args.out, capture.samples())?;
    println!("Wrote {} points to {}", capture.len(), args.out.display());
    Ok(())
}

pub fn synthetic_spec_from_args(args: &SynthArgs) -> Result<SyntheticSpec, AppError> {
    let point = pipeline::vec3(&args.point, "--point")?;
    let axis = pipeline::vec3(&args.axis, "--axis")?;
    let size = pipeline::vec3(&args.roi_size, "--roi-size")?;

    let shape = match args.shape {
        ShapeArg::Plane => SyntheticShape::Plane { point, normal: axis },
        ShapeArg::Line => SyntheticShape::Line { point, direction: axis },
    };

    Ok(SyntheticSpec {
        shape,
        count: args.count,
        noise_sigma: args.noise,
        outlier_fraction: args.outliers,
        roi: Roi::axis_aligned(nalgebra::Vector3::zeros(), size.x, size.y, size.z),
        seed: args.seed,
    })
}
