//! Command-line parsing for the geometry fit engine.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! fitting code; `app` turns these structs into engine inputs.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{BasisKind, TargetSpecification};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "vfit", version, about = "Fit lines/planes to 3D captures and report pitch/roll")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a target primitive in a capture and report its orientation.
    Fit(FitArgs),
    /// Write a synthetic plane/line capture to CSV.
    Synth(SynthArgs),
}

/// Options for `vfit fit`.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Capture file (`.csv` with x,y,z[,confidence] or `.json`).
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: PathBuf,

    /// Target: A stem axis, B handle plane, C flange face, D pipe axis.
    #[arg(short = 't', long, value_enum)]
    pub target: TargetSpecification,

    /// Where "up" comes from.
    #[arg(long, value_enum, default_value_t = BasisKind::Imu)]
    pub basis: BasisKind,

    /// IMU up vector `x,y,z` (imu basis).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, conflicts_with = "gravity")]
    pub up: Option<Vec<f64>>,

    /// IMU gravity vector `x,y,z`; up is its negation (imu basis).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub gravity: Option<Vec<f64>>,

    /// Ground capture for the plane basis.
    #[arg(long, value_name = "PATH")]
    pub ground: Option<PathBuf>,

    /// Approximate up used to orient the ground normal (plane basis).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 1.0])]
    pub up_hint: Vec<f64>,

    /// Random seed for RANSAC and decimation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// ROI center `x,y,z` (meters).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, requires = "roi_size")]
    pub roi_center: Option<Vec<f64>>,

    /// ROI extent `width,height,depth` (meters).
    #[arg(long, value_delimiter = ',', requires = "roi_center")]
    pub roi_size: Option<Vec<f64>>,

    /// Base configuration JSON; flags below override it.
    #[arg(long, value_name = "JSON")]
    pub config: Option<PathBuf>,

    /// RANSAC inlier distance (meters).
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum inlier ratio for a valid fit.
    #[arg(long)]
    pub min_inlier_ratio: Option<f64>,

    /// Maximum residual RMS (meters) for a valid fit.
    #[arg(long)]
    pub max_rms: Option<f64>,

    /// Hard cap on RANSAC iterations.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Probability that at least one RANSAC draw is outlier-free.
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Minimum number of points after ROI filtering.
    #[arg(long)]
    pub min_points: Option<usize>,

    /// Larger captures are decimated to this many points.
    #[arg(long)]
    pub max_points: Option<usize>,

    /// Ignore samples below this confidence.
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Enable the k-NN statistical outlier pre-filter.
    #[arg(long)]
    pub outlier_filter: bool,

    /// Neighbours for the outlier pre-filter (implies `--outlier-filter`).
    #[arg(long)]
    pub outlier_neighbors: Option<usize>,

    /// Standard-deviation ratio for the outlier pre-filter (implies `--outlier-filter`).
    #[arg(long)]
    pub outlier_std_ratio: Option<f64>,

    /// Export the report (plus metadata) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export per-point inlier flags and residuals to CSV.
    #[arg(long = "export-inliers", value_name = "CSV")]
    pub export_inliers: Option<PathBuf>,
}

/// Synthetic primitive family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShapeArg {
    Plane,
    Line,
}

/// Options for `vfit synth`.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    #[arg(long, value_enum, default_value_t = ShapeArg::Plane)]
    pub shape: ShapeArg,

    /// Output CSV.
    #[arg(short = 'o', long, value_name = "CSV")]
    pub out: PathBuf,

    /// Point on the primitive `x,y,z`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 0.0])]
    pub point: Vec<f64>,

    /// Plane normal or line direction `x,y,z`.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, default_values_t = [0.0, 0.0, 1.0])]
    pub axis: Vec<f64>,

    /// Total points (inliers + outliers).
    #[arg(short = 'n', long, default_value_t = 1000)]
    pub count: usize,

    /// Per-axis Gaussian noise (meters).
    #[arg(long, default_value_t = 0.001)]
    pub noise: f64,

    /// Fraction of uniform outliers inside the ROI.
    #[arg(long, default_value_t = 0.1)]
    pub outliers: f64,

    /// ROI extent `width,height,depth` (meters), centered on the origin.
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 1.0, 1.0])]
    pub roi_size: Vec<f64>,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fit_with_overrides() {
        let cli = Cli::try_parse_from([
            "vfit", "fit", "-f", "cap.csv", "-t", "b", "--up", "0,0,-1", "--threshold", "0.01",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.target, TargetSpecification::HandlePlane);
        assert_eq!(args.up, Some(vec![0.0, 0.0, -1.0]));
        assert_eq!(args.threshold, Some(0.01));
        assert_eq!(args.basis, BasisKind::Imu);
        assert_eq!(args.up_hint, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn roi_needs_both_halves() {
        let res = Cli::try_parse_from(["vfit", "fit", "-f", "c.csv", "-t", "A", "--roi-center", "0,0,0"]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_synth_defaults() {
        let cli = Cli::try_parse_from(["vfit", "synth", "-o", "out.csv", "--shape", "line"]).unwrap();
        let Command::Synth(args) = cli.command else {
            panic!("expected synth");
        };
        assert_eq!(args.shape, ShapeArg::Line);
        assert_eq!(args.count, 1000);
        assert_eq!(args.axis, vec![0.0, 0.0, 1.0]);
    }
}
