//! Formatted terminal output.
//!
//! Formatting lives here so the engine stays free of presentation concerns and
//! output changes are localized.

use crate::domain::{FitConfig, FitReport};
use crate::io::IngestedCapture;

/// Format the full run summary (capture stats + fit diagnostics + angles).
pub fn format_run_summary(capture: &IngestedCapture, report: &FitReport, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== vfit - Geometry Fit ===\n");
    out.push_str(&format!(
        "Target: {} ({}) -> {}\n",
        report.target.code(),
        report.target.display_name(),
        report.primitive.display_name(),
    ));
    out.push_str(&format!("Basis: {} | up={}\n", report.basis.display_name(), fmt_vec(&report.up)));
    out.push_str(&format!(
        "Capture: rows={} used={} skipped={}\n",
        capture.rows_read,
        capture.rows_used(),
        capture.row_errors.len(),
    ));
    out.push_str(&format!(
        "Points: roi={} fitted={} | seed={}\n",
        report.roi_point_count, report.point_count, report.seed,
    ));

    out.push_str("\nFit diagnostics:\n");
    out.push_str(&format!(
        "  iterations={} tau={:.4}m\n",
        report.iterations, config.inlier_threshold_m
    ));
    out.push_str(&format!(
        "  inliers={} ratio={:.3} rms={:.5}m score={:.3}\n",
        report.inlier_count, report.inlier_ratio, report.residual_rms, report.quality_score,
    ));
    out.push_str(&format!(
        "  valid={} (ratio >= {:.2}, rms <= {:.4}m)\n",
        if report.is_valid { "yes" } else { "NO" },
        config.min_inlier_ratio,
        config.max_residual_rms_m,
    ));

    out.push_str("\nOrientation:\n");
    out.push_str(&format!("- pitch: {:>6.1} deg\n", report.pitch_deg));
    out.push_str(&format!("- roll : {:>6.1} deg\n", report.roll_deg));
    out.push_str(&format!("- dir  : {}\n", fmt_vec(&report.direction)));
    out.push_str(&format!("- at   : {}\n", fmt_vec(&report.anchor)));

    out
}

/// Format the first `max` skipped rows.
pub fn format_row_errors(capture: &IngestedCapture, max: usize) -> String {
    let mut out = String::new();
    for e in capture.row_errors.iter().take(max) {
        out.push_str(&format!("  line {:>6}: {}\n", e.line, e.message));
    }
    let hidden = capture.row_errors.len().saturating_sub(max);
    if hidden > 0 {
        out.push_str(&format!("  ... {hidden} more\n"));
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}
