//! Terminal output — spinners and styled status lines.
//!
//! Uses `indicatif` for the per-submission spinner and `console` for color.
//! All operator-facing output funnels through here; the protocol and driver
//! stay free of raw `println!` calls.

use std::path::Path;
use std::time::Duration;

use console::{Style, style};
use indicatif::{ProgressBar, ProgressStyle};

use crate::brain::CheckValue;
use crate::driver::RunSummary;
use crate::filter::FilterSummary;
use crate::report::REQUIRED_GATES;
use crate::submission::SubmissionOutcome;

/// Visual progress for one in-flight submission.
pub struct SubmissionProgress {
    pb: ProgressBar,
    alpha_id: String,
    green: Style,
    red: Style,
    yellow: Style,
    verbose: bool,
}

impl SubmissionProgress {
    pub fn start(alpha_id: &str, verbose: bool) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("invalid template"),
        );
        pb.set_message(format!("submitting {alpha_id}"));
        pb.enable_steady_tick(Duration::from_millis(100));
        Self {
            pb,
            alpha_id: alpha_id.to_string(),
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            verbose,
        }
    }

    /// A progress sink that draws nothing; used by tests.
    pub fn hidden() -> Self {
        Self {
            pb: ProgressBar::hidden(),
            alpha_id: String::new(),
            green: Style::new(),
            red: Style::new(),
            yellow: Style::new(),
            verbose: false,
        }
    }

    pub fn attempt(&self, n: u32, max: u32) {
        self.pb
            .set_message(format!("submitting {} (attempt {n}/{max})", self.alpha_id));
    }

    pub fn backoff(&self, delay: Duration) {
        self.pb.println(format!(
            "  {} transient response, retrying in {}s",
            self.yellow.apply_to("↻"),
            delay.as_secs_f64()
        ));
    }

    pub fn waiting(&self, delay: Duration) {
        if self.verbose {
            self.pb.println(format!(
                "  {} server asked to wait {}s",
                self.yellow.apply_to("…"),
                delay.as_secs_f64()
            ));
        }
    }

    pub fn ceiling_reached(&self, ceiling: Duration) {
        self.pb.println(format!(
            "  {} polling ceiling of {}s reached, giving up on {}",
            self.red.apply_to("✗"),
            ceiling.as_secs(),
            self.alpha_id
        ));
    }

    pub fn finish(&self, outcome: &SubmissionOutcome) {
        self.pb.finish_and_clear();
        match outcome {
            SubmissionOutcome::Success => {
                println!(
                    "  {} {} {outcome}",
                    self.green.apply_to("✓"),
                    self.alpha_id
                );
            }
            SubmissionOutcome::RejectedAfterReview { checks } => {
                println!("  {} {} {outcome}", self.red.apply_to("✗"), self.alpha_id);
                println!("    {}", check_summary(checks));
            }
            other => {
                println!("  {} {} {other}", self.red.apply_to("✗"), self.alpha_id);
            }
        }
    }
}

/// One-line diagnostic over the post-review checks: the required gates
/// first, then whatever extra checks the platform reported.
pub fn check_summary(checks: &[CheckValue]) -> String {
    let mut parts: Vec<String> = REQUIRED_GATES
        .iter()
        .map(|gate| {
            let value = checks
                .iter()
                .find(|check| check.name == *gate)
                .map(|check| check.value.to_string())
                .unwrap_or_else(|| "missing".to_string());
            format!("{gate}={value}")
        })
        .collect();
    for check in checks {
        if !REQUIRED_GATES.contains(&check.name.as_str()) {
            parts.push(format!("{}={}", check.name, check.value));
        }
    }
    parts.join(", ")
}

pub fn print_auth_ok() {
    println!("{} authenticated", style("✓").green().bold());
}

pub fn print_filter_summary(summary: &FilterSummary, destination: &Path) {
    println!(
        "{} {} eligible candidate(s) saved to {} (scanned {}, skipped {})",
        style("✓").green().bold(),
        summary.eligible.len(),
        destination.display(),
        summary.scanned,
        summary.skipped
    );
}

pub fn print_run_summary(summary: &RunSummary, verbose: bool) {
    let header_style = if summary.met_target() {
        Style::new().green().bold()
    } else {
        Style::new().yellow().bold()
    };
    println!();
    println!("{}", header_style.apply_to("─── Run Summary ───"));
    println!(
        "  {}/{} submissions succeeded, {} failed, {} still pending",
        summary.succeeded.len(),
        summary.target,
        summary.failed.len(),
        summary.remaining
    );
    if !summary.met_target() {
        println!(
            "  {} target unmet: {} of {} requested",
            style("⚠").yellow().bold(),
            summary.succeeded.len(),
            summary.target
        );
    }
    if verbose {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).unwrap_or_default()
        );
    }
}

pub fn print_interrupted(succeeded: usize, failed: usize, remaining: usize) {
    eprintln!(
        "{} interrupted: {succeeded} succeeded, {failed} failed, {remaining} still pending",
        style("⚠").yellow().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn check_summary_covers_required_gates_and_extras() {
        let checks = vec![
            CheckValue {
                name: "LOW_SHARPE".into(),
                value: json!(1.02),
            },
            CheckValue {
                name: "SELF_CORRELATION".into(),
                value: json!(0.81),
            },
        ];
        let summary = check_summary(&checks);
        assert!(summary.contains("LOW_SHARPE=1.02"));
        assert!(summary.contains("LOW_FITNESS=missing"));
        assert!(summary.contains("SELF_CORRELATION=0.81"));
    }

    #[test]
    fn check_summary_on_empty_checks_reports_everything_missing() {
        let summary = check_summary(&[]);
        for gate in REQUIRED_GATES {
            assert!(summary.contains(&format!("{gate}=missing")));
        }
    }
}
