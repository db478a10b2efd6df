//! `concord validate` command: show how well a plan covers a protocol.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Result;

use concord_core::category::ElementCategory;
use concord_core::{AlignmentPolicy, ValidationReport, extract, validate_with};

use crate::io;

/// Run the validate command. Returns whether the plan is aligned.
pub fn run_validate(
    protocol: &Path,
    plan: &Path,
    json: bool,
    policy: &AlignmentPolicy,
) -> Result<bool> {
    let elements = extract(&io::load_protocol(protocol)?);
    let draft = io::load_plan(plan)?;
    let report = validate_with(&draft, &elements, policy);

    if json {
        io::write_json(&report, None)?;
    } else {
        println!("Protocol: {} ({})", protocol.display(), short_fingerprint(&elements.fingerprint()));
        println!("Plan:     {}", plan.display());
        println!();
        print!("{}", render_report(&report, policy));
    }

    Ok(report.is_aligned)
}

pub fn short_fingerprint(fingerprint: &str) -> &str {
    fingerprint.get(..12).unwrap_or(fingerprint)
}

/// Render a report as a coverage table followed by the missing names.
pub fn render_report(report: &ValidationReport, policy: &AlignmentPolicy) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{:<22} {:>8} {:>8} {:>9}", "CATEGORY", "COVERED", "TOTAL", "COVERAGE");
    let _ = writeln!(out, "{}", "-".repeat(50));
    for category in ElementCategory::ALL {
        let _ = writeln!(
            out,
            "{:<22} {:>8} {:>8} {:>8}%",
            category.plural_label(),
            report.coverage.get(category),
            report.totals.get(category),
            report.coverage_percentage.get(category)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Overall: {}% ({})",
        report.overall_coverage, policy.coverage_averaging
    );

    if report.missing_count() > 0 {
        let _ = writeln!(out);
        let _ = writeln!(out, "Missing:");
        for (category, names) in report.missing.iter() {
            if names.is_empty() {
                continue;
            }
            let _ = writeln!(out, "  {}: {}", category.plural_label(), names.join(", "));
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Status: {}",
        if report.is_aligned { "aligned" } else { "MISALIGNED" }
    );
    out
}
