//! `concord check` command: run a plan through the alignment gate.

use std::path::Path;

use anyhow::Result;

use concord_core::{AlignmentGate, AlignmentPolicy, extract};

use crate::io;
use crate::validate_cmd::{render_report, short_fingerprint};

/// Run the check command. Returns whether the final plan is aligned.
pub fn run_check(
    protocol: &Path,
    plan: &Path,
    output: Option<&Path>,
    json: bool,
    policy: &AlignmentPolicy,
) -> Result<bool> {
    let elements = extract(&io::load_protocol(protocol)?);
    let draft = io::load_plan(plan)?;

    let outcome = AlignmentGate::new(*policy).run(&elements, &draft);

    if let Some(path) = output {
        io::write_json(&outcome.plan, Some(path))?;
    }

    if json {
        io::write_json(&outcome, None)?;
    } else {
        println!("Protocol: {} ({})", protocol.display(), short_fingerprint(&elements.fingerprint()));
        println!("Plan:     {}", plan.display());
        println!();
        println!("Initial: {}", outcome.initial.summary());
        println!("Final:   {}", outcome.final_report.summary());
        if let Some(note) = &outcome.note {
            println!("Note:    {}", note.text);
        }
        println!();
        print!("{}", render_report(&outcome.final_report, policy));
        println!();
        println!("Verdict: {}", outcome.verdict);
        if let Some(path) = output {
            println!("Final plan written to {}", path.display());
        }
    }

    Ok(outcome.verdict.is_pass())
}
