//! `concord repair` command: inject missing protocol elements into a plan.

use std::path::Path;

use anyhow::Result;

use concord_core::{AlignmentPolicy, extract, repair_with, validate_with};

use crate::io;

/// Run the repair command.
///
/// The repaired plan goes to `output` (or stdout). The alignment note goes to
/// stdout when writing a file, and to stderr otherwise so stdout stays JSON.
pub fn run_repair(
    protocol: &Path,
    plan: &Path,
    output: Option<&Path>,
    policy: &AlignmentPolicy,
) -> Result<()> {
    let elements = extract(&io::load_protocol(protocol)?);
    let draft = io::load_plan(plan)?;

    let report = validate_with(&draft, &elements, policy);
    let outcome = repair_with(&draft, &report, &elements, policy);

    io::write_json(&outcome.plan, output)?;

    match output {
        Some(path) => {
            println!("{}", outcome.note.text);
            println!("Repaired plan written to {}", path.display());
        }
        None => eprintln!("{}", outcome.note.text),
    }

    Ok(())
}
