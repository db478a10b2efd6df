//! `concord extract` command: print the elements a protocol contains.

use std::path::Path;

use anyhow::Result;

use concord_core::extract;

use crate::io;

/// Run the extract command.
pub fn run_extract(protocol: &Path, output: Option<&Path>) -> Result<()> {
    let doc = io::load_protocol(protocol)?;
    let elements = extract(&doc);

    tracing::info!(
        protocol = %protocol.display(),
        elements = elements.total_elements(),
        safety_constraints = elements.safety_constraints.len(),
        fingerprint = %elements.fingerprint(),
        "extracted protocol elements"
    );

    io::write_json(&elements, output)?;
    if let Some(path) = output {
        println!(
            "Wrote {} elements ({} safety constraints) to {}",
            elements.total_elements(),
            elements.safety_constraints.len(),
            path.display()
        );
    }

    Ok(())
}
