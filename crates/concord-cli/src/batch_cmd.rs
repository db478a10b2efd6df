//! `concord batch` command: run the alignment gate over many protocol/plan
//! pairs listed in a TOML manifest.
//!
//! ```toml
//! [[pairs]]
//! name = "patient-42"
//! protocol = "protocols/42.json"
//! plan = "plans/42.json"   # optional; omitted means an absent draft
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use concord_core::{AlignmentGate, AlignmentPolicy, EngagementPlanDraft, GateVerdict, extract};

use crate::io;

// -----------------------------------------------------------------------
// Manifest
// -----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub pairs: Vec<PairSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PairSpec {
    pub name: Option<String>,
    pub protocol: PathBuf,
    pub plan: Option<PathBuf>,
}

impl PairSpec {
    fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("pair-{}", index + 1))
    }
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read manifest {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse manifest {}", path.display()))
}

// -----------------------------------------------------------------------
// Results
// -----------------------------------------------------------------------

/// Result of checking one pair.
#[derive(Debug)]
pub struct PairResult {
    pub index: usize,
    pub name: String,
    pub outcome: Result<PairOutcome>,
}

#[derive(Debug)]
pub struct PairOutcome {
    pub verdict: GateVerdict,
    pub initial_coverage: u32,
    pub final_coverage: u32,
}

/// Verdict counts over a batch.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub aligned: usize,
    pub repaired: usize,
    pub unresolved: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.aligned + self.repaired + self.unresolved + self.failed
    }

    fn record(&mut self, outcome: &Result<PairOutcome>) {
        match outcome {
            Ok(o) => match o.verdict {
                GateVerdict::Aligned => self.aligned += 1,
                GateVerdict::Repaired { .. } => self.repaired += 1,
                GateVerdict::Unresolved { .. } => self.unresolved += 1,
            },
            Err(_) => self.failed += 1,
        }
    }
}

// -----------------------------------------------------------------------
// Run
// -----------------------------------------------------------------------

/// Run the batch command: check every pair, print a table, return the counts.
pub async fn run_batch(
    manifest_path: &Path,
    max_parallel: usize,
    policy: AlignmentPolicy,
) -> Result<BatchSummary> {
    let manifest = load_manifest(manifest_path)?;
    let base_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let results = check_pairs(manifest.pairs, base_dir, max_parallel, policy).await?;

    println!(
        "{:<30} {:<12} {:>8} {:>8}",
        "PAIR", "VERDICT", "INITIAL", "FINAL"
    );
    println!("{}", "-".repeat(61));

    let mut summary = BatchSummary::default();
    for result in &results {
        let name_display = if result.name.len() > 28 {
            format!("{}...", truncate(&result.name, 25))
        } else {
            result.name.clone()
        };
        match &result.outcome {
            Ok(o) => println!(
                "{:<30} {:<12} {:>7}% {:>7}%",
                name_display,
                verdict_label(&o.verdict),
                o.initial_coverage,
                o.final_coverage
            ),
            Err(e) => println!("{name_display:<30} {:<12} {e:#}", "error"),
        }
        summary.record(&result.outcome);
    }

    println!();
    println!(
        "{} pairs: {} aligned, {} repaired, {} unresolved, {} failed",
        summary.total(),
        summary.aligned,
        summary.repaired,
        summary.unresolved,
        summary.failed
    );

    Ok(summary)
}

/// Check pairs concurrently, at most `max_parallel` at a time. Results come
/// back in manifest order.
pub async fn check_pairs(
    pairs: Vec<PairSpec>,
    base_dir: PathBuf,
    max_parallel: usize,
    policy: AlignmentPolicy,
) -> Result<Vec<PairResult>> {
    let semaphore = Arc::new(Semaphore::new(max_parallel.max(1)));
    let base_dir = Arc::new(base_dir);
    let mut set = JoinSet::new();

    for (index, pair) in pairs.into_iter().enumerate() {
        let permit = semaphore.clone().acquire_owned().await?;
        let base_dir = Arc::clone(&base_dir);
        let name = pair.display_name(index);

        set.spawn(async move {
            let outcome =
                tokio::task::spawn_blocking(move || check_pair(&pair, &base_dir, policy))
                    .await
                    .context("pair check panicked")
                    .and_then(|r| r);
            drop(permit);
            PairResult {
                index,
                name,
                outcome,
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = set.join_next().await {
        let result = joined.context("batch task failed")?;
        if let Err(e) = &result.outcome {
            tracing::warn!(pair = %result.name, error = %e, "pair check failed");
        }
        results.push(result);
    }
    results.sort_by_key(|r| r.index);
    Ok(results)
}

fn check_pair(pair: &PairSpec, base_dir: &Path, policy: AlignmentPolicy) -> Result<PairOutcome> {
    let protocol = io::load_protocol(&base_dir.join(&pair.protocol))?;
    let draft = match &pair.plan {
        Some(plan) => io::load_plan(&base_dir.join(plan))?,
        None => EngagementPlanDraft::absent(),
    };

    let elements = extract(&protocol);
    let outcome = AlignmentGate::new(policy).run(&elements, &draft);

    Ok(PairOutcome {
        verdict: outcome.verdict,
        initial_coverage: outcome.initial.overall_coverage,
        final_coverage: outcome.final_report.overall_coverage,
    })
}

fn verdict_label(verdict: &GateVerdict) -> &'static str {
    match verdict {
        GateVerdict::Aligned => "aligned",
        GateVerdict::Repaired { .. } => "repaired",
        GateVerdict::Unresolved { .. } => "unresolved",
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
