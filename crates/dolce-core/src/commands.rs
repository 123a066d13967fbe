//! Command implementations shared by the `dolce` binary and the Python module.

use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::config::DolceConfig;
use crate::errors::{DolceError, DolceResult};
use crate::extract;
use crate::models::{CheckStatus, Report};
use crate::oracle::{HttpOracle, Oracle};
use crate::rules::Catalogue;
use crate::store::cache::ResultCache;
use crate::verify::Verifier;

const STATUS_OK: &str = "[  OK   ]";
const STATUS_ERROR: &str = "[ ERROR ]";
const STATUS_UNKNOWN: &str = "[  ???  ]";

/// Tally of one `check` run, counted per segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub segments: usize,
    pub ok: usize,
    pub bad: usize,
    pub unknown: usize,
}

impl CheckSummary {
    /// Process exit code: 1 when any segment had a Bad verdict.
    pub fn exit_code(&self) -> i32 {
        if self.bad > 0 {
            1
        } else {
            0
        }
    }
}

/// Validate `config` and build the HTTP oracle it describes, if any.
pub fn build_oracle(
    config: &DolceConfig,
    catalogue: &Catalogue,
) -> DolceResult<Option<HttpOracle>> {
    config.validate(catalogue)?;
    config.oracle_settings()?.map(HttpOracle::new).transpose()
}

/// Check every in-scope segment under `path` and print a report to `out`.
///
/// Configuration problems and an unreachable oracle abort the run before
/// any segment is examined.
pub fn run_check(
    path: &Path,
    config: &DolceConfig,
    catalogue: &Catalogue,
    oracle: Option<&dyn Oracle>,
    out: &mut dyn Write,
) -> DolceResult<CheckSummary> {
    config.validate(catalogue)?;
    let ctx = config.check_context()?;
    let scopes = config.scope_kinds()?;

    let mut ruleset = config.effective_ruleset(catalogue);
    if oracle.is_none() {
        ruleset = ruleset.only_static();
    }
    if let Some(oracle) = oracle.filter(|_| ruleset.has_llm_rules()) {
        if !oracle.test_connection() {
            return Err(DolceError::Connection(
                "Could not reach the configured oracle".to_string(),
            ));
        }
    }
    info!(
        "Checking {} with {} rules ({})",
        path.display(),
        ruleset.len(),
        ruleset.references().join(", ")
    );

    let cache = ResultCache::for_project(path, &ruleset);
    let mut verifier = Verifier::new(ruleset, ctx, cache, oracle);
    let mut summary = CheckSummary::default();

    for segment in extract::extract(path, &config.exclude)? {
        if !scopes.contains(&segment.kind) {
            continue;
        }
        summary.segments += 1;
        let report = verifier.check_segment(&segment)?;

        let has_bad = has_status(&report, CheckStatus::Bad);
        let has_unknown = has_status(&report, CheckStatus::Unknown);
        if !has_bad && !has_unknown {
            summary.ok += 1;
            writeln!(out, "{STATUS_OK} {}", segment.location)?;
            continue;
        }
        if has_bad {
            summary.bad += 1;
            writeln!(out, "{STATUS_ERROR} {}", segment.location)?;
        }
        if has_unknown {
            summary.unknown += 1;
            writeln!(out, "{STATUS_UNKNOWN} {}", segment.location)?;
        }
        write_issues(&report, out)?;
    }

    let cache = verifier.finish();
    info!("Run finished: {:?}, cache {:?}", summary, cache.stats());
    write_summary(&summary, out)?;
    Ok(summary)
}

fn has_status(report: &Report<'_>, status: CheckStatus) -> bool {
    report.values().flatten().any(|v| v.status == status)
}

fn write_issues(report: &Report<'_>, out: &mut dyn Write) -> DolceResult<()> {
    for (rule, verdicts) in report {
        for verdict in verdicts.iter().filter(|v| !v.is_good()) {
            let mut line = format!("  - {}: {}", rule.reference, rule.description);
            if !verdict.issue.is_empty() {
                line.push_str(&format!(" ({})", verdict.issue));
            }
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn write_summary(summary: &CheckSummary, out: &mut dyn Write) -> DolceResult<()> {
    if summary.segments == 0 {
        writeln!(out, "\nNo code segments were checked.")?;
        return Ok(());
    }
    writeln!(out, "\nSummary:")?;
    if summary.unknown > 0 {
        writeln!(out, "? Unknown: {}", summary.unknown)?;
    }
    if summary.bad > 0 {
        writeln!(out, "✗ Incorrect: {}", summary.bad)?;
    }
    if summary.bad == 0 && summary.unknown == 0 {
        writeln!(out, "✓ All correct ({})", summary.ok)?;
    }
    Ok(())
}

/// Print the catalogue grouped by rule group, in code order.
pub fn list_rules(catalogue: &Catalogue, out: &mut dyn Write) -> DolceResult<()> {
    for (group, rules) in catalogue.by_group() {
        writeln!(out, "\n{group} rules:")?;
        for rule in rules {
            writeln!(
                out,
                "[{}] {:.<35} {}",
                rule.reference,
                format!("{} ", rule.name),
                rule.description
            )?;
        }
    }
    Ok(())
}
