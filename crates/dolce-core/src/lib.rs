//! Dolce core library: docstring linting for Python sources.
//!
//! Python files are split into code segments (modules, classes, functions,
//! methods, properties), each checked against a catalogue of rules.  Static
//! rules inspect the parsed docstring and signature; LLM rules are batched
//! into one oracle call per segment.  Verdicts are cached per ruleset so an
//! unchanged segment is never re-evaluated.

pub mod commands;
pub mod config;
pub mod docstring;
pub mod errors;
pub mod extract;
pub mod logging;
pub mod models;
pub mod oracle;
pub mod rules;
pub mod store;
pub mod verify;

#[cfg(feature = "python")]
pub mod python;

// ---------------------------------------------------------------------------
// Top-level Python module: _dolce_core
// ---------------------------------------------------------------------------

#[cfg(feature = "python")]
#[pyo3::pymodule]
fn _dolce_core(m: &pyo3::Bound<'_, pyo3::types::PyModule>) -> pyo3::PyResult<()> {
    use pyo3::prelude::*;
    use pyo3::wrap_pyfunction;

    m.add("RULE_PREFIX", rules::RULE_PREFIX)?;

    m.add_function(wrap_pyfunction!(python::check_path, m)?)?;
    m.add_function(wrap_pyfunction!(python::list_rules, m)?)?;
    m.add_function(wrap_pyfunction!(python::rule_reference, m)?)?;

    Ok(())
}
