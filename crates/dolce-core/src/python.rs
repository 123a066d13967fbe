//! PyO3 entry points exposed as the `_dolce_core` extension module.

use std::path::Path;

use pyo3::prelude::*;

use crate::commands;
use crate::config::DolceConfig;
use crate::errors::DolceResult;
use crate::logging::init_tracing;
use crate::oracle::Oracle;
use crate::rules::{reference_for, Catalogue};

fn check_to_string(path: &str, model: Option<String>, no_llm: bool) -> DolceResult<(i32, String)> {
    let path = Path::new(path);
    let catalogue = Catalogue::builtin()?;
    let mut config = DolceConfig::load(path)?;
    config.apply_overrides(model, no_llm);
    let oracle = commands::build_oracle(&config, &catalogue)?;

    let mut out = Vec::new();
    let summary = commands::run_check(
        path,
        &config,
        &catalogue,
        oracle.as_ref().map(|o| o as &dyn Oracle),
        &mut out,
    )?;
    Ok((summary.exit_code(), String::from_utf8_lossy(&out).into_owned()))
}

/// Check docstrings under `path`; returns `(exit_code, report)`.
#[pyfunction]
#[pyo3(signature = (path=".", model=None, no_llm=false))]
pub fn check_path(
    py: Python<'_>,
    path: &str,
    model: Option<String>,
    no_llm: bool,
) -> PyResult<(i32, String)> {
    init_tracing();
    let path = path.to_string();
    let result = py.allow_threads(move || check_to_string(&path, model, no_llm))?;
    Ok(result)
}

/// The rule catalogue as printed by `dolce rules`.
#[pyfunction]
pub fn list_rules() -> PyResult<String> {
    let catalogue = Catalogue::builtin()?;
    let mut out = Vec::new();
    commands::list_rules(&catalogue, &mut out)?;
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[pyfunction]
pub fn rule_reference(code: u16) -> String {
    reference_for(code)
}
