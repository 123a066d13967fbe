//! `[tool.dolce]` configuration read from `pyproject.toml`.
//!
//! Keys may be written kebab-case or snake_case. Values are only checked
//! against the rule catalogue and numeric bounds in [`DolceConfig::validate`],
//! which must run before any segment is processed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::docstring::DocStyle;
use crate::errors::{DolceError, DolceResult};
use crate::models::SegmentKind;
use crate::oracle::{OracleSettings, Provider};
use crate::rules::{Catalogue, CheckContext, RuleSet};

pub const PYPROJECT_FILE: &str = "pyproject.toml";

pub const DEFAULT_EXCLUDES: &[&str] = &[
    "__init__.py",
    "setup.py",
    "conftest.py",
    "tests/*",
    "test_*.py",
    "*_test.py",
    "*/tests/*",
    ".venv",
    ".git",
    "dist",
];

pub const DEFAULT_SCOPES: &[&str] = &["function", "class", "method", "property"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DolceConfig {
    // Rule selection
    pub target: Option<Vec<String>>,
    pub disable: Vec<String>,
    pub exclude: Vec<String>,

    // Segment options
    #[serde(alias = "ignore_variadic_positional", alias = "ignore-args", alias = "ignore_args")]
    pub ignore_variadic_positional: bool,
    #[serde(alias = "ignore_variadic_keyword", alias = "ignore-kwargs", alias = "ignore_kwargs")]
    pub ignore_variadic_keyword: bool,
    #[serde(
        alias = "ignore_private_segments",
        alias = "ignore-private-functions",
        alias = "ignore_private_functions"
    )]
    pub ignore_private_segments: bool,
    pub scopes: Vec<String>,
    #[serde(alias = "ensure_style")]
    pub ensure_style: Option<String>,

    // Oracle
    pub provider: Option<String>,
    pub url: Option<String>,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(alias = "api_key")]
    pub api_key: Option<String>,
    pub temperature: f32,
    #[serde(alias = "max_tokens")]
    pub max_tokens: u32,
    /// Seconds.
    pub timeout: f64,
    #[serde(alias = "max_retries")]
    pub max_retries: u32,
    /// Seconds.
    #[serde(alias = "retry_delay")]
    pub retry_delay: f64,
}

impl Default for DolceConfig {
    fn default() -> Self {
        Self {
            target: None,
            disable: Vec::new(),
            exclude: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            ignore_variadic_positional: true,
            ignore_variadic_keyword: true,
            ignore_private_segments: true,
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            ensure_style: None,
            provider: None,
            url: None,
            model: None,
            api_key: None,
            temperature: 0.0,
            max_tokens: 2000,
            timeout: 120.0,
            max_retries: 3,
            retry_delay: 1.0,
        }
    }
}

#[derive(Default, Deserialize)]
struct PyProject {
    #[serde(default)]
    tool: Tool,
}

#[derive(Default, Deserialize)]
struct Tool {
    dolce: Option<DolceConfig>,
}

/// Treat an empty string the same as an absent value.
fn set(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DolceConfig {
    /// Parse the `[tool.dolce]` table out of a `pyproject.toml` document.
    pub fn from_pyproject_str(text: &str) -> DolceResult<Self> {
        let pyproject: PyProject = toml::from_str(text)?;
        Ok(pyproject.tool.dolce.unwrap_or_default())
    }

    /// Load the configuration from the nearest `pyproject.toml` at or above
    /// `start`; defaults when there is none.
    pub fn load(start: &Path) -> DolceResult<Self> {
        match find_pyproject(start) {
            Some(path) => {
                debug!("Reading configuration from {}", path.display());
                let text = std::fs::read_to_string(&path)?;
                Self::from_pyproject_str(&text)
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, model: Option<String>, no_llm: bool) {
        if let Some(model) = model {
            self.model = Some(model);
        }
        if no_llm {
            self.url = None;
        }
    }

    /// Whether an oracle endpoint is configured.
    pub fn llm_enabled(&self) -> bool {
        set(&self.url).is_some()
    }

    pub fn validate(&self, catalogue: &Catalogue) -> DolceResult<()> {
        if let Some(target) = &self.target {
            catalogue.validate_references(target)?;
        }
        catalogue.validate_references(&self.disable)?;
        self.scope_kinds()?;
        self.ensure_style()?;

        if let Some(url) = set(&self.url) {
            if set(&self.model).is_none() {
                return Err(DolceError::Config(format!(
                    "Oracle url '{url}' is set but no model is configured"
                )));
            }
            self.provider()?;
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DolceError::Config(format!(
                "temperature must be between 0 and 1, got {}",
                self.temperature
            )));
        }
        if seconds("timeout", self.timeout)?.is_zero() {
            return Err(DolceError::Config(format!(
                "timeout must be greater than 0, got {}",
                self.timeout
            )));
        }
        seconds("retry-delay", self.retry_delay)?;
        Ok(())
    }

    pub fn scope_kinds(&self) -> DolceResult<Vec<SegmentKind>> {
        self.scopes
            .iter()
            .map(|scope| {
                SegmentKind::from_name(scope)
                    .ok_or_else(|| DolceError::Config(format!("Unknown scope '{scope}'")))
            })
            .collect()
    }

    pub fn ensure_style(&self) -> DolceResult<Option<DocStyle>> {
        match set(&self.ensure_style) {
            Some(name) => DocStyle::from_name(name)
                .map(Some)
                .ok_or_else(|| DolceError::Config(format!("Unknown docstring style '{name}'"))),
            None => Ok(None),
        }
    }

    fn provider(&self) -> DolceResult<Provider> {
        let name = set(&self.provider).ok_or_else(|| {
            DolceError::Config("Oracle url is set but no provider is configured".to_string())
        })?;
        Provider::from_name(name)
            .ok_or_else(|| DolceError::Config(format!("Unknown oracle provider '{name}'")))
    }

    pub fn check_context(&self) -> DolceResult<CheckContext> {
        Ok(CheckContext {
            ignore_variadic_positional: self.ignore_variadic_positional,
            ignore_variadic_keyword: self.ignore_variadic_keyword,
            ignore_private_segments: self.ignore_private_segments,
            ensure_style: self.ensure_style()?,
        })
    }

    /// Rules selected by `target`/`disable`; LLM rules are dropped when no
    /// oracle is configured.
    pub fn effective_ruleset<'c>(&self, catalogue: &'c Catalogue) -> RuleSet<'c> {
        let ruleset = catalogue.effective(self.target.as_deref(), &self.disable);
        if self.llm_enabled() {
            ruleset
        } else {
            ruleset.only_static()
        }
    }

    /// Oracle connection settings, `None` when no url is configured.
    pub fn oracle_settings(&self) -> DolceResult<Option<OracleSettings>> {
        let Some(url) = set(&self.url) else {
            return Ok(None);
        };
        let model = set(&self.model).ok_or_else(|| {
            DolceError::Config(format!("Oracle url '{url}' is set but no model is configured"))
        })?;
        let mut settings = OracleSettings::new(self.provider()?, url, model);
        settings.api_key = set(&self.api_key).and_then(|var| std::env::var(var).ok());
        settings.temperature = self.temperature;
        settings.max_tokens = self.max_tokens;
        settings.timeout = seconds("timeout", self.timeout)?;
        settings.max_retries = self.max_retries;
        settings.retry_delay = seconds("retry-delay", self.retry_delay)?;
        Ok(Some(settings))
    }
}

/// Convert a seconds option, rejecting negative, non-finite and overflowing values.
fn seconds(option: &str, value: f64) -> DolceResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        DolceError::Config(format!(
            "{option} must be a non-negative number of seconds, got {value}: {e}"
        ))
    })
}

/// Nearest `pyproject.toml` at or above `start`.
pub fn find_pyproject(start: &Path) -> Option<PathBuf> {
    let dir = if start.is_file() { start.parent()? } else { start };
    let dir = dir.canonicalize().ok()?;
    dir.ancestors()
        .map(|d| d.join(PYPROJECT_FILE))
        .find(|candidate| candidate.is_file())
}
