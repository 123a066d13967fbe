//! Content-addressed verdict cache, one JSON partition per ruleset.
//!
//! A partition maps segment identity hash -> rule reference -> verdicts.  It is
//! loaded once when the cache is opened and written back as a whole snapshot
//! on [`ResultCache::flush`].

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{DolceError, DolceResult};
use crate::models::{CodeSegment, Verdict};
use crate::rules::{Rule, RuleSet};

/// Cache directory relative to the project root.
pub const CACHE_DIR: &str = ".dolce/cache";

/// Files or directories that mark a project root.
pub const PROJECT_ROOT_INDICATORS: &[&str] = &[
    "pyproject.toml",
    "setup.cfg",
    "requirements.txt",
    "poetry.lock",
    ".git",
];

type Partition = BTreeMap<String, BTreeMap<String, Vec<Verdict>>>;

/// Counters kept for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub syncs: usize,
}

// ---------------------------------------------------------------------------
// Project root discovery
// ---------------------------------------------------------------------------

/// Nearest ancestor of `start` (inclusive) holding a project root indicator.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let start = if start.is_file() {
        start.parent()?
    } else {
        start
    };
    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .find(|dir| {
            PROJECT_ROOT_INDICATORS
                .iter()
                .any(|indicator| dir.join(indicator).exists())
        })
        .map(Path::to_path_buf)
}

/// Partition file name for a ruleset identity hash.
pub fn partition_file_name(ruleset_identity: &str) -> String {
    let short = ruleset_identity.get(..16).unwrap_or(ruleset_identity);
    format!("check_cache_{short}.json")
}

// ---------------------------------------------------------------------------
// ResultCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ResultCache {
    path: Option<PathBuf>,
    ruleset_identity: String,
    data: Partition,
    dirty: bool,
    stats: CacheStats,
}

impl ResultCache {
    /// Open the partition of `ruleset` stored under `cache_dir`.
    ///
    /// A missing file starts an empty partition; an unreadable or corrupt one
    /// is logged and replaced by an empty partition.
    pub fn open(cache_dir: &Path, ruleset: &RuleSet<'_>) -> Self {
        let ruleset_identity = ruleset.identity();
        let path = cache_dir.join(partition_file_name(&ruleset_identity));
        let data = load_partition(&path);
        debug!(
            "Opened cache partition {} ({} segments)",
            path.display(),
            data.len()
        );
        Self {
            path: Some(path),
            ruleset_identity,
            data,
            dirty: false,
            stats: CacheStats::default(),
        }
    }

    /// Cache that lives only for this run.
    pub fn in_memory(ruleset: &RuleSet<'_>) -> Self {
        Self {
            path: None,
            ruleset_identity: ruleset.identity(),
            data: Partition::new(),
            dirty: false,
            stats: CacheStats::default(),
        }
    }

    /// Open the partition under the project root containing `start`, or fall
    /// back to an in-memory cache when there is none.
    pub fn for_project(start: &Path, ruleset: &RuleSet<'_>) -> Self {
        match find_project_root(start) {
            Some(root) => Self::open(&root.join(CACHE_DIR), ruleset),
            None => {
                info!(
                    "No project root found above {}; results will not be cached",
                    start.display()
                );
                Self::in_memory(ruleset)
            }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn ruleset_identity(&self) -> &str {
        &self.ruleset_identity
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of cached segments.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Cached verdicts of `rule` on `segment`; `None` if never evaluated.
    pub fn get_check(&mut self, segment: &CodeSegment, rule: &Rule) -> Option<Vec<Verdict>> {
        let found = self
            .data
            .get(&segment.identity_hash())
            .and_then(|rules| rules.get(&rule.reference))
            .cloned();
        match &found {
            Some(_) => self.stats.hits += 1,
            None => self.stats.misses += 1,
        }
        found
    }

    /// Store verdicts of `rule` on `segment`.
    ///
    /// With `override_existing == false` an existing entry is an error.  With
    /// `sync` the whole partition is flushed right away.
    pub fn set_check(
        &mut self,
        segment: &CodeSegment,
        rule: &Rule,
        verdicts: Vec<Verdict>,
        sync: bool,
        override_existing: bool,
    ) -> DolceResult<()> {
        let entry = self.data.entry(segment.identity_hash()).or_default();
        if !override_existing && entry.contains_key(&rule.reference) {
            return Err(DolceError::Cache(format!(
                "Entry for {} on {} already exists",
                rule.reference, segment.location
            )));
        }
        entry.insert(rule.reference.clone(), verdicts);
        self.dirty = true;
        if sync {
            self.flush();
        }
        Ok(())
    }

    /// Write the partition snapshot if anything changed since the last flush.
    ///
    /// Write failures are logged and leave the partition dirty so a later
    /// flush retries.
    pub fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        if let Some(path) = &self.path {
            if let Err(e) = write_partition(path, &self.data) {
                warn!("Failed to write cache file {}: {e}", path.display());
                return;
            }
            debug!("Cache partition synced to {}", path.display());
        }
        self.dirty = false;
        self.stats.syncs += 1;
    }
}

fn load_partition(path: &Path) -> Partition {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::NotFound => return Partition::new(),
        Err(e) => {
            warn!("Failed to read cache file {}: {e}", path.display());
            return Partition::new();
        }
    };
    match serde_json::from_str(&text) {
        Ok(data) => data,
        Err(e) => {
            warn!("Ignoring corrupt cache file {}: {e}", path.display());
            Partition::new()
        }
    }
}

fn write_partition(path: &Path, data: &Partition) -> DolceResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
