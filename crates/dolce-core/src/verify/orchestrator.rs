//! Per-segment check protocol.
//!
//! 1. Static rules applicable to the segment kind: cached verdicts are
//!    adopted, misses run the validator and stage the result.
//! 2. LLM rules: cached ones are adopted; the rest are batched into a single
//!    oracle call when the segment has documentation.
//! 3. The oracle reply is mapped onto verdicts, persisted and synced.

use tracing::{debug, info, warn};

use super::mapper::map_oracle_reply;
use super::prompts;
use crate::errors::DolceResult;
use crate::models::{CodeSegment, Report, Verdict};
use crate::oracle::Oracle;
use crate::rules::{CheckContext, Rule, RuleSet, Validator};
use crate::store::cache::ResultCache;

/// Work counters for one verifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VerifyStats {
    pub validator_calls: usize,
    pub cache_hits: usize,
    pub oracle_calls: usize,
    pub oracle_failures: usize,
}

pub struct Verifier<'c, 'o> {
    ruleset: RuleSet<'c>,
    ctx: CheckContext,
    cache: ResultCache,
    oracle: Option<&'o dyn Oracle>,
    stats: VerifyStats,
}

impl<'c, 'o> Verifier<'c, 'o> {
    pub fn new(
        ruleset: RuleSet<'c>,
        ctx: CheckContext,
        cache: ResultCache,
        oracle: Option<&'o dyn Oracle>,
    ) -> Self {
        Self {
            ruleset,
            ctx,
            cache,
            oracle,
            stats: VerifyStats::default(),
        }
    }

    pub fn ruleset(&self) -> &RuleSet<'c> {
        &self.ruleset
    }

    pub fn stats(&self) -> VerifyStats {
        self.stats
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Evaluate every applicable rule on `segment`.
    pub fn check_segment(&mut self, segment: &CodeSegment) -> DolceResult<Report<'c>> {
        let mut report = Report::new();
        let kind = segment.kind;

        // -- Static rules ------------------------------------------------------
        let static_rules: Vec<&'c Rule> = self
            .ruleset
            .applicable_to(kind)
            .filter(|r| r.is_static())
            .collect();
        for rule in static_rules {
            let verdicts = match self.cached(segment, rule) {
                Some(verdicts) => verdicts,
                None => {
                    let Validator::Static(check) = rule.validator else {
                        continue;
                    };
                    self.stats.validator_calls += 1;
                    let verdicts = check(segment, &self.ctx);
                    self.cache
                        .set_check(segment, rule, verdicts.clone(), false, true)?;
                    verdicts
                }
            };
            if !verdicts.is_empty() {
                report.insert(rule, verdicts);
            }
        }

        // -- LLM rules ---------------------------------------------------------
        let Some(oracle) = self.oracle else {
            return Ok(report);
        };
        let llm_rules: Vec<&'c Rule> = self
            .ruleset
            .applicable_to(kind)
            .filter(|r| r.is_llm())
            .collect();
        let mut pending = Vec::new();
        for rule in llm_rules {
            match self.cached(segment, rule) {
                Some(verdicts) => {
                    if !verdicts.is_empty() {
                        report.insert(rule, verdicts);
                    }
                }
                None => pending.push(rule),
            }
        }
        if pending.is_empty() || !segment.has_doc() {
            return Ok(report);
        }

        let mut fragments: Vec<(&'c Rule, String)> = Vec::new();
        for rule in pending {
            let Validator::Llm(prompter) = rule.validator else {
                continue;
            };
            self.stats.validator_calls += 1;
            match prompter(segment, &self.ctx) {
                Some(fragment) => fragments.push((rule, fragment)),
                None => self.cache.set_check(segment, rule, Vec::new(), false, true)?,
            }
        }
        if fragments.is_empty() {
            return Ok(report);
        }

        let system = prompts::system_prompt(&fragments);
        let user = prompts::user_prompt(segment);
        let asked: Vec<&'c Rule> = fragments.iter().map(|(rule, _)| *rule).collect();
        info!(
            "Asking oracle about {} rule(s) for {}",
            asked.len(),
            segment.location
        );
        self.stats.oracle_calls += 1;

        match oracle.generate(&user, &system) {
            Ok(reply) => {
                for (rule, verdicts) in map_oracle_reply(&reply, &asked) {
                    self.cache
                        .set_check(segment, rule, verdicts.clone(), false, true)?;
                    report.insert(rule, verdicts);
                }
                self.cache.flush();
            }
            Err(e) => {
                warn!("Oracle call failed for {}: {e}", segment.location);
                self.stats.oracle_failures += 1;
                let unknown = Verdict::unknown(format!("Oracle unavailable: {e}"));
                for rule in asked {
                    report.insert(rule, vec![unknown.clone()]);
                }
            }
        }

        Ok(report)
    }

    /// Persist staged verdicts.
    pub fn flush(&mut self) {
        self.cache.flush();
    }

    /// Flush and hand back the cache.
    pub fn finish(mut self) -> ResultCache {
        self.cache.flush();
        self.cache
    }

    fn cached(&mut self, segment: &CodeSegment, rule: &Rule) -> Option<Vec<Verdict>> {
        let hit = self.cache.get_check(segment, rule);
        if hit.is_some() {
            debug!("cache hit {} on {}", rule.reference, segment.location);
            self.stats.cache_hits += 1;
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::docstring;
    use crate::errors::DolceError;
    use crate::models::{is_clean, CheckStatus, SegmentKind};
    use crate::rules::Catalogue;

    /// Oracle replaying canned replies and counting calls.
    struct ScriptedOracle {
        reply: RefCell<DolceResult<String>>,
        calls: Cell<usize>,
        last_system: RefCell<String>,
    }

    impl ScriptedOracle {
        fn replying(reply: &str) -> Self {
            Self {
                reply: RefCell::new(Ok(reply.to_string())),
                calls: Cell::new(0),
                last_system: RefCell::new(String::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: RefCell::new(Err(DolceError::Connection("down".into()))),
                calls: Cell::new(0),
                last_system: RefCell::new(String::new()),
            }
        }
    }

    impl Oracle for ScriptedOracle {
        fn test_connection(&self) -> bool {
            true
        }

        fn generate(&self, _prompt: &str, system: &str) -> DolceResult<String> {
            self.calls.set(self.calls.get() + 1);
            *self.last_system.borrow_mut() = system.to_string();
            match &*self.reply.borrow() {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(DolceError::Connection(e.to_string())),
            }
        }
    }

    fn function(code: &str, doc: &str, params: &[(&str, &str)], returns: &str) -> CodeSegment {
        CodeSegment {
            file_path: "pkg/mod.py".into(),
            location: "pkg/mod.py:1 f".into(),
            name: "f".into(),
            line: 1,
            code: code.into(),
            doc: doc.into(),
            parsed_doc: docstring::parse(doc).ok(),
            kind: SegmentKind::Function,
            params: params
                .iter()
                .map(|(n, t)| (n.to_string(), Some(t.to_string())))
                .collect(),
            returns: Some(returns.to_string()),
            ..CodeSegment::default()
        }
    }

    fn documented() -> CodeSegment {
        function(
            "def add(a: int, b: int) -> int:\n    \"\"\"...\"\"\"\n    return a + b",
            "Add two integers.\n\nArgs:\n    a (int): First operand.\n    b (int): Second operand.\n\nReturns:\n    int: The sum.\n",
            &[("a", "int"), ("b", "int")],
            "int",
        )
    }

    fn bad_count(report: &Report<'_>) -> usize {
        report.values().flatten().filter(|v| v.is_bad()).count()
    }

    #[test]
    fn test_undocumented_segment_is_single_bad_without_oracle() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset().only_static();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let seg = function("def f(x: int) -> int:\n    return x", "", &[("x", "int")], "int");
        let report = verifier.check_segment(&seg).unwrap();
        assert_eq!(bad_count(&report), 1);
        let bad_rule = report
            .iter()
            .find(|(_, v)| v.iter().any(Verdict::is_bad))
            .map(|(r, _)| r.reference.as_str());
        assert_eq!(bad_rule, Some("DCE105"));
        assert_eq!(oracle.calls.get(), 0);
    }

    #[test]
    fn test_documented_segment_makes_one_oracle_call_and_one_sync() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::open(dir.path(), &rs),
            Some(&oracle),
        );
        let report = verifier.check_segment(&documented()).unwrap();
        assert!(is_clean(&report));
        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(verifier.cache().stats().syncs, 1);
        for reference in ["DCE401", "DCE402", "DCE403", "DCE501", "DCE502"] {
            let rule = catalogue.get(reference).unwrap();
            assert_eq!(report[rule], vec![Verdict::good()], "{reference}");
        }
        let system = oracle.last_system.borrow();
        assert!(system.contains("- DCE401:"));
        assert!(system.contains("- DCE502:"));
    }

    #[test]
    fn test_misnamed_param_is_both_missing_and_phantom() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset().only_static();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let seg = function(
            "def f(q: int) -> None:\n    pass",
            "Do a thing.\n\nArgs:\n    p (int): Not a parameter.\n",
            &[("q", "int")],
            "None",
        );
        let report = verifier.check_segment(&seg).unwrap();
        assert_eq!(bad_count(&report), 2);
        let missing = catalogue.get("DCE301").unwrap();
        let phantom = catalogue.get("DCE305").unwrap();
        assert!(report[missing][0].issue.contains("'q'"));
        assert!(report[phantom][0].issue.contains("'p'"));
        assert_eq!(oracle.calls.get(), 0);
    }

    #[test]
    fn test_second_run_is_served_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset();
        let oracle = ScriptedOracle::replying(
            r#"{"status": "INCORRECT", "issues": ["DCE401"], "descr": ["Typo 'integrs'."]}"#,
        );
        let seg = documented();

        let mut first = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::open(dir.path(), &rs),
            Some(&oracle),
        );
        let first_report = first.check_segment(&seg).unwrap();
        first.finish();

        let mut second = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::open(dir.path(), &rs),
            Some(&oracle),
        );
        let second_report = second.check_segment(&seg).unwrap();
        assert_eq!(first_report, second_report);
        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(second.stats().validator_calls, 0);
        assert_eq!(second.stats().oracle_calls, 0);
        assert!(second.stats().cache_hits > 0);
    }

    #[test]
    fn test_edit_invalidates_cache() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let seg = documented();
        verifier.check_segment(&seg).unwrap();
        let mut edited = seg.clone();
        edited.code.push_str("\n    # changed");
        let before = verifier.stats().validator_calls;
        verifier.check_segment(&edited).unwrap();
        assert!(verifier.stats().validator_calls > before);
        assert_eq!(oracle.calls.get(), 2);
    }

    #[test]
    fn test_no_oracle_call_without_doc_or_pending() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let undocumented = function("def f() -> int:\n    return 1", "", &[], "int");
        let report = verifier.check_segment(&undocumented).unwrap();
        assert_eq!(oracle.calls.get(), 0);
        assert!(report.keys().all(|r| r.is_static()));
    }

    #[test]
    fn test_oracle_failure_is_unknown_and_not_cached() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.default_ruleset().only_llm();
        let oracle = ScriptedOracle::failing();
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let seg = documented();
        let report = verifier.check_segment(&seg).unwrap();
        assert_eq!(report.len(), 5);
        assert!(report
            .values()
            .flatten()
            .all(|v| v.status == CheckStatus::Unknown));
        assert!(!is_clean(&report));

        verifier.check_segment(&seg).unwrap();
        assert_eq!(oracle.calls.get(), 2);
        assert_eq!(verifier.stats().oracle_failures, 2);
    }

    #[test]
    fn test_malformed_reply_degrades_to_unknown() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.all().only(&["DCE501", "DCE502"]);
        let oracle = ScriptedOracle::replying("The docstring looks fine to me.");
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let report = verifier.check_segment(&documented()).unwrap();
        assert_eq!(report.len(), 2);
        assert!(report
            .values()
            .flatten()
            .all(|v| v.status == CheckStatus::Unknown));
    }

    #[test]
    fn test_scope_gating() {
        let catalogue = Catalogue::builtin().unwrap();
        let rs = catalogue.all();
        let oracle = ScriptedOracle::replying(r#"{"status": "good"}"#);
        let mut verifier = Verifier::new(
            rs.clone(),
            CheckContext::default(),
            ResultCache::in_memory(&rs),
            Some(&oracle),
        );
        let class = CodeSegment {
            kind: SegmentKind::Class,
            name: "Thing".into(),
            ..documented()
        };
        let report = verifier.check_segment(&class).unwrap();
        assert!(report.keys().all(|r| r.applies_to(SegmentKind::Class)));
        let system = oracle.last_system.borrow();
        assert!(system.contains("- DCE401:"));
        assert!(!system.contains("- DCE501:"));
    }
}
