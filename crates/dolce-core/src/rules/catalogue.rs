//! The built-in rule catalogue.

use std::collections::HashSet;

use super::checkers::{content, semantic, signature, structural, style};
use super::{reference_for, Rule, RuleGroup, RuleSet, Validator};
use crate::errors::{DolceError, DolceResult};
use crate::models::SegmentKind;

/// Codes left out of the default ruleset.
pub const DEFAULT_DISABLED: &[u16] = &[102];

const MODULE: &[SegmentKind] = &[SegmentKind::Module];
const CLASS: &[SegmentKind] = &[SegmentKind::Class];
const METHOD: &[SegmentKind] = &[SegmentKind::Method, SegmentKind::Property];
const FUNCTION: &[SegmentKind] = &[SegmentKind::Function];
const CALLABLES: &[SegmentKind] = &[
    SegmentKind::Function,
    SegmentKind::Method,
    SegmentKind::Property,
];

type Entry = (
    u16,
    &'static str,
    &'static str,
    Option<&'static [SegmentKind]>,
    Validator,
);

#[rustfmt::skip]
fn builtin_entries() -> Vec<Entry> {
    use Validator::{Llm, Static};

    vec![
        // Structural
        (101, "invalid-docstring-syntax", "Docstring has invalid syntax.", None, Static(structural::invalid_docstring_syntax)),
        (102, "missing-module-docstring", "Module is missing a docstring.", Some(MODULE), Static(structural::missing_module_docstring)),
        (103, "missing-class-docstring", "Class is missing a docstring.", Some(CLASS), Static(structural::missing_class_docstring)),
        (104, "missing-method-docstring", "Method is missing a docstring.", Some(METHOD), Static(structural::missing_method_docstring)),
        (105, "missing-func-docstring", "Function is missing a docstring.", Some(FUNCTION), Static(structural::missing_func_docstring)),
        // Style
        (201, "invalid-docstring-style", "Docstring has invalid style.", None, Static(style::invalid_docstring_style)),
        // Signature
        (301, "missing-param", "Parameter in signature is not documented.", Some(CALLABLES), Static(signature::missing_param)),
        (302, "missing-param-type", "Missing parameter type in docstring.", Some(CALLABLES), Static(signature::missing_param_type)),
        (303, "wrong-param-type", "Parameter documented type does not match signature.", Some(CALLABLES), Static(signature::wrong_param_type)),
        (304, "missing-param-description", "Missing parameter description.", Some(CALLABLES), Static(signature::missing_param_description)),
        (305, "params-does-not-exist", "Parameter doesn't exist in signature.", Some(CALLABLES), Static(signature::params_does_not_exist)),
        (306, "duplicate-params", "Parameter is documented multiple times.", Some(CALLABLES), Static(signature::duplicate_params)),
        (321, "missing-return", "Missing return section in docstring.", Some(CALLABLES), Static(signature::missing_return)),
        (322, "missing-return-description", "Missing return description.", Some(CALLABLES), Static(signature::missing_return_description)),
        (323, "wrong-return-type", "Return type does not match signature.", Some(CALLABLES), Static(signature::wrong_return_type)),
        (324, "unnecessary-return", "Unnecessary return section in docstring.", Some(CALLABLES), Static(signature::unnecessary_return)),
        (325, "return-on-property", "Return documented on property.", Some(CALLABLES), Static(signature::return_on_property)),
        (341, "missing-yield", "Missing yield section in docstring.", Some(CALLABLES), Static(signature::missing_yield)),
        (342, "missing-yield-description", "Missing yield description.", Some(CALLABLES), Static(signature::missing_yield_description)),
        (343, "wrong-yield-type", "Yield type does not match signature.", Some(CALLABLES), Static(signature::wrong_yield_type)),
        (344, "unnecessary-yield", "Invalid yield section in docstring.", Some(CALLABLES), Static(signature::unnecessary_yield)),
        // Content
        (401, "description-spelling", "Docstring description contains spelling errors.", None, Llm(content::description_spelling)),
        (402, "param-desc-spelling", "Parameter description contains spelling errors.", Some(CALLABLES), Llm(content::param_desc_spelling)),
        (403, "return-desc-spelling", "Return description contains spelling errors.", Some(CALLABLES), Llm(content::return_desc_spelling)),
        // Semantic
        (501, "func-behavior-mismatch", "Description is not consistent with the implementation.", Some(CALLABLES), Llm(semantic::func_behavior_mismatch)),
        (502, "func-critical-behavior-omitted", "Critical behavior not documented.", Some(CALLABLES), Llm(semantic::func_critical_behavior_omitted)),
    ]
}

/// Registry of every known rule, ordered by code.
#[derive(Debug)]
pub struct Catalogue {
    rules: Vec<Rule>,
}

impl Catalogue {
    pub fn builtin() -> DolceResult<Self> {
        let rules = builtin_entries()
            .into_iter()
            .map(|(code, name, description, scopes, validator)| {
                Rule::new(code, name, description, scopes, validator)
            })
            .collect::<DolceResult<Vec<_>>>()?;
        Self::from_rules(rules)
    }

    /// Build a catalogue from arbitrary rules; references must be unique.
    pub fn from_rules(mut rules: Vec<Rule>) -> DolceResult<Self> {
        rules.sort_by_key(|rule| rule.code);
        let mut seen = HashSet::new();
        for rule in &rules {
            if !seen.insert(rule.reference.as_str()) {
                return Err(DolceError::Config(format!(
                    "Rule {} registered twice",
                    rule.reference
                )));
            }
        }
        Ok(Self { rules })
    }

    pub fn get(&self, reference: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.reference == reference)
    }

    pub fn contains(&self, reference: &str) -> bool {
        self.get(reference).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn all(&self) -> RuleSet<'_> {
        RuleSet::from_rules(self.rules.iter())
    }

    /// Every rule except the opt-out list.
    pub fn default_ruleset(&self) -> RuleSet<'_> {
        let disabled: Vec<String> = DEFAULT_DISABLED.iter().map(|&c| reference_for(c)).collect();
        self.all().exclude(&disabled)
    }

    /// `target` narrows the catalogue when given, otherwise the default set is
    /// used; `disable` then removes further rules.
    pub fn effective<S: AsRef<str>>(&self, target: Option<&[S]>, disable: &[S]) -> RuleSet<'_> {
        let base = match target {
            Some(target) => self.all().only(target),
            None => self.default_ruleset(),
        };
        base.exclude(disable)
    }

    /// Reject references that name no catalogued rule.
    pub fn validate_references<S: AsRef<str>>(&self, references: &[S]) -> DolceResult<()> {
        let unknown: Vec<&str> = references
            .iter()
            .map(AsRef::as_ref)
            .filter(|r| !self.contains(r))
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(DolceError::Config(format!(
                "Unknown rule reference(s): {}",
                unknown.join(", ")
            )))
        }
    }

    /// Rules grouped by [`RuleGroup`], groups and rules in code order.
    pub fn by_group(&self) -> Vec<(RuleGroup, Vec<&Rule>)> {
        RuleGroup::ALL
            .iter()
            .map(|&group| {
                (
                    group,
                    self.rules.iter().filter(|r| r.group == group).collect::<Vec<_>>(),
                )
            })
            .filter(|(_, rules)| !rules.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue() {
        let catalogue = Catalogue::builtin().unwrap();
        assert_eq!(catalogue.len(), 26);
        let syntax = catalogue.get("DCE101").unwrap();
        assert_eq!(syntax.name, "invalid-docstring-syntax");
        assert!(syntax.is_static());
        assert!(catalogue.get("DCE501").unwrap().is_llm());
        assert!(!catalogue.contains("DCE999"));
    }

    #[test]
    fn test_default_ruleset_skips_module_docstring() {
        let catalogue = Catalogue::builtin().unwrap();
        let defaults = catalogue.default_ruleset();
        assert_eq!(defaults.len(), catalogue.len() - 1);
        assert!(!defaults.contains("DCE102"));
    }

    #[test]
    fn test_effective_rules() {
        let catalogue = Catalogue::builtin().unwrap();
        let target = vec!["DCE102".to_string(), "DCE301".to_string(), "DCE999".to_string()];
        let disable = vec!["DCE301".to_string()];
        let rs = catalogue.effective(Some(target.as_slice()), &disable);
        assert_eq!(rs.references(), vec!["DCE102"]);

        let none: Vec<String> = Vec::new();
        let rs = catalogue.effective(None, &disable);
        assert!(!rs.contains("DCE301"));
        assert!(!rs.contains("DCE102"));
        assert_eq!(catalogue.effective(None, &none).len(), catalogue.len() - 1);
    }

    #[test]
    fn test_validate_references() {
        let catalogue = Catalogue::builtin().unwrap();
        assert!(catalogue.validate_references(&["DCE101", "DCE502"]).is_ok());
        let err = catalogue
            .validate_references(&["DCE101", "DCE777"])
            .unwrap_err();
        assert!(err.to_string().contains("DCE777"));
    }

    #[test]
    fn test_groups_in_code_order() {
        let catalogue = Catalogue::builtin().unwrap();
        let groups = catalogue.by_group();
        let order: Vec<RuleGroup> = groups.iter().map(|(g, _)| *g).collect();
        assert_eq!(order, RuleGroup::ALL.to_vec());
        let signature = &groups[2].1;
        assert_eq!(signature.first().unwrap().code, 301);
        assert_eq!(signature.last().unwrap().code, 344);
    }

    #[test]
    fn test_duplicate_reference_rejected() {
        let catalogue = Catalogue::builtin().unwrap();
        let rule = catalogue.get("DCE101").unwrap().clone();
        assert!(Catalogue::from_rules(vec![rule.clone(), rule]).is_err());
    }
}
