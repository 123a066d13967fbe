//! Agreement between docstrings and signatures (DCE3xx).

use std::collections::HashSet;

use super::{documented, is_blank};
use crate::models::{CodeSegment, Verdict};
use crate::rules::CheckContext;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

pub fn missing_param(segment: &CodeSegment, ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let documented_names: HashSet<&str> = doc
        .params
        .iter()
        .map(|p| p.name.trim_start_matches('*'))
        .collect();
    let issues = segment
        .documentable_params(ctx)
        .into_iter()
        .filter(|name| !documented_names.contains(name.as_str()))
        .map(|name| format!("Parameter '{name}' is not documented."))
        .collect();
    Verdict::from_issues(issues)
}

pub fn missing_param_type(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let issues = doc
        .params
        .iter()
        .filter(|p| p.type_name.is_none())
        .map(|p| format!("Parameter '{}' is missing a type in the docstring.", p.name))
        .collect();
    Verdict::from_issues(issues)
}

pub fn wrong_param_type(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let mut issues = Vec::new();
    for param in &doc.params {
        let (Some(doc_type), Some(sig_type)) =
            (param.type_name.as_deref(), segment.param_type(&param.name))
        else {
            continue;
        };
        if !doc_type.trim().eq_ignore_ascii_case(sig_type.trim()) {
            issues.push(format!(
                "Parameter '{}' has type '{sig_type}' in signature but '{doc_type}' in docstring.",
                param.name
            ));
        }
    }
    Verdict::from_issues(issues)
}

pub fn missing_param_description(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let issues = doc
        .params
        .iter()
        .filter(|p| is_blank(p.description.as_deref()))
        .map(|p| format!("Parameter '{}' is missing a description.", p.name))
        .collect();
    Verdict::from_issues(issues)
}

pub fn params_does_not_exist(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let issues = doc
        .params
        .iter()
        .filter(|p| !segment.has_param(&p.name))
        .map(|p| format!("Parameter '{}' documented but not in signature.", p.name))
        .collect();
    Verdict::from_issues(issues)
}

pub fn duplicate_params(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(doc) = documented(segment) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    let issues = doc
        .params
        .iter()
        .filter(|p| !seen.insert(p.name.as_str()))
        .map(|p| format!("Parameter '{}' is documented multiple times.", p.name))
        .collect();
    Verdict::from_issues(issues)
}

// ---------------------------------------------------------------------------
// Returns
// ---------------------------------------------------------------------------

pub fn missing_return(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    if documented(segment).is_none()
        || segment.is_generator()
        || segment.returns_none()
        || segment.is_property()
    {
        return Vec::new();
    }
    vec![Verdict::check(
        segment.has_return_doc(),
        "Return value is not documented.",
    )]
}

pub fn missing_return_description(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(ret) = documented_return(segment) else {
        return Vec::new();
    };
    if segment.returns_none() {
        return Vec::new();
    }
    vec![Verdict::check(
        !is_blank(ret.description.as_deref()),
        "Return section has no description.",
    )]
}

pub fn wrong_return_type(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(ret) = documented_return(segment) else {
        return Vec::new();
    };
    let (Some(declared), Some(doc_type)) = (segment.returns.as_deref(), ret.type_name.as_deref())
    else {
        return Vec::new();
    };
    vec![Verdict::check(
        declared.trim() == doc_type.trim(),
        format!("Return type is '{declared}' but declared '{doc_type}' in docstring."),
    )]
}

pub fn unnecessary_return(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    match documented_return(segment) {
        Some(ret) if ret.type_name.is_some() => vec![Verdict::check(
            !segment.returns_none(),
            "Return section documented but the signature returns None.",
        )],
        _ => Vec::new(),
    }
}

pub fn return_on_property(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    if documented_return(segment).is_none() {
        return Vec::new();
    }
    vec![Verdict::check(
        !segment.is_property(),
        "Properties should not have return sections.",
    )]
}

/// Documented non-generator return section of a non-generator callable.
fn documented_return(segment: &CodeSegment) -> Option<&crate::docstring::DocReturns> {
    if segment.is_generator() {
        return None;
    }
    documented(segment)?
        .returns
        .as_ref()
        .filter(|ret| !ret.is_generator)
}

// ---------------------------------------------------------------------------
// Yields
// ---------------------------------------------------------------------------

pub fn missing_yield(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    if documented(segment).is_none() || !segment.is_generator() {
        return Vec::new();
    }
    vec![Verdict::check(
        segment.has_yield_doc(),
        "Yielded values are not documented.",
    )]
}

pub fn missing_yield_description(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let Some(ret) = documented_yield(segment) else {
        return Vec::new();
    };
    vec![Verdict::check(
        !is_blank(ret.description.as_deref()),
        "Yield section has no description.",
    )]
}

pub fn wrong_yield_type(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    let (Some(ret), Some(yielded)) = (documented_yield(segment), segment.generator_type()) else {
        return Vec::new();
    };
    let doc_type = ret.type_name.as_deref().unwrap_or("");
    vec![Verdict::check(
        doc_type.trim() == yielded,
        format!("Yield type is '{yielded}' but declared '{doc_type}' in docstring."),
    )]
}

pub fn unnecessary_yield(segment: &CodeSegment, _ctx: &CheckContext) -> Vec<Verdict> {
    vec![Verdict::check(
        !segment.has_yield_doc() || segment.is_generator(),
        "Yield section documented but the callable is not a generator.",
    )]
}

fn documented_yield(segment: &CodeSegment) -> Option<&crate::docstring::DocReturns> {
    if !segment.is_generator() {
        return None;
    }
    documented(segment)?
        .returns
        .as_ref()
        .filter(|ret| ret.is_generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docstring;
    use crate::models::SegmentKind;

    fn func(params: &[(&str, Option<&str>)], returns: Option<&str>, doc: &str) -> CodeSegment {
        CodeSegment {
            name: "f".into(),
            doc: doc.into(),
            parsed_doc: docstring::parse(doc).ok(),
            kind: SegmentKind::Function,
            params: params
                .iter()
                .map(|(n, t)| (n.to_string(), t.map(String::from)))
                .collect(),
            returns: returns.map(String::from),
            ..CodeSegment::default()
        }
    }

    fn bad_count(verdicts: &[Verdict]) -> usize {
        verdicts.iter().filter(|v| v.is_bad()).count()
    }

    #[test]
    fn test_missing_param_skips_self() {
        let ctx = CheckContext::default();
        let seg = func(
            &[("self", None), ("a", None), ("b", None)],
            None,
            "Do.\n\nArgs:\n    a: The a.\n",
        );
        let verdicts = missing_param(&seg, &ctx);
        assert_eq!(bad_count(&verdicts), 1);
        assert!(verdicts[0].issue.contains("'b'"));
    }

    #[test]
    fn test_missing_param_variadics_unless_ignored() {
        let mut seg = func(&[], None, "Do.\n\nArgs:\n    *args: Extra.\n");
        seg.args_name = Some("args".into());
        seg.kwargs_name = Some("kwargs".into());
        let strict = CheckContext {
            ignore_variadic_positional: false,
            ignore_variadic_keyword: false,
            ..CheckContext::default()
        };
        let verdicts = missing_param(&seg, &strict);
        assert_eq!(bad_count(&verdicts), 1);
        assert!(verdicts[0].issue.contains("'kwargs'"));
        assert!(missing_param(&seg, &CheckContext::default())[0].is_good());
    }

    #[test]
    fn test_missing_param_not_applicable_without_doc() {
        let seg = func(&[("a", None)], None, "");
        assert!(missing_param(&seg, &CheckContext::default()).is_empty());
    }

    #[test]
    fn test_param_type_checks() {
        let ctx = CheckContext::default();
        let seg = func(
            &[("a", Some("int")), ("b", Some("str")), ("c", None)],
            Some("None"),
            "Do.\n\nArgs:\n    a (INT): A.\n    b (bytes): B.\n    c: C.\n",
        );
        assert_eq!(bad_count(&missing_param_type(&seg, &ctx)), 1);
        let wrong = wrong_param_type(&seg, &ctx);
        assert_eq!(bad_count(&wrong), 1);
        assert!(wrong[0].issue.contains("'b'"));
    }

    #[test]
    fn test_param_existence_and_duplicates() {
        let ctx = CheckContext::default();
        let seg = func(
            &[("a", None)],
            Some("None"),
            "Do.\n\nArgs:\n    a: A.\n    a: Again.\n    ghost: Boo.\n    extra:\n",
        );
        assert_eq!(bad_count(&params_does_not_exist(&seg, &ctx)), 2);
        assert_eq!(bad_count(&duplicate_params(&seg, &ctx)), 1);
        assert_eq!(bad_count(&missing_param_description(&seg, &ctx)), 1);
    }

    #[test]
    fn test_starred_doc_names_match_variadics() {
        let mut seg = func(&[], Some("None"), "Do.\n\nArgs:\n    **opts: Options.\n");
        seg.kwargs_name = Some("opts".into());
        assert!(params_does_not_exist(&seg, &CheckContext::default())[0].is_good());
    }

    #[test]
    fn test_return_rules() {
        let ctx = CheckContext::default();
        let undocumented = func(&[], Some("int"), "Count.");
        assert!(missing_return(&undocumented, &ctx)[0].is_bad());

        let none_ret = func(&[], Some("None"), "Reset.");
        assert!(missing_return(&none_ret, &ctx).is_empty());

        let documented = func(&[], Some("int"), "Count.\n\nReturns:\n    str: The count.\n");
        assert!(missing_return(&documented, &ctx)[0].is_good());
        assert!(missing_return_description(&documented, &ctx)[0].is_good());
        assert!(wrong_return_type(&documented, &ctx)[0].is_bad());
        assert!(unnecessary_return(&documented, &ctx)[0].is_good());
        assert!(return_on_property(&documented, &ctx)[0].is_good());

        let pointless = func(&[], Some("None"), "Reset.\n\nReturns:\n    int: Nothing.\n");
        assert!(unnecessary_return(&pointless, &ctx)[0].is_bad());
    }

    #[test]
    fn test_return_on_property() {
        let mut seg = func(&[], Some("int"), "Size.\n\nReturns:\n    int: Size.\n");
        seg.decorators = vec!["property".into()];
        let ctx = CheckContext::default();
        assert!(return_on_property(&seg, &ctx)[0].is_bad());
        assert!(missing_return(&seg, &ctx).is_empty());
    }

    #[test]
    fn test_yield_rules() {
        let ctx = CheckContext::default();
        let gen = func(&[], Some("Iterator[int]"), "Count up.");
        assert!(missing_yield(&gen, &ctx)[0].is_bad());
        assert!(missing_return(&gen, &ctx).is_empty());

        let documented = func(
            &[],
            Some("Iterator[int]"),
            "Count up.\n\nYields:\n    str: Next.\n",
        );
        assert!(missing_yield(&documented, &ctx)[0].is_good());
        assert!(missing_yield_description(&documented, &ctx)[0].is_good());
        assert!(wrong_yield_type(&documented, &ctx)[0].is_bad());
        assert!(unnecessary_yield(&documented, &ctx)[0].is_good());

        let not_gen = func(&[], Some("int"), "Count.\n\nYields:\n    int: Next.\n");
        assert!(unnecessary_yield(&not_gen, &ctx)[0].is_bad());
    }
}
