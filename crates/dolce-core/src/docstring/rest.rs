//! reST / Sphinx field-list docstrings (`:param x:`, `:rtype:` ...).

use std::collections::HashMap;

use super::{
    non_empty, parse_error, push_description, summary_of, DocParam, DocReturns, DocStyle,
    StructuredDoc,
};
use crate::errors::DolceResult;

enum Target {
    Param(usize),
    ParamType(String),
    Returns,
    ReturnType,
    Yields,
    YieldType,
    Ignored,
}

#[derive(Default)]
struct Section {
    type_name: Option<String>,
    description: Option<String>,
    seen: bool,
}

pub fn parse(text: &str) -> DolceResult<StructuredDoc> {
    let mut leading: Vec<&str> = Vec::new();
    let mut params: Vec<DocParam> = Vec::new();
    let mut types: HashMap<String, String> = HashMap::new();
    let mut returns = Section::default();
    let mut yields = Section::default();
    let mut yield_first = false;
    let mut current: Option<Target> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with(':') {
            match current.as_ref() {
                None => leading.push(line),
                Some(target) if !trimmed.is_empty() => match target {
                    Target::Param(idx) => push_description(&mut params[*idx].description, trimmed),
                    Target::ParamType(name) => {
                        if let Some(ty) = types.get_mut(name) {
                            ty.push(' ');
                            ty.push_str(trimmed);
                        }
                    }
                    Target::Returns => push_description(&mut returns.description, trimmed),
                    Target::ReturnType => push_description(&mut returns.type_name, trimmed),
                    Target::Yields => push_description(&mut yields.description, trimmed),
                    Target::YieldType => push_description(&mut yields.type_name, trimmed),
                    Target::Ignored => {}
                },
                Some(_) => {}
            }
            continue;
        }

        let Some((head, body)) = trimmed[1..].split_once(':') else {
            return Err(parse_error(format!("Unterminated field \"{trimmed}\"")));
        };
        let tokens: Vec<&str> = head.split_whitespace().collect();
        let Some(kind) = tokens.first() else {
            return Err(parse_error(format!("Empty field \"{trimmed}\"")));
        };
        let body = body.trim();

        current = Some(match *kind {
            "param" | "parameter" | "arg" | "argument" | "key" | "keyword" => {
                let (type_name, name) = match tokens.len() {
                    1 => {
                        return Err(parse_error(format!(
                            "Parameter field without a name \"{trimmed}\""
                        )))
                    }
                    2 => (None, tokens[1]),
                    n => (Some(tokens[1..n - 1].join(" ")), tokens[n - 1]),
                };
                params.push(DocParam {
                    name: name.to_string(),
                    type_name,
                    description: non_empty(body),
                });
                Target::Param(params.len() - 1)
            }
            "type" => match tokens.get(1) {
                Some(name) => {
                    types.insert(name.to_string(), body.to_string());
                    Target::ParamType(name.to_string())
                }
                None => Target::Ignored,
            },
            "returns" | "return" => {
                returns.seen = true;
                returns.description = non_empty(body);
                Target::Returns
            }
            "rtype" => {
                returns.seen = true;
                returns.type_name = non_empty(body);
                Target::ReturnType
            }
            "yields" | "yield" => {
                yield_first |= !returns.seen && !yields.seen;
                yields.seen = true;
                yields.description = non_empty(body);
                Target::Yields
            }
            "ytype" => {
                yield_first |= !returns.seen && !yields.seen;
                yields.seen = true;
                yields.type_name = non_empty(body);
                Target::YieldType
            }
            _ => Target::Ignored,
        });
    }

    for param in params.iter_mut() {
        if param.type_name.is_none() {
            param.type_name = types.get(&param.name).and_then(|ty| non_empty(ty));
        }
    }

    let leading = leading.join("\n");
    let mut doc = StructuredDoc {
        summary: summary_of(&leading),
        description: non_empty(&leading),
        params,
        returns: None,
        style: Some(DocStyle::Rest),
    };

    let mut sections = [(returns, false), (yields, true)];
    if yield_first {
        sections.reverse();
    }
    for (section, is_generator) in sections {
        if section.seen {
            doc.set_returns(DocReturns {
                type_name: section.type_name,
                description: section.description,
                is_generator,
            });
        }
    }

    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_types_and_returns() {
        let doc = "\
Open a connection.

:param host: Host name
    to connect to.
:param int port: Port number.
:type host: str
:returns: The connection.
:rtype: Connection
";
        let parsed = parse(doc).unwrap();
        assert_eq!(parsed.style, Some(DocStyle::Rest));
        assert_eq!(parsed.summary.as_deref(), Some("Open a connection."));
        assert_eq!(parsed.params.len(), 2);
        assert_eq!(parsed.params[0].type_name.as_deref(), Some("str"));
        assert_eq!(
            parsed.params[0].description.as_deref(),
            Some("Host name to connect to.")
        );
        assert_eq!(parsed.params[1].name, "port");
        assert_eq!(parsed.params[1].type_name.as_deref(), Some("int"));
        let returns = parsed.returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("Connection"));
        assert_eq!(returns.description.as_deref(), Some("The connection."));
        assert!(!returns.is_generator);
    }

    #[test]
    fn test_yields_field() {
        let doc = "Stream.\n\n:yields: Next chunk.\n:ytype: bytes\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert!(returns.is_generator);
        assert_eq!(returns.type_name.as_deref(), Some("bytes"));
    }

    #[test]
    fn test_rtype_only() {
        let doc = "Count.\n\n:rtype: int\n";
        let returns = parse(doc).unwrap().returns.unwrap();
        assert_eq!(returns.type_name.as_deref(), Some("int"));
        assert_eq!(returns.description, None);
    }

    #[test]
    fn test_param_without_name_is_error() {
        assert!(parse("Summary.\n\n:param: orphan\n").is_err());
    }

    #[test]
    fn test_unterminated_field_is_error() {
        assert!(parse("Summary.\n\n:param x no colon\n").is_err());
    }

    #[test]
    fn test_raises_ignored() {
        let parsed = parse("Summary.\n\n:raises ValueError: Bad input.\n").unwrap();
        assert!(parsed.params.is_empty());
        assert!(parsed.returns.is_none());
    }
}
