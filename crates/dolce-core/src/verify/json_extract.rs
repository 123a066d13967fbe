//! Locate a JSON object embedded in free-form model output.

use std::sync::LazyLock;

use regex::Regex;

static THINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?(</think>|$)").unwrap());

/// First balanced `{...}` span in `text` that parses as a JSON object.
///
/// Reasoning blocks (`<think>...</think>`) are skipped.  Braces inside JSON
/// strings do not count towards the balance.
pub fn extract_embedded_object(text: &str) -> Option<String> {
    let cleaned = THINK_RE.replace_all(text, "");
    let bytes = cleaned.as_bytes();

    let mut search_from = 0;
    while let Some(offset) = cleaned[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = balanced_end(bytes, start) {
            let candidate = &cleaned[start..=end];
            if let Ok(serde_json::Value::Object(_)) = serde_json::from_str(candidate) {
                return Some(candidate.to_string());
            }
        }
        search_from = start + 1;
    }
    None
}

/// Index of the brace closing the one at `start`.
fn balanced_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_inside_prose_and_fences() {
        let reply = "Sure! Here is the result:\n```json\n{\"status\": \"CORRECT\", \"issues\": []}\n```\nBye.";
        assert_eq!(
            extract_embedded_object(reply).as_deref(),
            Some("{\"status\": \"CORRECT\", \"issues\": []}")
        );
    }

    #[test]
    fn test_braces_inside_strings() {
        let reply = r#"{"status": "INCORRECT", "descr": ["Uses {curly} braces }"]}"#;
        assert_eq!(extract_embedded_object(reply).as_deref(), Some(reply));
    }

    #[test]
    fn test_skips_invalid_candidates() {
        let reply = "set {a, b} then {\"status\": \"good\"}";
        assert_eq!(
            extract_embedded_object(reply).as_deref(),
            Some("{\"status\": \"good\"}")
        );
    }

    #[test]
    fn test_think_blocks_ignored() {
        let reply = "<think>maybe {\"status\": \"bad\"}?</think>{\"status\": \"good\"}";
        assert_eq!(
            extract_embedded_object(reply).as_deref(),
            Some("{\"status\": \"good\"}")
        );
    }

    #[test]
    fn test_absent_or_unbalanced() {
        assert_eq!(extract_embedded_object("no json here"), None);
        assert_eq!(extract_embedded_object("{\"status\": \"good\""), None);
    }
}
