//! Turn a free-form oracle reply into per-rule verdicts.

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::json_extract::extract_embedded_object;
use crate::models::Verdict;
use crate::rules::{is_reference_token, Rule};

/// Map `reply` onto verdicts for every rule in `asked`, in `asked` order.
///
/// Never fails: anything unusable becomes Unknown on the asked rules.
pub fn map_oracle_reply<'c>(reply: &str, asked: &[&'c Rule]) -> IndexMap<&'c Rule, Vec<Verdict>> {
    let Some(raw) = extract_embedded_object(reply) else {
        return all_with(asked, Verdict::unknown("No structured reply found."));
    };
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(&raw) else {
        return all_with(asked, Verdict::unknown("No structured reply found."));
    };
    let Some(status) = object.get("status").and_then(Value::as_str) else {
        return all_with(asked, Verdict::unknown("Reply has no status field."));
    };
    let status = status.trim().to_lowercase();
    let issues = object.get("issues").and_then(Value::as_array);

    match issues {
        Some(issues) if !issues.is_empty() => {
            let descriptions = object.get("descr").and_then(Value::as_array);
            let mut report: IndexMap<&'c Rule, Vec<Verdict>> =
                asked.iter().map(|&rule| (rule, Vec::new())).collect();

            for (i, issue) in issues.iter().enumerate() {
                let Some(token) = issue.as_str().and_then(first_reference) else {
                    continue;
                };
                let Some(verdicts) = report
                    .iter_mut()
                    .find(|(rule, _)| rule.reference == token)
                    .map(|(_, verdicts)| verdicts)
                else {
                    debug!("Discarding unasked reference {token} in oracle reply");
                    continue;
                };
                let description = descriptions
                    .and_then(|d| d.get(i))
                    .and_then(Value::as_str)
                    .unwrap_or("");
                verdicts.push(Verdict::bad(description));
            }

            for verdicts in report.values_mut() {
                if verdicts.is_empty() {
                    verdicts.push(Verdict::good());
                }
            }
            report
        }
        _ if status == "good" || status == "correct" => all_with(asked, Verdict::good()),
        Some(_) => all_with(asked, Verdict::good()),
        None => all_with(
            asked,
            Verdict::unknown(format!("Status is '{status}' but the reply lists no issues.")),
        ),
    }
}

/// First whole word of `text` shaped like a rule reference.
fn first_reference(text: &str) -> Option<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|word| is_reference_token(word))
}

fn all_with<'c>(asked: &[&'c Rule], verdict: Verdict) -> IndexMap<&'c Rule, Vec<Verdict>> {
    asked
        .iter()
        .map(|&rule| (rule, vec![verdict.clone()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckStatus;
    use crate::rules::Catalogue;

    fn statuses(report: &IndexMap<&Rule, Vec<Verdict>>) -> Vec<(String, Vec<CheckStatus>)> {
        report
            .iter()
            .map(|(rule, verdicts)| {
                (
                    rule.reference.clone(),
                    verdicts.iter().map(|v| v.status).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_good_status() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap(), catalogue.get("DCE501").unwrap()];
        for reply in [r#"{"status": "good"}"#, r#"{"status": "CORRECT", "issues": []}"#] {
            let report = map_oracle_reply(reply, &asked);
            assert_eq!(report.len(), 2);
            assert!(report.values().flatten().all(Verdict::is_good));
        }
    }

    #[test]
    fn test_issues_map_to_bad_and_silence_is_good() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap(), catalogue.get("DCE501").unwrap()];
        let reply = r#"Result: {"status": "INCORRECT", "issues": ["DCE501", "DCE501"], "descr": ["Says email, sends SMS.", "Also logs."]}"#;
        let report = map_oracle_reply(reply, &asked);
        assert_eq!(
            statuses(&report),
            vec![
                ("DCE401".to_string(), vec![CheckStatus::Good]),
                ("DCE501".to_string(), vec![CheckStatus::Bad, CheckStatus::Bad]),
            ]
        );
        assert_eq!(report[asked[1]][0].issue, "Says email, sends SMS.");
    }

    #[test]
    fn test_issue_list_wins_over_good_status() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap()];
        let report = map_oracle_reply(r#"{"status": "good", "issues": ["DCE401"]}"#, &asked);
        assert!(report[asked[0]][0].is_bad());
        assert_eq!(report[asked[0]][0].issue, "");
    }

    #[test]
    fn test_unknown_and_unasked_references_discarded() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap()];
        let reply = r#"{"status": "INCORRECT", "issues": ["DCE999", "DCE502", "garbage", 7], "descr": ["a", "b", "c", "d"]}"#;
        let report = map_oracle_reply(reply, &asked);
        assert_eq!(report.len(), 1);
        assert!(report[asked[0]][0].is_good());
    }

    #[test]
    fn test_reference_found_inside_issue_text() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap(), catalogue.get("DCE501").unwrap()];
        let reply = r#"{"status": "INCORRECT", "issues": ["rule DCE501: wrong behaviour", "XDCE401", "DCE4011"], "descr": ["a", "b", "c"]}"#;
        let report = map_oracle_reply(reply, &asked);
        assert!(report[asked[0]][0].is_good());
        assert!(report[asked[1]][0].is_bad());
        assert_eq!(report[asked[1]][0].issue, "a");

        assert_eq!(first_reference("see (DCE102)."), Some("DCE102"));
        assert_eq!(first_reference("DCE10x DCE1O2"), None);
    }

    #[test]
    fn test_unusable_replies_degrade_to_unknown() {
        let catalogue = Catalogue::builtin().unwrap();
        let asked = [catalogue.get("DCE401").unwrap(), catalogue.get("DCE402").unwrap()];
        for reply in [
            "I cannot help with that.",
            r#"{"issues": ["DCE401"]}"#,
            r#"{"status": "INCORRECT"}"#,
        ] {
            let report = map_oracle_reply(reply, &asked);
            assert_eq!(report.len(), 2);
            assert!(report
                .values()
                .flatten()
                .all(|v| v.status == CheckStatus::Unknown));
        }
    }
}
