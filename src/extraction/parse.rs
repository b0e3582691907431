use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use super::ExtractionError;
use crate::league::ExtractedRow;
use crate::league::aggregate::ordinal;

/// A reply wrapped in a Markdown code fence, with or without a language tag.
const CODE_FENCE_PATTERN: &str = r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$";

const NAME_KEYS: [&str; 4] = ["playerName", "player_name", "player", "name"];
const TEAM_KEYS: [&str; 2] = ["team", "teamName"];
const SCORE_KEYS: [&str; 2] = ["score", "points"];
const RANK_KEYS: [&str; 3] = ["rank", "position", "place"];

fn code_fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(CODE_FENCE_PATTERN).expect("valid code fence pattern"))
}

/// Returns true if the character is a dash-like character used for missing scores.
fn is_dash_char(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2014}' // em-dash —
            | '\u{2013}' // en-dash –
            | '\u{2015}' // horizontal bar ―
            | '\u{2500}' // box drawing horizontal ─
            | '\u{30FC}' // katakana prolonged sound mark ー
    )
}

/// Strips a surrounding Markdown code fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    match code_fence_regex().captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}

/// Parses the model's reply into rows.
///
/// Accepts a bare JSON array of row objects, or an object holding that array
/// under `players` / `rows` / `results`. Every row is kept; blank names are
/// left for the validity check downstream.
pub fn parse_rows(text: &str) -> Result<Vec<ExtractedRow>, ExtractionError> {
    let body = strip_code_fence(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExtractionError::Fatal(format!("model reply is not JSON: {}", e)))?;

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => ["players", "rows", "results"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array))
            .ok_or_else(|| ExtractionError::Fatal("model reply has no player list".to_string()))?,
        _ => {
            return Err(ExtractionError::Fatal(
                "model reply is neither a list nor an object".to_string(),
            ));
        }
    };

    Ok(items.iter().filter_map(parse_row).collect())
}

/// Converts one row object. Non-objects are skipped.
fn parse_row(item: &Value) -> Option<ExtractedRow> {
    let object = item.as_object()?;
    let field = |keys: &[&str]| keys.iter().find_map(|key| object.get(*key)).cloned();

    Some(ExtractedRow {
        player: field(&NAME_KEYS[..]).map(|v| value_text(&v)).unwrap_or_default(),
        team: field(&TEAM_KEYS[..]).map(|v| value_text(&v)).unwrap_or_default(),
        score: field(&SCORE_KEYS[..]).map(|v| parse_score(&v)).unwrap_or(0),
        rank: field(&RANK_KEYS[..]).map(|v| parse_rank(&v)).unwrap_or_default(),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parses a score given as a number or as text with separators.
/// Dashes and unreadable text score zero.
pub fn parse_score(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .map(|n| n.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() || text.chars().all(is_dash_char) {
                return 0;
            }
            parse_score_text(text)
        }
        _ => 0,
    }
}

/// First number in the text, with grouping separators dropped. Fractions
/// round like numeric scores and negative values score zero.
fn parse_score_text(text: &str) -> u32 {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | '\'' | ' ' | '\u{a0}' | '\u{202f}'))
        .collect();
    let Some(start) = cleaned.find(|c: char| c.is_ascii_digit()) else {
        return 0;
    };
    if cleaned[..start].ends_with(['-', '\u{2212}']) {
        return 0;
    }

    let mut seen_point = false;
    let number: String = cleaned[start..]
        .chars()
        .take_while(|c| {
            if *c == '.' && !seen_point {
                seen_point = true;
                true
            } else {
                c.is_ascii_digit()
            }
        })
        .collect();

    number
        .trim_end_matches('.')
        .parse::<f64>()
        .map(|f| f.round().min(u32::MAX as f64) as u32)
        .unwrap_or(0)
}

/// Parses a rank given as a label ("3rd") or a bare position (3).
pub fn parse_rank(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(position) if position > 0 => ordinal(position as usize),
            _ => String::new(),
        },
        Value::String(label) => {
            let label = label.trim();
            match label.parse::<usize>() {
                Ok(position) if position > 0 => ordinal(position),
                _ => label.to_string(),
            }
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_plain_array() {
        let text = r#"[
            {"playerName": "Alice", "team": "Sharks (BLUE)", "score": 82, "rank": "1st"},
            {"playerName": "Bob", "team": "Comets (RED)", "score": 70, "rank": "2nd"}
        ]"#;
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ExtractedRow::new("Alice", "Sharks (BLUE)", 82, "1st"));
        assert_eq!(rows[1].rank, "2nd");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let text = "```json\n[{\"playerName\": \"Alice\", \"score\": 5, \"rank\": \"9th\"}]\n```";
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows[0].player, "Alice");
        assert_eq!(rows[0].team, "");
    }

    #[test]
    fn test_parse_wrapped_object() {
        let text = r#"{"players": [{"name": "Bob", "points": "1,204", "position": 3}]}"#;
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows[0], ExtractedRow::new("Bob", "", 1204, "3rd"));
    }

    #[test]
    fn test_blank_names_are_kept() {
        let text = r#"[{"playerName": "  ", "score": 1, "rank": "4th"}, {"playerName": null}]"#;
        let rows = parse_rows(text).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|row| !row.is_valid()));
    }

    #[test]
    fn test_non_objects_skipped() {
        let rows = parse_rows(r#"[1, "x", {"playerName": "Carol"}]"#).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_garbage_is_fatal() {
        assert!(matches!(parse_rows("Sorry, I cannot read this."), Err(ExtractionError::Fatal(_))));
        assert!(matches!(parse_rows("42"), Err(ExtractionError::Fatal(_))));
        assert!(matches!(parse_rows(r#"{"note": "none"}"#), Err(ExtractionError::Fatal(_))));
    }

    #[test]
    fn test_parse_score_variants() {
        assert_eq!(parse_score(&json!(1234)), 1234);
        assert_eq!(parse_score(&json!(12.6)), 13);
        assert_eq!(parse_score(&json!(-4)), 0);
        assert_eq!(parse_score(&json!("12,345")), 12345);
        assert_eq!(parse_score(&json!("—")), 0);
        assert_eq!(parse_score(&json!("ー")), 0);
        assert_eq!(parse_score(&json!("n/a")), 0);
        assert_eq!(parse_score(&json!("1,204 pts")), 1204);
        assert_eq!(parse_score(&json!("Score: 88")), 88);
    }

    #[test]
    fn test_parse_score_text_fraction_and_sign() {
        assert_eq!(parse_score(&json!("12.5")), 13);
        assert_eq!(parse_score(&json!("12.4")), 12);
        assert_eq!(parse_score(&json!("7.")), 7);
        assert_eq!(parse_score(&json!("-5")), 0);
        assert_eq!(parse_score(&json!("\u{2212}5")), 0);
        assert_eq!(parse_score(&Value::Null), 0);
    }

    #[test]
    fn test_parse_rank_variants() {
        assert_eq!(parse_rank(&json!("1st")), "1st");
        assert_eq!(parse_rank(&json!(" 2nd ")), "2nd");
        assert_eq!(parse_rank(&json!(2)), "2nd");
        assert_eq!(parse_rank(&json!("11")), "11th");
        assert_eq!(parse_rank(&json!(0)), "");
        assert_eq!(parse_rank(&Value::Null), "");
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```\n[]\n```"), "[]");
        assert_eq!(strip_code_fence("  []  "), "[]");
    }
}
