//! Locating a JSON payload inside free-form model output.

use std::sync::OnceLock;

use regex::Regex;

use crate::structured::Shape;

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+-]*)[ \t]*\r?\n?(.*?)```")
            .expect("fence pattern is a valid regex")
    })
}

/// Interior of the first ```` ```json ```` block, or of the first fenced block of
/// any kind when none is tagged JSON. `None` if the text has no closed fence.
pub fn fenced_region(text: &str) -> Option<&str> {
    let mut first_any = None;
    for caps in fence_regex().captures_iter(text) {
        let body = caps.get(2).map(|m| m.as_str())?;
        let tag = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if tag.eq_ignore_ascii_case("json") {
            return Some(body);
        }
        first_any.get_or_insert(body);
    }
    first_any
}

/// From the first opening token to the last closing token of the shape. Does not
/// check that the two actually match.
pub fn first_open_last_close(text: &str, shape: Shape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// From the first opening token to the point where bracket depth returns to zero.
/// Brackets inside JSON string literals are ignored. `None` if the payload never
/// closes.
pub fn balanced_span(text: &str, shape: Shape) -> Option<&str> {
    let (open, _) = shape.delimiters();
    let start = text.find(open)?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    let end = start + offset + c.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Candidate payloads to try in order: the balanced span first, then the
/// first-open/last-close span when it differs.
pub fn candidate_spans(text: &str, shape: Shape) -> Vec<&str> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(span) = balanced_span(text, shape) {
        candidates.push(span);
    }
    if let Some(span) = first_open_last_close(text, shape) {
        if !candidates.contains(&span) {
            candidates.push(span);
        }
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_region_prefers_json_tag() {
        let text = "```text\nnot this\n```\nthen\n```json\n{\"a\":1}\n```";
        assert_eq!(fenced_region(text), Some("{\"a\":1}\n"));
    }

    #[test]
    fn test_fenced_region_untagged() {
        let text = "Here:\n```\n[1, 2]\n```\nDone";
        assert_eq!(fenced_region(text), Some("[1, 2]\n"));
    }

    #[test]
    fn test_fenced_region_inline_tag() {
        assert_eq!(fenced_region("```json{\"a\":1}```"), Some("{\"a\":1}"));
    }

    #[test]
    fn test_fenced_region_absent_or_unclosed() {
        assert_eq!(fenced_region("no fences here"), None);
        assert_eq!(fenced_region("```json\n{\"a\":1}"), None);
    }

    #[test]
    fn test_first_open_last_close_spans_prose_brackets() {
        let text = "{\"a\":1} and then a stray }";
        assert_eq!(
            first_open_last_close(text, Shape::Object),
            Some("{\"a\":1} and then a stray }")
        );
    }

    #[test]
    fn test_first_open_last_close_requires_order() {
        assert_eq!(first_open_last_close("} oops {", Shape::Object), None);
        assert_eq!(first_open_last_close("no brackets", Shape::Array), None);
    }

    #[test]
    fn test_balanced_span_stops_at_matching_close() {
        let text = "{\"a\":{\"b\":[1,2]}} trailing } prose";
        assert_eq!(
            balanced_span(text, Shape::Object),
            Some("{\"a\":{\"b\":[1,2]}}")
        );
    }

    #[test]
    fn test_balanced_span_ignores_brackets_in_strings() {
        let text = r#"{"q":"use {x} and \"]\" here"} tail"#;
        assert_eq!(
            balanced_span(text, Shape::Object),
            Some(r#"{"q":"use {x} and \"]\" here"}"#)
        );
    }

    #[test]
    fn test_balanced_span_unclosed_is_none() {
        assert_eq!(balanced_span("{\"a\": [1, 2", Shape::Object), None);
    }

    #[test]
    fn test_balanced_span_handles_multibyte_text() {
        let text = "結果：[{\"名字\":\"王小明\"}]。";
        assert_eq!(
            balanced_span(text, Shape::Array),
            Some("[{\"名字\":\"王小明\"}]")
        );
    }

    #[test]
    fn test_candidate_spans_deduplicates() {
        assert_eq!(candidate_spans("{\"a\":1}", Shape::Object), vec!["{\"a\":1}"]);
        assert_eq!(
            candidate_spans("{\"a\":1} }", Shape::Object),
            vec!["{\"a\":1}", "{\"a\":1} }"]
        );
        assert!(candidate_spans("nothing", Shape::Object).is_empty());
    }
}
