//! Best-effort structured extraction from free-form model output

use serde::de::DeserializeOwned;

/// Result of pulling a typed value out of model text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    Parsed(T),
    /// No balanced object found, or it did not deserialize. Holds the raw text.
    Unparsed(String),
}

impl<T> Extraction<T> {
    pub fn parsed(self) -> Option<T> {
        match self {
            Extraction::Parsed(v) => Some(v),
            Extraction::Unparsed(_) => None,
        }
    }
}

/// Deserialize the first balanced JSON object found in `text`.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Extraction<T> {
    let cleaned = strip_think_block(text);
    match find_json_object(cleaned).map(serde_json::from_str::<T>) {
        Some(Ok(value)) => Extraction::Parsed(value),
        Some(Err(e)) => {
            tracing::debug!(error = %e, "JSON object found but did not match the expected shape");
            Extraction::Unparsed(text.to_string())
        }
        None => Extraction::Unparsed(text.to_string()),
    }
}

/// Slice of the first balanced `{...}` in `text`.
///
/// Braces inside JSON strings (and escaped quotes) are ignored while
/// balancing. Unbalanced text yields `None`.
pub fn find_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Reasoning models prefix answers with `<think>...</think>`; drop it.
fn strip_think_block(text: &str) -> &str {
    match text.find("</think>") {
        Some(end) => &text[end + "</think>".len()..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Plan {
        trend_scan: String,
    }

    #[test]
    fn extracts_object_wrapped_in_prose_and_fences() {
        let text = "Sure! Here is the plan:\n```json\n{\"trend_scan\": \"meal ai\"}\n```\nGood luck.";
        assert_eq!(
            extract_json::<Plan>(text),
            Extraction::Parsed(Plan {
                trend_scan: "meal ai".into()
            })
        );
    }

    #[test]
    fn braces_inside_strings_do_not_break_balancing() {
        let text = r#"{"trend_scan": "use {curly} and \"quotes\""} trailing }"#;
        assert_eq!(
            find_json_object(text),
            Some(r#"{"trend_scan": "use {curly} and \"quotes\""}"#)
        );
    }

    #[test]
    fn nested_objects_return_outermost() {
        let text = r#"x {"a": {"b": 1}} {"c": 2}"#;
        assert_eq!(find_json_object(text), Some(r#"{"a": {"b": 1}}"#));
    }

    #[test]
    fn non_json_text_is_unparsed() {
        let text = "I cannot produce a plan for that.";
        assert_eq!(
            extract_json::<HashMap<String, String>>(text),
            Extraction::Unparsed(text.to_string())
        );
    }

    #[test]
    fn truncated_object_is_unparsed() {
        assert_eq!(find_json_object(r#"{"trend_scan": "meal"#), None);
        assert!(extract_json::<Plan>(r#"{"trend_scan": "#).parsed().is_none());
    }

    #[test]
    fn wrong_shape_is_unparsed() {
        assert!(matches!(
            extract_json::<Plan>(r#"{"other": 1}"#),
            Extraction::Unparsed(_)
        ));
    }

    #[test]
    fn think_block_is_skipped() {
        let text = "<think>maybe {\"trend_scan\": \"wrong\"}</think>{\"trend_scan\": \"right\"}";
        assert_eq!(
            extract_json::<Plan>(text).parsed(),
            Some(Plan {
                trend_scan: "right".into()
            })
        );
    }
}
