//! Helpers for raw model text.

const FENCE: &str = "```";

/// Pull a JSON document out of free-form model output.
///
/// A fenced code block wins; otherwise the span from the first `{` or `[`
/// to the last matching closer is returned.
pub fn extract_json(text: &str) -> Option<String> {
    if let Some(inner) = first_fenced_block(text) {
        if !inner.is_empty() {
            return Some(inner.to_string());
        }
    }

    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    if end <= start {
        return None;
    }
    Some(text[start..=end].trim().to_string())
}

fn first_fenced_block(text: &str) -> Option<&str> {
    let open = text.find(FENCE)?;
    let mut body = &text[open + FENCE.len()..];
    if body.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
        body = &body[4..];
    }
    let close = body.find(FENCE)?;
    Some(body[..close].trim())
}

/// Remove a leading and a trailing markdown fence, then trim.
pub fn strip_code_fences(text: &str) -> String {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix(FENCE) {
        let tag_len = rest
            .find(|c: char| !c.is_ascii_alphanumeric())
            .unwrap_or(rest.len());
        body = &rest[tag_len..];
        body = body.strip_prefix('\n').unwrap_or(body);
    }
    if let Some(rest) = body.strip_suffix(FENCE) {
        body = rest.strip_suffix('\n').unwrap_or(rest);
    }
    body.trim().to_string()
}

/// Shorten long text for log lines.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    let char_count = input.chars().count();
    if char_count <= max_chars {
        return input.to_string();
    }
    let mut preview: String = input.chars().take(max_chars).collect();
    preview.push_str(&format!("... [truncated, total_chars={}]", char_count));
    preview
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_prefers_fenced_block() {
        let text = "Here you go:\n```json\n{\"type\": \"Card\"}\n```\nand {\"other\": 1}";
        assert_eq!(extract_json(text).as_deref(), Some("{\"type\": \"Card\"}"));

        let plain_fence = "```\n[1, 2]\n```";
        assert_eq!(extract_json(plain_fence).as_deref(), Some("[1, 2]"));
    }

    #[test]
    fn test_extract_json_outermost_span() {
        assert_eq!(
            extract_json("prefix {\"a\": {\"b\": 1}} suffix").as_deref(),
            Some("{\"a\": {\"b\": 1}}")
        );
        assert_eq!(extract_json("list: [1, [2]] done").as_deref(), Some("[1, [2]]"));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```text\nHello there.\n```"), "Hello there.");
        assert_eq!(strip_code_fences("  Plain answer.  "), "Plain answer.");
        assert_eq!(strip_code_fences("```\nA\nB\n```"), "A\nB");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(
            truncate_for_log("abcdef", 3),
            "abc... [truncated, total_chars=6]"
        );
    }
}
