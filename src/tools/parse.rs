/// Strip a leading/trailing markdown code fence from a model response.
///
/// Degenerate replies (a bare fence line, an unterminated fence) come back
/// from real models; they must never panic here, only lose the fence lines.
pub fn strip_code_fences(response: &str) -> String {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() < 2 {
        // the whole reply was one fence line
        return String::new();
    }

    // drop the opening ```lang line, and the closing fence if there is one
    let mut inner = &lines[1..];
    if let Some((last, rest)) = inner.split_last() {
        if last.trim() == "```" {
            inner = rest;
        }
    }
    inner.join("\n")
}

/// Carve the first balanced JSON object out of `text`, ignoring whatever
/// prose surrounds it. Returns `None` if no balanced object is found.
pub fn extract_json(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}
