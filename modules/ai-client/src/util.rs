/// Truncate a string to at most `max_bytes` bytes at a character boundary.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip markdown code fences from a model response.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Slice out the outermost `{ ... }` span of a response, if any.
///
/// Models sometimes wrap the requested object in a sentence; this keeps the
/// object and drops the prose around it. The slice is not validated.
pub fn extract_json_object(response: &str) -> Option<&str> {
    let stripped = strip_code_blocks(response);
    let start = stripped.find('{')?;
    let end = stripped.rfind('}')?;
    (start < end).then(|| &stripped[start..=end])
}
