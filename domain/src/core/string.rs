//! String helpers used when condensing contribution text.

/// Truncate a string to a maximum byte length with ellipsis (UTF-8 safe)
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// First line of `text` carrying actual content.
///
/// Blank lines and markdown decoration (`#`, `-`, `*`, `>`, list numbers) are
/// skipped so a heading like `## Critical Risks` yields `Critical Risks`.
pub fn first_meaningful_line(text: &str) -> Option<&str> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| matches!(c, '#' | '-' | '*' | '>'))
                .trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches(['.', ')'])
                .trim()
        })
        .find(|line| !line.is_empty())
}
