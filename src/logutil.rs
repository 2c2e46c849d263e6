//! Keep user-entered text (quest titles, character names, descriptions) on one log line.

const MAX_PREVIEW: usize = 200;

/// Escape a string for single-line logging.
///
/// Backslash, `\n`, `\r` and `\t` get backslash escapes, other control
/// characters become `\xNN`. Output is cut at 200 characters with an ellipsis.
pub fn escape_log(s: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(s.len().min(MAX_PREVIEW) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= MAX_PREVIEW {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
