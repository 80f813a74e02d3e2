//! Logging helpers for text we do not control (search queries, response bodies).
//! Keeps every log record on a single line and bounded in size.

const DEFAULT_PREVIEW: usize = 300;

/// Escape `s` for single-line logging, capped at a generous default length.
pub fn escape_log(s: &str) -> String {
    escape_log_preview(s, DEFAULT_PREVIEW)
}

/// Escape `s` for single-line logging:
/// - `\n` => `\\n`
/// - `\r` => `\\r`
/// - `\t` => `\\t`
/// - backslash => `\\\\`
/// - other control characters => `\xNN`
///
/// Output stops after `max_chars` input characters with an ellipsis.
pub fn escape_log_preview(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                use std::fmt::Write;
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}
