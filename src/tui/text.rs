//! Text wrapping for display.

/// Split text into lines of max width (columns). Uses textwrap for correct UTF-8 handling.
fn wrap_text(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![s.to_string()];
    }
    textwrap::wrap(s, width)
        .into_iter()
        .map(|cow| cow.into_owned())
        .collect()
}

/// Split a message into display lines respecting message newlines, then wrap to `width`.
pub(crate) fn wrap_message(msg: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for line in msg.split('\n') {
        if line.is_empty() {
            out.push(String::new());
        } else {
            out.extend(wrap_text(line, width));
        }
    }
    out
}

/// Keep the last `max` chars of `s`, prefixed with "…" when cut.
pub(crate) fn truncate_start(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let skip = count - max.saturating_sub(1);
    format!("…{}", s.chars().skip(skip).collect::<String>())
}
