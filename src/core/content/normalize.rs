//! Text normalization: removes serialization and formatting artifacts from relay output.
//!
//! Passes run in a fixed order; the whole sequence is repeated until the text stops
//! changing. Every replacement strictly lowers a weighted length (ASCII 1, CR 2,
//! other chars 4), so the loop terminates and the result is a fixpoint.

use std::sync::OnceLock;

use regex::Regex;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("normalizer patterns are valid"))
}

static LEADING_ARTIFACT: OnceLock<Regex> = OnceLock::new();
static TRAILING_ARTIFACT: OnceLock<Regex> = OnceLock::new();
static HASH_RUN: OnceLock<Regex> = OnceLock::new();
static BULLET_GLYPH: OnceLock<Regex> = OnceLock::new();
static DISALLOWED: OnceLock<Regex> = OnceLock::new();
static TRAILING_SPACE: OnceLock<Regex> = OnceLock::new();
static BLANK_RUN: OnceLock<Regex> = OnceLock::new();

/// Normalize relay text for display. Idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// Escapes are resolved to the fixpoint too, so a doubly escaped `\\n` ends up as a
/// newline, not as a literal `\n`.
pub fn normalize(raw: &str) -> String {
    let mut current = normalize_once(raw);
    loop {
        let next = normalize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_once(s: &str) -> String {
    let s = strip_serialization_artifacts(s);
    let s = unescape(&s);
    let s = strip_wrapping_quotes(s.trim());
    let s = regex(&HASH_RUN, r"#{3,}").replace_all(s, "");
    let s = regex(&BULLET_GLYPH, r"[•◦▪▫●○■□►▸‣⁃∙]").replace_all(&s, "");
    let s = ascii_punctuation(&s);
    let s = drop_disallowed(&s);
    tidy_whitespace(&s)
}

/// Pass 1: leading `["` and trailing `"]` runs left over from serialized string arrays.
/// Nested layers go in one step so deep nesting does not cost one loop round per layer.
fn strip_serialization_artifacts(s: &str) -> String {
    let s = s.trim();
    let s = regex(&LEADING_ARTIFACT, r#"^(?:\[\s*")+"#).replace(s, "");
    regex(&TRAILING_ARTIFACT, r#"(?:"\s*\])+$"#)
        .replace(&s, "")
        .into_owned()
}

/// Pass 2: literal backslash sequences.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let simple = match chars.peek() {
            Some('n') => Some('\n'),
            Some('t') => Some('\t'),
            Some('"') => Some('"'),
            Some('r') => Some('\r'),
            Some('\\') => Some('\\'),
            _ => None,
        };
        if let Some(r) = simple {
            chars.next();
            out.push(r);
            continue;
        }
        if chars.peek() == Some(&'u') {
            let hex: String = chars.clone().skip(1).take(4).collect();
            if let Some(decoded) = decode_hex4(&hex) {
                // 'u' plus four hex digits
                for _ in 0..5 {
                    chars.next();
                }
                out.push(decoded);
                continue;
            }
        }
        out.push('\\');
    }
    out
}

fn decode_hex4(hex: &str) -> Option<char> {
    if hex.len() != 4 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
}

/// Pass 3: one pair of wrapping quotes/backticks, only when the wrapped text has no other
/// occurrence of that character. Code fences are left alone.
fn strip_wrapping_quotes(s: &str) -> &str {
    if s.starts_with("```") {
        return s;
    }
    for q in ['"', '\'', '`'] {
        if s.len() >= 2 && s.starts_with(q) && s.ends_with(q) {
            let inner = &s[1..s.len() - 1];
            if !inner.contains(q) {
                return inner;
            }
        }
    }
    s
}

/// Pass 6: typographic punctuation and non-breaking spaces to ASCII.
fn ascii_punctuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => out.push('"'),
            '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{202F}' | '\u{2007}' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// Pass 7: keep word characters, the Hebrew block, ASCII punctuation, basic whitespace,
/// and a few currency signs. Emoji and other symbols are dropped.
fn drop_disallowed(s: &str) -> String {
    regex(
        &DISALLOWED,
        r"[^\w\x{0590}-\x{05FF} \t\n\r\x21-\x2F\x3A-\x40\x5B-\x60\x7B-\x7E€£₪]",
    )
    .replace_all(s, "")
    .into_owned()
}

/// Pass 8: line endings, trailing spaces, blank-line runs, outer whitespace.
fn tidy_whitespace(s: &str) -> String {
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = regex(&TRAILING_SPACE, r"(?m)[ \t]+$").replace_all(&s, "");
    let s = regex(&BLANK_RUN, r"\n{3,}").replace_all(&s, "\n\n");
    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescapes_common_sequences() {
        assert_eq!(normalize(r"line one\nline two"), "line one\nline two");
        assert_eq!(normalize(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(normalize(r"a\tb"), "a\tb");
        assert_eq!(normalize(r"C:\\Users"), "C:\\Users");
    }

    #[test]
    fn double_escapes_resolve_to_the_fixpoint() {
        assert_eq!(normalize(r"C:\\new"), "C:\new");
        assert_eq!(normalize(r"a\\tb"), "a\tb");
    }

    #[test]
    fn deep_array_nesting_is_stripped_in_one_step() {
        let nested = format!("{}x{}", "[\"".repeat(3000), "\"]".repeat(3000));
        assert_eq!(normalize(&nested), "x");
        assert_eq!(strip_serialization_artifacts(r#"[ "[ "a" ]" ]"#), "a");
    }

    #[test]
    fn unescapes_unicode_sequences() {
        assert_eq!(normalize(r"\u05e9\u05dc\u05d5\u05dd"), "שלום");
        assert_eq!(normalize(r"caf\u00e9"), "café");
    }

    #[test]
    fn invalid_unicode_escape_is_kept() {
        assert_eq!(normalize(r"\uZZZZ"), r"\uZZZZ");
        assert_eq!(normalize(r"\u12"), r"\u12");
    }

    #[test]
    fn strips_array_artifacts_and_wrapping_quotes() {
        assert_eq!(normalize(r#"["Hello there"]"#), "Hello there");
        assert_eq!(normalize("\"Hello\""), "Hello");
        assert_eq!(normalize("`inline`"), "inline");
    }

    #[test]
    fn keeps_inner_quotes() {
        assert_eq!(normalize("\"a\" and \"b\""), "\"a\" and \"b\"");
    }

    #[test]
    fn keeps_code_fences() {
        let fenced = "```python\nprint(1)\n```";
        assert_eq!(normalize(fenced), fenced);
    }

    #[test]
    fn removes_heading_runs_and_bullets() {
        assert_eq!(normalize("### Title"), "Title");
        assert_eq!(normalize("• one\n• two"), "one\n two");
        assert_eq!(normalize("## kept"), "## kept");
    }

    #[test]
    fn smart_punctuation_becomes_ascii() {
        assert_eq!(
            normalize("\u{201C}quoted\u{201D} \u{2014} it\u{2019}s\u{2026}"),
            "\"quoted\" - it's..."
        );
        assert_eq!(normalize("a\u{00A0}b"), "a b");
    }

    #[test]
    fn drops_emoji_but_keeps_hebrew_and_currency() {
        assert_eq!(normalize("Hello 👋 שלום ₪5"), "Hello  שלום ₪5");
        assert_eq!(normalize("🚀"), "");
    }

    #[test]
    fn collapses_blank_lines_and_trailing_spaces() {
        assert_eq!(normalize("a   \n\n\n\n\nb\t\n"), "a\n\nb");
        assert_eq!(normalize("a\r\nb"), "a\nb");
        assert_eq!(normalize("\n\n  text  \n\n"), "text");
    }

    #[test]
    fn empty_and_whitespace_inputs() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn idempotent_on_representative_inputs() {
        let inputs = [
            "",
            "Hello",
            r#"["\"nested\""]"#,
            r"\\\\n\\\\t",
            "### • “quote” — done…",
            "```sql\nSELECT * FROM t;\n```\n\n\n\ntext",
            "\"'`x`'\"",
            r"“wrapped” 😀",
            "a\r\n\r\n\r\n\r\nb",
            "[\"only start",
            "end only\"]",
            "#####",
            "\\",
            "שלום עולם! 😀",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }
}
