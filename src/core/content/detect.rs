//! Content-type detection: advisory flags that decide which affordances a reply gets.

use std::sync::OnceLock;

use regex::Regex;

static SQL: OnceLock<Regex> = OnceLock::new();
static HTML_TAG: OnceLock<Regex> = OnceLock::new();
static JAVASCRIPT: OnceLock<Regex> = OnceLock::new();
static PROGRAMMING: OnceLock<Regex> = OnceLock::new();

/// Attribute spellings of front-end frameworks that indicate previewable markup.
const FRAMEWORK_MARKERS: &[&str] = &[
    "className=",
    "v-if",
    "v-for",
    "v-bind",
    "ng-",
    "@click",
    "x-data",
    "style={{",
];

fn sql() -> &'static Regex {
    SQL.get_or_init(|| {
        Regex::new(
            r"\b(?:SELECT\s+[\s\S]+?\s+FROM|INSERT\s+INTO|UPDATE\s+\w+\s+SET|DELETE\s+FROM|CREATE\s+(?:TABLE|INDEX|VIEW)|ALTER\s+TABLE|DROP\s+TABLE)\b",
        )
        .expect("sql pattern is valid")
    })
}

fn html_tag() -> &'static Regex {
    HTML_TAG.get_or_init(|| {
        Regex::new(r"</?[a-zA-Z][a-zA-Z0-9-]*(?:\s[^<>]*)?/?>").expect("html pattern is valid")
    })
}

fn javascript() -> &'static Regex {
    JAVASCRIPT.get_or_init(|| {
        Regex::new(
            r"\bfunction\s*\w*\s*\(|\b(?:const|let|var)\s+\w+\s*=|=>|\bconsole\.\w+\(|\bdocument\.\w+",
        )
        .expect("javascript pattern is valid")
    })
}

fn programming() -> &'static Regex {
    PROGRAMMING.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:def\s+\w+\s*\(|class\s+\w+\s*[:({]|import\s+[\w.]+|from\s+[\w.]+\s+import\b|#include\s*<|public\s+(?:static\s+)?(?:class|void|int)\b|fn\s+\w+\s*[(<]|package\s+\w+)",
        )
        .expect("programming pattern is valid")
    })
}

/// Independent, heuristic content flags. Not mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentFlags {
    pub has_code_blocks: bool,
    pub has_sql_keywords: bool,
    pub has_html_tags: bool,
    pub has_javascript: bool,
    pub has_programming_keywords: bool,
    pub has_visual_code: bool,
}

impl ContentFlags {
    /// The reply carries something worth a "copy code" action.
    pub fn offers_copy_code(&self) -> bool {
        self.has_code_blocks
            || self.has_sql_keywords
            || self.has_javascript
            || self.has_programming_keywords
    }

    /// The reply carries markup worth a "preview" action.
    pub fn offers_preview(&self) -> bool {
        self.has_visual_code
    }

    /// Short names of the flags that are set, for status output.
    pub fn names(&self) -> Vec<&'static str> {
        [
            (self.has_code_blocks, "code-blocks"),
            (self.has_sql_keywords, "sql"),
            (self.has_html_tags, "html"),
            (self.has_javascript, "javascript"),
            (self.has_programming_keywords, "programming"),
            (self.has_visual_code, "visual"),
        ]
        .into_iter()
        .filter_map(|(set, name)| set.then_some(name))
        .collect()
    }
}

/// Detect content flags on normalized text.
pub fn detect(text: &str) -> ContentFlags {
    let has_html_tags = html_tag().is_match(text);
    ContentFlags {
        has_code_blocks: text.contains("```"),
        has_sql_keywords: sql().is_match(text),
        has_html_tags,
        has_javascript: javascript().is_match(text),
        has_programming_keywords: programming().is_match(text),
        has_visual_code: has_html_tags || FRAMEWORK_MARKERS.iter().any(|m| text.contains(m)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_prose_has_no_flags() {
        assert_eq!(detect("Hello"), ContentFlags::default());
        assert_eq!(
            detect("Select the option you want from the list."),
            ContentFlags::default()
        );
    }

    #[test]
    fn code_fence_sets_code_blocks_only() {
        let flags = detect("```\nplain\n```");
        assert!(flags.has_code_blocks);
        assert!(!flags.has_html_tags);
        assert!(flags.offers_copy_code());
        assert_eq!(flags.names(), vec!["code-blocks"]);
    }

    #[test]
    fn sql_keywords() {
        assert!(detect("SELECT id, name FROM users WHERE id = 1").has_sql_keywords);
        assert!(detect("INSERT INTO t VALUES (1)").has_sql_keywords);
        assert!(detect("CREATE TABLE t (id int)").has_sql_keywords);
    }

    #[test]
    fn html_tags_imply_visual_code() {
        let flags = detect("<div class=\"box\">hi</div>");
        assert!(flags.has_html_tags);
        assert!(flags.has_visual_code);
        assert!(flags.offers_preview());
        assert!(!detect("a < b and c > d").has_html_tags);
    }

    #[test]
    fn framework_markers_imply_visual_code_without_tags() {
        let flags = detect("use className=\"x\" on the element");
        assert!(!flags.has_html_tags);
        assert!(flags.has_visual_code);
    }

    #[test]
    fn javascript_and_programming_keywords() {
        assert!(detect("const total = items.length;").has_javascript);
        assert!(detect("items.map(x => x * 2)").has_javascript);
        assert!(detect("def main():\n    pass").has_programming_keywords);
        assert!(detect("import os").has_programming_keywords);
        assert!(!detect("I will import the goods tomorrow").has_programming_keywords);
    }

    #[test]
    fn flags_are_independent() {
        let flags = detect("```html\n<p>hi</p>\n```\nSELECT a FROM b");
        assert!(flags.has_code_blocks);
        assert!(flags.has_html_tags);
        assert!(flags.has_sql_keywords);
        assert!(!flags.has_javascript);
    }
}
