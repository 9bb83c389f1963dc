//! Segmented rendering model: prose and fenced code pieces of normalized content.
//!
//! This is display-agnostic; the TUI turns `RenderedSegment`s into styled lines.

use std::sync::OnceLock;

use regex::Regex;

static FENCED_BLOCK: OnceLock<Regex> = OnceLock::new();
static TECH_TERM: OnceLock<Regex> = OnceLock::new();

/// Longest first line (exclusive, in chars) still treated as a language tag.
const MAX_LANG_TAG_CHARS: usize = 20;

fn fenced_block() -> &'static Regex {
    FENCED_BLOCK.get_or_init(|| Regex::new(r"```[\s\S]*?```").expect("fence pattern is valid"))
}

fn tech_term() -> &'static Regex {
    TECH_TERM.get_or_init(|| {
        Regex::new(concat!(
            r"\b(?:SQL|HTML|CSS|API|REST|JSON|XML|HTTPS?|URL|GraphQL|JavaScript|TypeScript",
            r"|SELECT|INSERT|UPDATE|DELETE|FROM|WHERE|JOIN|GROUP BY|ORDER BY|CREATE TABLE",
            r"|PRIMARY KEY|FOREIGN KEY|INDEX|endpoint|webhook|schema|database)\b",
            r"|</?[a-zA-Z][a-zA-Z0-9-]*>",
        ))
        .expect("term pattern is valid")
    })
}

/// Raw split piece. `Code` still includes its fences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    Prose(&'a str),
    Code(&'a str),
}

/// Split content on fenced regions, keeping the fences. Pieces alternate prose/code in
/// source order; prose pieces may be empty. An unclosed fence stays prose.
pub fn split_segments(content: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    for m in fenced_block().find_iter(content) {
        pieces.push(Piece::Prose(&content[last..m.start()]));
        pieces.push(Piece::Code(m.as_str()));
        last = m.end();
    }
    pieces.push(Piece::Prose(&content[last..]));
    pieces
}

/// A fenced block with its optional language tag removed from the displayed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlock<'a> {
    pub lang: Option<&'a str>,
    pub code: &'a str,
}

/// Parse a fenced piece (with fences). A first line without spaces, shorter than
/// 20 chars and followed by more lines is the language tag.
pub fn parse_code_block(fenced: &str) -> CodeBlock<'_> {
    let inner = fenced
        .strip_prefix("```")
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(fenced);
    let (lang, body) = match inner.split_once('\n') {
        Some((first, rest))
            if !first.contains(' ') && first.chars().count() < MAX_LANG_TAG_CHARS =>
        {
            let tag = first.trim();
            ((!tag.is_empty()).then_some(tag), rest)
        }
        _ => (None, inner),
    };
    CodeBlock {
        lang,
        code: body.trim_matches('\n'),
    }
}

/// Inline span of a prose line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineSpan<'a> {
    Plain(&'a str),
    /// Technical term rendered with distinct styling.
    Term(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProseLine<'a> {
    Blank,
    Text(Vec<InlineSpan<'a>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedSegment<'a> {
    Prose(Vec<ProseLine<'a>>),
    Code(CodeBlock<'a>),
}

/// Split one prose line into plain and technical-term spans.
pub fn highlight_terms(line: &str) -> Vec<InlineSpan<'_>> {
    let mut spans = Vec::new();
    let mut last = 0;
    for m in tech_term().find_iter(line) {
        if m.start() > last {
            spans.push(InlineSpan::Plain(&line[last..m.start()]));
        }
        spans.push(InlineSpan::Term(m.as_str()));
        last = m.end();
    }
    if last < line.len() {
        spans.push(InlineSpan::Plain(&line[last..]));
    }
    spans
}

fn render_prose(text: &str) -> Vec<ProseLine<'_>> {
    text.split('\n')
        .map(|line| {
            if line.trim().is_empty() {
                ProseLine::Blank
            } else {
                ProseLine::Text(highlight_terms(line))
            }
        })
        .collect()
}

/// Render normalized content into display segments, skipping empty pieces.
pub fn render(content: &str) -> Vec<RenderedSegment<'_>> {
    split_segments(content)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Prose(text) => {
                let text = text.trim_matches('\n');
                (!text.trim().is_empty()).then(|| RenderedSegment::Prose(render_prose(text)))
            }
            Piece::Code(fenced) => Some(RenderedSegment::Code(parse_code_block(fenced))),
        })
        .collect()
}

/// Text for the "copy code" action: every code block (tag excluded) separated by a blank
/// line, or the whole content when there is no code block.
pub fn copy_code_text(content: &str) -> String {
    let blocks: Vec<&str> = split_segments(content)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Code(fenced) => Some(parse_code_block(fenced).code),
            Piece::Prose(_) => None,
        })
        .collect();
    if blocks.is_empty() {
        content.to_string()
    } else {
        blocks.join("\n\n")
    }
}
