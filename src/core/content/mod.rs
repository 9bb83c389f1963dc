//! Relay reply pipeline: extraction, normalization, content detection, segmented rendering.

mod detect;
mod extract;
mod normalize;
mod render;

pub use detect::{ContentFlags, detect};
pub use extract::{EMPTY_RESPONSE, ExtractedReply, NO_CONTENT, extract_content, extract_reply};
pub use normalize::normalize;
pub use render::{
    CodeBlock, InlineSpan, Piece, ProseLine, RenderedSegment, copy_code_text, highlight_terms,
    parse_code_block, render, split_segments,
};

/// A message body prepared for display: normalized text and its advisory flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedContent {
    pub text: String,
    pub flags: ContentFlags,
}

impl PreparedContent {
    pub fn new(raw: &str) -> Self {
        let text = normalize(raw);
        let flags = detect(&text);
        Self { text, flags }
    }

    pub fn segments(&self) -> Vec<RenderedSegment<'_>> {
        render(&self.text)
    }

    pub fn copy_text(&self) -> String {
        copy_code_text(&self.text)
    }
}

#[cfg(test)]
mod tests;
