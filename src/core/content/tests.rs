use serde_json::json;

use super::{
    CodeBlock, ContentFlags, InlineSpan, Piece, PreparedContent, ProseLine, RenderedSegment,
    copy_code_text, extract_content, extract_reply, highlight_terms, parse_code_block, render,
    split_segments,
};
use crate::core::relay::RelayResponse;

#[test]
fn split_keeps_fences_and_empty_prose() {
    let pieces = split_segments("```a```");
    assert_eq!(
        pieces,
        vec![Piece::Prose(""), Piece::Code("```a```"), Piece::Prose("")]
    );
}

#[test]
fn split_unclosed_fence_stays_prose() {
    let pieces = split_segments("before ```rust\nfn main() {");
    assert_eq!(pieces, vec![Piece::Prose("before ```rust\nfn main() {")]);
}

#[test]
fn split_preserves_order() {
    let pieces = split_segments("one\n```\nx\n```\ntwo\n```\ny\n```");
    assert_eq!(pieces.len(), 5);
    assert!(matches!(pieces[0], Piece::Prose("one\n")));
    assert!(matches!(pieces[1], Piece::Code(c) if c.contains('x')));
    assert!(matches!(pieces[2], Piece::Prose("\ntwo\n")));
    assert!(matches!(pieces[3], Piece::Code(c) if c.contains('y')));
    assert!(matches!(pieces[4], Piece::Prose("")));
}

#[test]
fn code_block_with_language_tag() {
    let segments = render("```python\nprint(1)\n```");
    assert_eq!(
        segments,
        vec![RenderedSegment::Code(CodeBlock {
            lang: Some("python"),
            code: "print(1)",
        })]
    );
}

#[test]
fn code_block_first_line_with_spaces_is_code() {
    let block = parse_code_block("```let x = 1;\nlet y = 2;\n```");
    assert_eq!(block.lang, None);
    assert_eq!(block.code, "let x = 1;\nlet y = 2;");
}

#[test]
fn code_block_long_first_line_is_code() {
    let block = parse_code_block("```averyveryverylongidentifier\nnext\n```");
    assert_eq!(block.lang, None);
    assert!(block.code.starts_with("averyveryverylongidentifier"));
}

#[test]
fn single_line_block_has_no_tag() {
    let block = parse_code_block("```a```");
    assert_eq!(block, CodeBlock { lang: None, code: "a" });
}

#[test]
fn copy_code_joins_blocks_with_blank_line() {
    assert_eq!(copy_code_text("```\na\n```\ntext\n```\nb\n```"), "a\n\nb");
    assert_eq!(copy_code_text("```a``` and ```b```"), "a\n\nb");
}

#[test]
fn copy_code_excludes_language_tags() {
    assert_eq!(
        copy_code_text("```sql\nSELECT 1;\n```\n```js\nf();\n```"),
        "SELECT 1;\n\nf();"
    );
}

#[test]
fn copy_code_falls_back_to_full_content() {
    assert_eq!(copy_code_text("no code here"), "no code here");
}

#[test]
fn prose_lines_keep_blank_lines() {
    let segments = render("first\n\nsecond");
    let RenderedSegment::Prose(lines) = &segments[0] else {
        panic!("expected prose");
    };
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[1], ProseLine::Blank);
}

#[test]
fn terms_are_split_out_of_prose() {
    let spans = highlight_terms("Call the API with JSON");
    assert_eq!(
        spans,
        vec![
            InlineSpan::Plain("Call the "),
            InlineSpan::Term("API"),
            InlineSpan::Plain(" with "),
            InlineSpan::Term("JSON"),
        ]
    );
    assert_eq!(
        highlight_terms("wrap it in <div>"),
        vec![InlineSpan::Plain("wrap it in "), InlineSpan::Term("<div>")]
    );
    assert_eq!(highlight_terms("apiary"), vec![InlineSpan::Plain("apiary")]);
}

#[test]
fn prose_around_code_is_trimmed_and_empty_pieces_skipped() {
    let segments = render("Intro:\n```\ncode\n```\n");
    assert_eq!(segments.len(), 2);
    assert!(matches!(&segments[0], RenderedSegment::Prose(lines) if lines.len() == 1));
    assert!(matches!(&segments[1], RenderedSegment::Code(b) if b.code == "code"));
}

#[test]
fn end_to_end_object_reply() {
    let response = RelayResponse::from_value(json!({"success": true, "message": "Hello"}));
    let content = extract_content(&response);
    assert_eq!(content, "Hello");
    let prepared = PreparedContent::new(&content);
    assert_eq!(prepared.flags, ContentFlags::default());
    assert_eq!(
        prepared.segments(),
        vec![RenderedSegment::Prose(vec![ProseLine::Text(vec![
            InlineSpan::Plain("Hello")
        ])])]
    );
}

#[test]
fn end_to_end_unprocessed_list_reply() {
    let response = RelayResponse::from_value(json!([{"shouldProcess": false, "response": "wait"}]));
    let reply = extract_reply(&response);
    assert_eq!(reply.content, "wait");
    assert!(!reply.counts_against_quota);
}

#[test]
fn end_to_end_escaped_code_reply() {
    let body = r#"{"output": "Here you go:\\n```python\\nprint(1)\\n```"}"#;
    let content = extract_content(&RelayResponse::from_body(body));
    let prepared = PreparedContent::new(&content);
    assert!(prepared.flags.has_code_blocks);
    assert_eq!(prepared.copy_text(), "print(1)");
}

#[test]
fn prepared_content_is_stable_under_renormalization() {
    let raw = "“Quoted” ### text\\n\\n\\n\\n```\\nx\\n```";
    let once = PreparedContent::new(raw);
    let twice = PreparedContent::new(&once.text);
    assert_eq!(once, twice);
}
