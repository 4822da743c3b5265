//! Markdown and code-block detection over streaming message text.
//!
//! An assistant reply arrives as an append-only buffer that grows one delta
//! at a time. These functions take a snapshot of that buffer and answer three
//! questions the UI asks on every update:
//!
//! - does the text look like markdown at all? ([`contains_markdown`])
//! - which closed fenced block is the "main artifact"? ([`extract_longest_code_block`])
//! - is a fence currently open and worth showing live? ([`detect_in_progress_code_block`])
//!
//! All three are pure functions over the snapshot: malformed input yields
//! no match rather than an error. Spans are byte offsets into the snapshot
//! that produced them and go stale the moment the buffer grows, so callers
//! re-run the detection on each delta instead of caching results.

use std::sync::OnceLock;

use regex::Regex;

/// Minimum newline count before an unterminated fence is reported.
///
/// Below this the side panel would open for a fence with almost nothing in
/// it and flicker shut again; five lines is enough content to be worth a
/// dedicated view. Callers probing for any open fence pass `0`.
pub const IN_PROGRESS_MIN_LINES: usize = 5;

/// Half-open byte range `[start, end)` into a specific buffer snapshot.
///
/// Offsets are only meaningful against the exact string that produced them.
/// During streaming the buffer is append-only, so `start` keeps pointing at
/// the same fence marker, but `end` must be re-derived from the current
/// buffer length on every call rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the spanned region in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A located fenced code block, delimiters included.
///
/// `text` borrows from the searched buffer; `line_count` is the number of
/// `\n` characters inside the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeBlockMatch<'a> {
    pub text: &'a str,
    pub span: TextSpan,
    pub line_count: usize,
}

/// Heuristic patterns for markdown presence, tried independently.
///
/// Deliberately loose: they gate display handling, not parsing, so a false
/// positive costs a styled render while a false negative costs rich output.
fn markdown_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?m)^#+\s+.+$",        // ATX header
            r"\*\*.+\*\*",           // bold
            r"\*.+\*",               // italic
            r"(?m)^>\s+.+$",         // blockquote
            r"(?m)^```[\s\S]*?```$", // fenced code block
            r"(?m)^\s*[-*+]\s+.+$",  // unordered list item
            r"(?m)^\s*\d+\.\s+.+$",  // ordered list item
            r"\[.+\]\(.+\)",         // link
            r"!\[.+\]\(.+\)",        // image
            r"(?m)^[\s-]{3,}$",      // horizontal rule
        ]
        .iter()
        .map(|pattern| Regex::new(pattern).expect("markdown pattern compiles"))
        .collect()
    })
}

/// Matches every closed fence pair, shortest-match, newlines included.
fn code_block_regex() -> &'static Regex {
    static CODE_BLOCK: OnceLock<Regex> = OnceLock::new();
    CODE_BLOCK.get_or_init(|| Regex::new(r"```[\s\S]*?```").expect("code block pattern compiles"))
}

/// Returns true if the text matches any markdown heuristic.
///
/// Used to decide whether a completed assistant message gets rich rendering
/// and whether it is worth looking for a code block to hand to the canvas.
/// Empty input is never markdown.
pub fn contains_markdown(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    markdown_patterns().iter().any(|p| p.is_match(text))
}

/// Finds the longest closed fenced block in the text.
///
/// Scans left to right for non-overlapping ``` ... ``` pairs and picks the
/// one with the greatest character length; on ties the earliest match wins
/// (strictly-greater comparison). A reply often carries several snippets
/// next to one dominant solution, and length is a better proxy for "the
/// answer" than position.
///
/// Unterminated fences are not closed blocks and are never matched here;
/// they are [`detect_in_progress_code_block`]'s concern.
pub fn extract_longest_code_block(text: &str) -> Option<CodeBlockMatch<'_>> {
    let mut longest: Option<CodeBlockMatch<'_>> = None;

    for m in code_block_regex().find_iter(text) {
        let candidate = CodeBlockMatch {
            text: m.as_str(),
            span: TextSpan::new(m.start(), m.end()),
            line_count: m.as_str().matches('\n').count(),
        };
        match longest {
            Some(best) if candidate.text.len() <= best.text.len() => {}
            _ => longest = Some(candidate),
        }
    }

    longest
}

/// Detects a fence that has been opened but not yet closed.
///
/// Looks at the last ``` in the text. It opens an in-progress block only if
/// every earlier fence is paired off, i.e. an even number of markers precede
/// it; a trailing marker with an odd count is the closer of a finished pair
/// and belongs to [`extract_longest_code_block`]. The block runs from the
/// marker to the end of the buffer and is only reported once it spans at
/// least `min_lines` newlines.
///
/// The marker is honored wherever it appears, line start or not; tightening
/// that would change behavior on mid-line backtick runs, so the loose
/// anchor is kept.
///
/// Streaming contract: the result's `span.end` is the current buffer
/// length, recomputed on every call. Callers must re-invoke per delta and
/// treat any previously returned span as stale.
pub fn detect_in_progress_code_block(text: &str, min_lines: usize) -> Option<CodeBlockMatch<'_>> {
    let last_open = text.rfind("```")?;

    // An odd number of fences before the last marker means it closes a
    // completed block rather than opening a new one.
    if text[..last_open].matches("```").count() % 2 == 1 {
        return None;
    }

    let tail = &text[last_open..];
    let line_count = tail.matches('\n').count();
    if line_count < min_lines {
        return None;
    }

    Some(CodeBlockMatch {
        text: tail,
        span: TextSpan::new(last_open, text.len()),
        line_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // contains_markdown
    // ========================================================================

    #[test]
    fn test_contains_markdown_empty() {
        assert!(!contains_markdown(""), "empty text is never markdown");
    }

    #[test]
    fn test_contains_markdown_plain_text() {
        assert!(!contains_markdown("plain sentence."));
        assert!(!contains_markdown("two plain\nlines of text"));
    }

    #[test]
    fn test_contains_markdown_header() {
        assert!(contains_markdown("# Title"));
        assert!(contains_markdown("intro\n## Section\nbody"));
        assert!(!contains_markdown("#hashtag"), "header needs whitespace after #");
    }

    #[test]
    fn test_contains_markdown_emphasis() {
        assert!(contains_markdown("some **bold** words"));
        assert!(contains_markdown("an *italic* word"));
    }

    #[test]
    fn test_contains_markdown_blockquote() {
        assert!(contains_markdown("> quoted line"));
        assert!(!contains_markdown(">no space"));
    }

    #[test]
    fn test_contains_markdown_fenced_block() {
        assert!(contains_markdown("```\ncode\n```"));
        assert!(contains_markdown("text\n```rust\nfn main() {}\n```\nmore"));
    }

    #[test]
    fn test_contains_markdown_lists() {
        assert!(contains_markdown("- item"));
        assert!(contains_markdown("  * nested item"));
        assert!(contains_markdown("+ plus item"));
        assert!(contains_markdown("1. first"));
        assert!(contains_markdown("  12. twelfth"));
    }

    #[test]
    fn test_contains_markdown_links_and_images() {
        assert!(contains_markdown("see [docs](https://example.com)"));
        assert!(contains_markdown("![alt](img.png)"));
    }

    #[test]
    fn test_contains_markdown_horizontal_rule() {
        assert!(contains_markdown("above\n---\nbelow"));
        assert!(!contains_markdown("a -- b"), "dashes inside a line are not a rule");
    }

    // ========================================================================
    // extract_longest_code_block
    // ========================================================================

    #[test]
    fn test_extract_no_backticks() {
        assert_eq!(extract_longest_code_block(""), None);
        assert_eq!(extract_longest_code_block("no code here"), None);
    }

    #[test]
    fn test_extract_unterminated_fence_is_not_matched() {
        assert_eq!(
            extract_longest_code_block("```js\nstill streaming"),
            None,
            "an open fence is not a closed block"
        );
    }

    #[test]
    fn test_extract_single_block() {
        let text = "before\n```rust\nfn main() {}\n```\nafter";
        let m = extract_longest_code_block(text).expect("block found");
        assert_eq!(m.text, "```rust\nfn main() {}\n```");
        assert_eq!(m.span, TextSpan::new(7, 31));
        assert_eq!(m.line_count, 2);
    }

    #[test]
    fn test_extract_span_slices_back_to_text() {
        let text = "x\n```py\na = 1\n```\ny";
        let m = extract_longest_code_block(text).expect("block found");
        assert_eq!(&text[m.span.start..m.span.end], m.text);
        assert!(m.text.starts_with("```"));
        assert!(m.text.ends_with("```"));
    }

    #[test]
    fn test_extract_picks_longest_of_several() {
        let text = "a\n```js\nx\n```\nb\n```py\ny\nz\nw\n```\nc";
        let m = extract_longest_code_block(text).expect("block found");
        assert!(m.text.starts_with("```py"), "longer python block wins");
        assert_eq!(m.line_count, 4);
    }

    #[test]
    fn test_extract_tie_keeps_earliest() {
        // Two blocks of identical length; the first one must win.
        let text = "```\naaa\n```\nmid\n```\nbbb\n```";
        let m = extract_longest_code_block(text).expect("block found");
        assert_eq!(m.span.start, 0, "equal lengths keep the first match");
        assert_eq!(m.text, "```\naaa\n```");
    }

    #[test]
    fn test_extract_is_idempotent() {
        let text = "```\none\n```\n\n```\nlonger block\n```";
        let first = extract_longest_code_block(text);
        let second = extract_longest_code_block(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_extract_adjacent_fences_pair_left_to_right() {
        // Non-overlapping shortest matches: 1st+2nd pair up, 3rd+4th pair up.
        let text = "```a```\n```bb```";
        let m = extract_longest_code_block(text).expect("block found");
        assert_eq!(m.text, "```bb```");
        assert_eq!(m.line_count, 0);
    }

    // ========================================================================
    // detect_in_progress_code_block
    // ========================================================================

    #[test]
    fn test_in_progress_empty_and_plain() {
        assert_eq!(detect_in_progress_code_block("", 0), None);
        assert_eq!(detect_in_progress_code_block("no fences", 0), None);
    }

    #[test]
    fn test_in_progress_closed_fence_not_reported() {
        assert_eq!(
            detect_in_progress_code_block("```js\nx\n```", 0),
            None,
            "a closed block is never in progress"
        );
    }

    #[test]
    fn test_in_progress_at_threshold() {
        let text = "```js\nline1\nline2\nline3\nline4\nline5";
        let m = detect_in_progress_code_block(text, 5).expect("reported at threshold");
        assert_eq!(m.text, text, "block runs from the fence to the end");
        assert_eq!(m.line_count, 5);
        assert_eq!(m.span, TextSpan::new(0, text.len()));
    }

    #[test]
    fn test_in_progress_below_threshold() {
        let text = "```js\nline1\nline2\nline3";
        assert_eq!(
            detect_in_progress_code_block(text, 5),
            None,
            "three newlines is below a five-line threshold"
        );
        let m = detect_in_progress_code_block(text, 0).expect("zero threshold reports it");
        assert_eq!(m.line_count, 3);
    }

    #[test]
    fn test_in_progress_after_earlier_closed_blocks() {
        // Closed pairs are skipped; only the trailing open fence counts.
        let text = "```\ndone\n```\ntext\n```py\na\nb\nc\nd\ne";
        let m = detect_in_progress_code_block(text, 5).expect("trailing fence reported");
        assert!(m.text.starts_with("```py"));
        assert_eq!(m.span.start, text.rfind("```py").unwrap());
        assert_eq!(m.span.end, text.len());
    }

    #[test]
    fn test_in_progress_bare_fence_only() {
        // Just the opening marker: zero newlines, reported only at threshold 0.
        let m = detect_in_progress_code_block("```", 0).expect("bare fence is open");
        assert_eq!(m.text, "```");
        assert_eq!(m.line_count, 0);
        assert_eq!(detect_in_progress_code_block("```", 1), None);
    }

    #[test]
    fn test_in_progress_growing_buffer_end_tracks_length() {
        // Append one chunk at a time; the span end must equal the current
        // buffer length on every call, never a cached earlier value.
        let mut buffer = String::from("```rust");
        for chunk in ["\nfn main()", " {\n", "    let x = 1;\n", "}\n"] {
            buffer.push_str(chunk);
            let m = detect_in_progress_code_block(&buffer, 0).expect("fence still open");
            assert_eq!(m.span.end, buffer.len());
            assert_eq!(m.span.start, 0);
            assert_eq!(m.text, buffer.as_str());
        }
    }

    #[test]
    fn test_in_progress_transitions_to_extraction_when_closed() {
        // While open, only in-progress detection reports it; after the
        // closing fence arrives, only extraction does.
        let mut buffer = String::from("```py\na\nb\nc\nd\ne\n");
        assert!(detect_in_progress_code_block(&buffer, 5).is_some());
        assert_eq!(extract_longest_code_block(&buffer), None);

        buffer.push_str("```");
        assert_eq!(detect_in_progress_code_block(&buffer, 0), None);
        let m = extract_longest_code_block(&buffer).expect("closed block extracted");
        assert_eq!(m.text, buffer.as_str());
    }

    #[test]
    fn test_in_progress_mid_line_marker_is_honored() {
        // The last ``` need not sit at a line start; the loose anchor is
        // part of the contract.
        let text = "inline ```py\na\nb\nc\nd\ne";
        let m = detect_in_progress_code_block(text, 5).expect("mid-line fence reported");
        assert_eq!(m.span.start, 7);
        assert_eq!(m.span.end, text.len());
    }

    #[test]
    fn test_span_len_helpers() {
        let span = TextSpan::new(3, 10);
        assert_eq!(span.len(), 7);
        assert!(!span.is_empty());
        assert!(TextSpan::new(4, 4).is_empty());
    }
}
