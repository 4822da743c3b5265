//! Semantic text styling, independent of any terminal backend.
//!
//! Transcript content is built as `StyledLine`s carrying semantic
//! styles; the view layer maps them to concrete colors. This keeps the
//! markdown renderer testable without ratatui types.

/// Semantic style of a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Plain,
    /// De-emphasized metadata, hints, fences.
    Muted,
    Emphasis,
    Strong,
    Heading1,
    Heading2,
    Heading3,
    CodeInline,
    CodeBlock,
    /// The ``` delimiter lines of a fenced block.
    CodeFence,
    BlockQuote,
    /// List bullet or number marker.
    ListMarker,
    Link,
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: TextStyle,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::Plain)
    }
}

/// One logical line of styled text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![StyledSpan::plain(text)],
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            spans: vec![StyledSpan::new(text, style)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// Concatenated text of all spans, without styling.
    pub fn to_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}
