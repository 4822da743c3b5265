//! Markdown to styled lines.
//!
//! Renders assistant replies for the terminal: headings and inline
//! emphasis become semantic styles, fenced code keeps its exact text,
//! and source line breaks are preserved so tables and ASCII art
//! survive untouched.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Parser, Tag, TagEnd};

use super::style::{StyledLine, StyledSpan, TextStyle};

/// Renders markdown source into styled logical lines.
///
/// Lines are unwrapped; the view wraps them to the viewport width.
pub fn markdown_lines(source: &str) -> Vec<StyledLine> {
    let mut renderer = Renderer::default();
    for event in Parser::new(source) {
        renderer.handle(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<StyledLine>,
    current: Vec<StyledSpan>,
    strong: usize,
    emphasis: usize,
    heading: Option<HeadingLevel>,
    quote_depth: usize,
    /// Ordered-list counters; `None` entries are bullet lists.
    lists: Vec<Option<u64>>,
    /// Whether the open code block is fenced, plus its accumulated text.
    code: Option<(bool, String)>,
    /// Destination URL and span index where the current link started.
    link: Option<(String, usize)>,
}

impl Renderer {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some((_, buffer)) = &mut self.code {
                    buffer.push_str(&text);
                } else {
                    self.push_span(&text, None);
                }
            }
            Event::Code(text) => self.push_span(&text, Some(TextStyle::CodeInline)),
            Event::SoftBreak => self.flush(),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.begin_block();
                self.push_span(&"─".repeat(24), Some(TextStyle::Muted));
                self.flush();
            }
            Event::Html(html) => {
                for line in html.trim_end_matches('\n').split('\n') {
                    self.push_span(line, None);
                    self.flush();
                }
            }
            Event::InlineHtml(html) => self.push_span(&html, None),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_span(marker, Some(TextStyle::ListMarker));
            }
            Event::FootnoteReference(name) => {
                self.push_span(&format!("[^{name}]"), Some(TextStyle::Muted));
            }
            Event::InlineMath(math) | Event::DisplayMath(math) => {
                self.push_span(&math, Some(TextStyle::CodeInline));
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.begin_block();
                } else {
                    self.flush();
                }
            }
            Tag::Heading { level, .. } => {
                self.begin_block();
                self.heading = Some(level);
            }
            Tag::CodeBlock(kind) => {
                self.begin_block();
                let fenced = match kind {
                    CodeBlockKind::Fenced(lang) => {
                        self.push_span(&format!("```{lang}"), Some(TextStyle::CodeFence));
                        self.flush();
                        true
                    }
                    CodeBlockKind::Indented => false,
                };
                self.code = Some((fenced, String::new()));
            }
            Tag::BlockQuote { .. } => {
                self.begin_block();
                self.quote_depth += 1;
            }
            Tag::List(start) => {
                self.flush();
                if self.lists.is_empty() {
                    self.begin_block();
                }
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                if depth > 0 {
                    self.push_span(&"  ".repeat(depth), None);
                }
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.push_span(&marker, Some(TextStyle::ListMarker));
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link = Some((dest_url.to_string(), self.current.len()));
            }
            Tag::HtmlBlock { .. } => self.begin_block(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Item | TagEnd::HtmlBlock { .. } => self.flush(),
            TagEnd::Heading(_) => {
                self.flush();
                self.heading = None;
            }
            TagEnd::CodeBlock => {
                let (fenced, buffer) = self.code.take().unwrap_or((false, String::new()));
                for line in buffer.trim_end_matches('\n').split('\n') {
                    // Pushed directly so empty code lines survive.
                    self.current
                        .push(StyledSpan::new(line, TextStyle::CodeBlock));
                    self.flush();
                }
                if fenced {
                    self.push_span("```", Some(TextStyle::CodeFence));
                    self.flush();
                }
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Link | TagEnd::Image => {
                if let Some((dest, start)) = self.link.take() {
                    let label: String = self.current[start.min(self.current.len())..]
                        .iter()
                        .map(|s| s.text.as_str())
                        .collect();
                    if label != dest && !dest.is_empty() {
                        self.current
                            .push(StyledSpan::new(format!(" ({dest})"), TextStyle::Muted));
                    }
                }
            }
            _ => {}
        }
    }

    /// Appends text to the current line with the active inline style.
    fn push_span(&mut self, text: &str, style: Option<TextStyle>) {
        if text.is_empty() {
            return;
        }
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current.push(StyledSpan::new(
                "> ".repeat(self.quote_depth),
                TextStyle::BlockQuote,
            ));
        }
        let style = style.unwrap_or_else(|| self.inline_style());
        self.current.push(StyledSpan::new(text, style));
    }

    fn inline_style(&self) -> TextStyle {
        if let Some(level) = self.heading {
            return match level {
                HeadingLevel::H1 => TextStyle::Heading1,
                HeadingLevel::H2 => TextStyle::Heading2,
                _ => TextStyle::Heading3,
            };
        }
        if self.strong > 0 {
            return TextStyle::Strong;
        }
        if self.emphasis > 0 {
            return TextStyle::Emphasis;
        }
        if self.link.is_some() {
            return TextStyle::Link;
        }
        if self.quote_depth > 0 {
            return TextStyle::BlockQuote;
        }
        TextStyle::Plain
    }

    /// Ends the current line, if it has any content.
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.current);
        self.lines.push(StyledLine { spans });
    }

    /// Separates a new block element from the previous one.
    fn begin_block(&mut self) {
        self.flush();
        if self
            .lines
            .last()
            .is_some_and(|line| !line.is_empty())
        {
            self.lines.push(StyledLine::empty());
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.flush();
        self.lines
    }
}
