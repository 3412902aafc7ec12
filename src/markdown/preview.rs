//! Markdown preview rendering
//!
//! Turns raw text into a tree of [`PreviewElement`]s using pulldown-cmark,
//! with `$...$` and `$$...$$` math kept as dedicated spans. Rendering is pure:
//! the same text always yields the same tree.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// A rendered block in the preview pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewElement {
    /// A paragraph of styled spans
    Paragraph(Vec<StyledText>),
    /// A heading with level 1-6
    Heading {
        level: u8,
        content: Vec<StyledText>,
    },
    /// A fenced or indented code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    /// A blockquote
    Blockquote(Vec<PreviewElement>),
    /// A list; `start` is set for ordered lists
    List {
        start: Option<u64>,
        items: Vec<ListItem>,
    },
    /// A table
    Table {
        headers: Vec<Vec<StyledText>>,
        rows: Vec<Vec<Vec<StyledText>>>,
    },
    /// A horizontal rule
    HorizontalRule,
    /// Raw HTML block, shown verbatim
    Html(String),
}

/// A list item; `checked` is set for task list items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListItem {
    pub checked: Option<bool>,
    pub content: Vec<PreviewElement>,
}

/// How a math span is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathStyle {
    Inline,
    Display,
}

/// Styled text with formatting
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    /// Set when `text` is TeX source
    pub math: Option<MathStyle>,
    pub link: Option<String>,
}

impl StyledText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn math(tex: impl Into<String>, style: MathStyle) -> Self {
        Self {
            text: tex.into(),
            math: Some(style),
            ..Self::default()
        }
    }
}

/// Inline formatting currently in effect
#[derive(Debug, Default)]
struct InlineStyle {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    link: Option<String>,
}

impl InlineStyle {
    fn apply(&self, mut span: StyledText) -> StyledText {
        span.bold |= self.bold;
        span.italic |= self.italic;
        span.strikethrough |= self.strikethrough;
        if span.link.is_none() {
            span.link = self.link.clone();
        }
        span
    }
}

/// Block under construction
#[derive(Debug)]
enum Builder {
    Paragraph,
    Heading { level: u8 },
    Blockquote(Vec<PreviewElement>),
    CodeBlock { language: Option<String>, code: String },
    Html(String),
    List { start: Option<u64>, items: Vec<ListItem> },
    Item { checked: Option<bool>, content: Vec<PreviewElement> },
    Table {
        headers: Vec<Vec<StyledText>>,
        rows: Vec<Vec<Vec<StyledText>>>,
    },
    Row { header: bool, cells: Vec<Vec<StyledText>> },
    Cell,
    /// Blocks we don't model (footnotes, definition lists); children pass through
    Container(Vec<PreviewElement>),
}

impl Builder {
    fn from_tag(tag: Tag<'_>) -> Self {
        match tag {
            Tag::Paragraph => Builder::Paragraph,
            Tag::Heading { level, .. } => Builder::Heading { level: level as u8 },
            Tag::BlockQuote(_) => Builder::Blockquote(Vec::new()),
            Tag::CodeBlock(kind) => Builder::CodeBlock {
                language: match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                },
                code: String::new(),
            },
            Tag::HtmlBlock => Builder::Html(String::new()),
            Tag::List(start) => Builder::List {
                start,
                items: Vec::new(),
            },
            Tag::Item => Builder::Item {
                checked: None,
                content: Vec::new(),
            },
            Tag::Table(_) => Builder::Table {
                headers: Vec::new(),
                rows: Vec::new(),
            },
            Tag::TableHead => Builder::Row {
                header: true,
                cells: Vec::new(),
            },
            Tag::TableRow => Builder::Row {
                header: false,
                cells: Vec::new(),
            },
            Tag::TableCell => Builder::Cell,
            _ => Builder::Container(Vec::new()),
        }
    }
}

#[derive(Debug, Default)]
struct RenderState {
    elements: Vec<PreviewElement>,
    stack: Vec<Builder>,
    style: InlineStyle,
    buffer: Vec<StyledText>,
    image_alt_start: Option<(usize, String)>,
}

impl RenderState {
    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Emphasis => self.style.italic = true,
            Tag::Strong => self.style.bold = true,
            Tag::Strikethrough => self.style.strikethrough = true,
            Tag::Link { dest_url, .. } => self.style.link = Some(dest_url.to_string()),
            Tag::Image { dest_url, .. } => {
                self.image_alt_start = Some((self.buffer.len(), dest_url.to_string()));
            }
            block => self.open(Builder::from_tag(block)),
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Emphasis => self.style.italic = false,
            TagEnd::Strong => self.style.bold = false,
            TagEnd::Strikethrough => self.style.strikethrough = false,
            TagEnd::Link => self.style.link = None,
            TagEnd::Image => self.finish_image(),
            _ => self.close(),
        }
    }

    fn text(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(Builder::CodeBlock { code, .. }) => code.push_str(text),
            Some(Builder::Html(html)) => html.push_str(text),
            _ => self.push_span(StyledText::plain(text)),
        }
    }

    fn push_span(&mut self, span: StyledText) {
        if span.text.is_empty() {
            return;
        }
        let span = self.style.apply(span);
        self.buffer.push(span);
    }

    fn set_task(&mut self, done: bool) {
        if let Some(Builder::Item { checked, .. }) = self.stack.last_mut() {
            *checked = Some(done);
        }
    }

    fn open(&mut self, builder: Builder) {
        // Tight list items carry text without a paragraph
        if !self.buffer.is_empty() {
            if let Some(Builder::Item { content, .. }) = self.stack.last_mut() {
                content.push(PreviewElement::Paragraph(std::mem::take(&mut self.buffer)));
            }
        }
        self.stack.push(builder);
    }

    fn close(&mut self) {
        let Some(builder) = self.stack.pop() else {
            return;
        };
        let buffer = std::mem::take(&mut self.buffer);

        match builder {
            Builder::Paragraph => self.emit(PreviewElement::Paragraph(buffer)),
            Builder::Heading { level } => self.emit(PreviewElement::Heading {
                level,
                content: buffer,
            }),
            Builder::Blockquote(children) => self.emit(PreviewElement::Blockquote(children)),
            Builder::CodeBlock { language, code } => {
                self.emit(PreviewElement::CodeBlock { language, code })
            }
            Builder::Html(html) => self.emit(PreviewElement::Html(html)),
            Builder::List { start, items } => self.emit(PreviewElement::List { start, items }),
            Builder::Item {
                checked,
                mut content,
            } => {
                if !buffer.is_empty() {
                    content.push(PreviewElement::Paragraph(buffer));
                }
                if let Some(Builder::List { items, .. }) = self.stack.last_mut() {
                    items.push(ListItem { checked, content });
                }
            }
            Builder::Table { headers, rows } => {
                self.emit(PreviewElement::Table { headers, rows })
            }
            Builder::Row { header, cells } => {
                if let Some(Builder::Table { headers, rows }) = self.stack.last_mut() {
                    if header {
                        *headers = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            Builder::Cell => {
                if let Some(Builder::Row { cells, .. }) = self.stack.last_mut() {
                    cells.push(buffer);
                }
            }
            Builder::Container(children) => {
                for child in children {
                    self.emit(child);
                }
            }
        }
    }

    fn finish_image(&mut self) {
        let Some((start, url)) = self.image_alt_start.take() else {
            return;
        };
        let alt: String = self
            .buffer
            .drain(start.min(self.buffer.len())..)
            .map(|span| span.text)
            .collect();
        let mut span = StyledText::plain(format!("[image: {}]", alt));
        span.link = Some(url);
        self.push_span(span);
    }

    fn emit(&mut self, element: PreviewElement) {
        match self.stack.last_mut() {
            Some(Builder::Blockquote(children))
            | Some(Builder::Item {
                content: children, ..
            })
            | Some(Builder::Container(children)) => children.push(element),
            _ => self.elements.push(element),
        }
    }

    fn finish(mut self) -> Vec<PreviewElement> {
        while !self.stack.is_empty() {
            self.close();
        }
        self.elements
    }
}

/// Markdown preview renderer
#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    options: Options,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_MATH);

        Self { options }
    }

    /// Parse and render Markdown content to preview elements
    pub fn render(&self, markdown: &str) -> Vec<PreviewElement> {
        let mut state = RenderState::default();

        for event in Parser::new_ext(markdown, self.options) {
            match event {
                Event::Start(tag) => state.start(tag),
                Event::End(tag) => state.end(tag),
                Event::Text(text) => state.text(&text),
                Event::Code(code) => state.push_span(StyledText {
                    code: true,
                    ..StyledText::plain(code.to_string())
                }),
                Event::InlineMath(tex) => {
                    state.push_span(StyledText::math(tex.to_string(), MathStyle::Inline))
                }
                Event::DisplayMath(tex) => {
                    state.push_span(StyledText::math(tex.trim().to_string(), MathStyle::Display))
                }
                Event::Html(html) | Event::InlineHtml(html) => state.text(&html),
                Event::FootnoteReference(label) => state.text(&format!("[^{}]", label)),
                Event::SoftBreak => state.text(" "),
                Event::HardBreak => state.text("\n"),
                Event::Rule => state.emit(PreviewElement::HorizontalRule),
                Event::TaskListMarker(done) => state.set_task(done),
            }
        }

        state.finish()
    }
}

impl Default for PreviewRenderer {
    fn default() -> Self {
        Self::new()
    }
}
