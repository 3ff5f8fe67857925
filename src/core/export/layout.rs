//! Page layout of exported documents
//!
//! Layout is computed here, not by the renderer: every wrapped line and image
//! gets an absolute position in millimetres from the page's top-left corner.
//! A running cursor moves down the page; a block that would cross the bottom
//! bound starts a new page.

use crate::adapters::images::EmbeddedImage;
use crate::config::LayoutConfig;

/// Millimetres per typographic point
pub const MM_PER_PT: f64 = 0.3528;

const EPSILON: f64 = 1e-9;

/// Kind of text block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Response header naming its recipient
    Header,
    Question,
    Answer,
}

/// Wrapped text placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub x_mm: f64,
    /// Top of the first line
    pub y_mm: f64,
    pub font_pt: f64,
    pub line_height_mm: f64,
    pub lines: Vec<String>,
    /// Continuation of a block that started on a previous page
    pub continued: bool,
}

impl TextBlock {
    pub fn height_mm(&self) -> f64 {
        self.lines.len() as f64 * self.line_height_mm
    }

    /// The lines joined back with single spaces
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// Image placed on a page
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub x_mm: f64,
    pub y_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub image: EmbeddedImage,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Text(TextBlock),
    Image(ImageBlock),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// A fully laid-out document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub width_mm: f64,
    pub height_mm: f64,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text blocks in document order
    pub fn text_blocks(&self) -> impl Iterator<Item = &TextBlock> {
        self.pages.iter().flat_map(|p| &p.elements).filter_map(|e| match e {
            Element::Text(block) => Some(block),
            Element::Image(_) => None,
        })
    }

    /// Images in document order
    pub fn images(&self) -> impl Iterator<Item = &ImageBlock> {
        self.pages.iter().flat_map(|p| &p.elements).filter_map(|e| match e {
            Element::Image(block) => Some(block),
            Element::Text(_) => None,
        })
    }

    /// Number of text blocks of `kind`, counting a block split across pages once
    pub fn count_blocks(&self, kind: BlockKind) -> usize {
        self.text_blocks()
            .filter(|b| b.kind == kind && !b.continued)
            .count()
    }

    /// Whether any text block contains `needle`
    pub fn contains_text(&self, needle: &str) -> bool {
        self.text_blocks().any(|b| b.text().contains(needle))
    }
}

/// Cursor-driven page builder
#[derive(Debug)]
pub struct PageLayout {
    config: LayoutConfig,
    pages: Vec<Page>,
    y: f64,
}

impl PageLayout {
    pub fn new(config: LayoutConfig) -> Self {
        let y = config.margin_mm;
        Self {
            config,
            pages: vec![Page::default()],
            y,
        }
    }

    /// Current vertical cursor in millimetres
    pub fn cursor_mm(&self) -> f64 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Wraps and places a text block
    ///
    /// A block that cannot fit even on an empty page is continued on the
    /// following pages.
    pub fn push_text(&mut self, kind: BlockKind, text: &str) {
        let (font_pt, line_height) = self.metrics(kind);
        let mut lines = wrap_text(
            text,
            self.config.content_width_mm,
            font_pt,
            self.config.char_width_factor,
        );

        self.ensure_room(lines.len() as f64 * line_height);

        let mut continued = false;
        loop {
            let fit = self.lines_that_fit(line_height).max(1);
            if fit >= lines.len() {
                let height = lines.len() as f64 * line_height;
                self.place_text(kind, font_pt, line_height, lines, continued);
                self.y += height + self.config.block_gap_mm;
                break;
            }
            let rest = lines.split_off(fit);
            self.place_text(kind, font_pt, line_height, lines, continued);
            self.new_page();
            lines = rest;
            continued = true;
        }
    }

    /// Places an image at the configured width, keeping its aspect ratio
    ///
    /// Images taller than a page are scaled down to the page's content height.
    pub fn push_image(&mut self, image: EmbeddedImage) {
        let mut width = self.config.image_width_mm;
        let mut height = image.height_for_width(width);
        let max_height = self.config.content_bottom_mm - self.config.margin_mm;
        if height > max_height {
            width *= max_height / height;
            height = max_height;
        }

        self.ensure_room(height);

        let block = ImageBlock {
            x_mm: self.config.margin_mm,
            y_mm: self.y,
            width_mm: width,
            height_mm: height,
            image,
        };
        self.current_page().elements.push(Element::Image(block));
        self.y += height + self.config.image_gap_mm;
    }

    /// Closes a response: trailing gap, then a page break near the bottom
    pub fn end_response(&mut self) {
        self.y += self.config.response_gap_mm;
        if self.y > self.config.response_break_mm {
            self.new_page();
        }
    }

    /// Finishes layout, dropping trailing empty pages
    pub fn finish(mut self) -> Document {
        while self.pages.len() > 1 && self.pages.last().is_some_and(Page::is_empty) {
            self.pages.pop();
        }
        Document {
            width_mm: self.config.page_width_mm,
            height_mm: self.config.page_height_mm,
            pages: self.pages,
        }
    }

    fn metrics(&self, kind: BlockKind) -> (f64, f64) {
        match kind {
            BlockKind::Header => (self.config.header_font_pt, self.config.header_line_mm),
            BlockKind::Question | BlockKind::Answer => {
                (self.config.body_font_pt, self.config.body_line_mm)
            }
        }
    }

    fn ensure_room(&mut self, height: f64) {
        let on_empty_page = self.pages.last().map_or(true, Page::is_empty);
        if self.y + height > self.config.content_bottom_mm + EPSILON && !on_empty_page {
            self.new_page();
        }
    }

    fn lines_that_fit(&self, line_height: f64) -> usize {
        let room = self.config.content_bottom_mm - self.y;
        if room <= 0.0 {
            return 0;
        }
        (room / line_height + EPSILON).floor() as usize
    }

    fn place_text(
        &mut self,
        kind: BlockKind,
        font_pt: f64,
        line_height: f64,
        lines: Vec<String>,
        continued: bool,
    ) {
        let block = TextBlock {
            kind,
            x_mm: self.config.margin_mm,
            y_mm: self.y,
            font_pt,
            line_height_mm: line_height,
            lines,
            continued,
        };
        self.current_page().elements.push(Element::Text(block));
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.config.margin_mm;
    }

    fn current_page(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

/// Characters per line for a width and font size
pub fn max_chars_per_line(width_mm: f64, font_pt: f64, char_width_factor: f64) -> usize {
    let glyph_mm = char_width_factor * font_pt * MM_PER_PT;
    if glyph_mm <= 0.0 || !glyph_mm.is_finite() {
        return usize::MAX;
    }
    ((width_mm / glyph_mm + EPSILON).floor() as usize).max(1)
}

/// Greedy word wrap on whitespace
///
/// Explicit newlines start a new line, runs of whitespace collapse, and words
/// longer than a line are split. Always returns at least one line.
pub fn wrap_text(text: &str, width_mm: f64, font_pt: f64, char_width_factor: f64) -> Vec<String> {
    let max_chars = max_chars_per_line(width_mm, font_pt, char_width_factor);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in paragraph.split_whitespace() {
            let mut word = word;
            loop {
                let word_len = word.chars().count();
                let needed = if current_len == 0 {
                    word_len
                } else {
                    current_len + 1 + word_len
                };

                if needed <= max_chars {
                    if current_len > 0 {
                        current.push(' ');
                        current_len += 1;
                    }
                    current.push_str(word);
                    current_len += word_len;
                    break;
                }

                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                    continue;
                }

                let split_at = word
                    .char_indices()
                    .nth(max_chars)
                    .map_or(word.len(), |(idx, _)| idx);
                lines.push(word[..split_at].to_string());
                word = &word[split_at..];
                if word.is_empty() {
                    break;
                }
            }
        }

        lines.push(current);
    }

    lines
}
