//! Rendering laid-out documents to PDF
//!
//! [`TypstPdfRenderer`] converts a [`Document`] into Typst markup in which
//! every line and image is absolutely placed, compiles it against an
//! in-memory world and exports the result with `typst-pdf`.

use super::layout::{Document, Element, ImageBlock, TextBlock};
use crate::config::ExportConfig;
use crate::domain::{KeepsakeError, Result};
use chrono::Datelike;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};

/// Describes an output format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// Turns a laid-out document into file bytes
pub trait DocumentRenderer: Send + Sync {
    fn format_info(&self) -> FormatInfo;

    /// Renders every page of `document`
    ///
    /// # Errors
    ///
    /// Returns [`KeepsakeError::Render`] when the document cannot be produced
    fn render(&self, document: &Document) -> Result<Vec<u8>>;
}

/// PDF renderer backed by Typst
#[derive(Clone)]
pub struct TypstPdfRenderer {
    font_book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    font_family: Option<String>,
}

impl TypstPdfRenderer {
    /// Creates a renderer with the fonts bundled by `typst-assets`
    pub fn new() -> Self {
        let fonts: Vec<Font> = typst_assets::fonts()
            .filter_map(|data| Font::new(Bytes::new(data), 0))
            .collect();
        Self::from_fonts(fonts, None)
    }

    /// Creates a renderer from the export settings
    ///
    /// Registers `font_path` (all faces of the file) in front of the bundled
    /// fonts and selects `font_family` when set.
    pub fn from_config(config: &ExportConfig) -> Result<Self> {
        let mut fonts = match &config.font_path {
            Some(path) => load_font_file(Path::new(path))?,
            None => Vec::new(),
        };
        fonts.extend(
            typst_assets::fonts().filter_map(|data| Font::new(Bytes::new(data), 0)),
        );
        Ok(Self::from_fonts(fonts, config.font_family.clone()))
    }

    fn from_fonts(fonts: Vec<Font>, font_family: Option<String>) -> Self {
        let mut font_book = FontBook::new();
        for font in &fonts {
            font_book.push(font.info().clone());
        }
        Self {
            font_book: LazyHash::new(font_book),
            fonts,
            font_family,
        }
    }

    /// Number of registered font faces
    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }
}

impl Default for TypstPdfRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentRenderer for TypstPdfRenderer {
    fn format_info(&self) -> FormatInfo {
        FormatInfo {
            id: "pdf",
            name: "PDF Document",
            extension: "pdf",
            mime_type: "application/pdf",
        }
    }

    fn render(&self, document: &Document) -> Result<Vec<u8>> {
        let (markup, assets) = to_typst_markup(document, self.font_family.as_deref());
        tracing::debug!(
            pages = document.page_count(),
            images = assets.len(),
            markup_len = markup.len(),
            "Compiling document"
        );

        let world = ExportWorld::new(markup, self.font_book.clone(), self.fonts.clone(), assets);

        let warned = typst::compile::<PagedDocument>(&world);
        for warning in &warned.warnings {
            tracing::debug!(message = %warning.message, "Typst warning");
        }
        let compiled = warned.output.map_err(|errors| {
            let message = errors
                .iter()
                .map(|e| e.message.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            KeepsakeError::Render(format!("Typst compilation failed: {message}"))
        })?;

        typst_pdf::pdf(&compiled, &typst_pdf::PdfOptions::default()).map_err(|errors| {
            let message = errors
                .iter()
                .map(|e| e.message.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            KeepsakeError::Render(format!("PDF generation failed: {message}"))
        })
    }
}

fn load_font_file(path: &Path) -> Result<Vec<Font>> {
    let data = std::fs::read(path).map_err(|e| {
        KeepsakeError::Configuration(format!("Failed to read font {}: {e}", path.display()))
    })?;
    let fonts: Vec<Font> = Font::iter(Bytes::new(data)).collect();
    if fonts.is_empty() {
        return Err(KeepsakeError::Configuration(format!(
            "No usable font faces in {}",
            path.display()
        )));
    }
    tracing::debug!(path = %path.display(), faces = fonts.len(), "Loaded font file");
    Ok(fonts)
}

/// Virtual path of the `index`-th embedded image
fn asset_path(index: usize) -> String {
    format!("/assets/img-{index}.png")
}

/// Builds the Typst source and the image files it references
pub fn to_typst_markup(document: &Document, font_family: Option<&str>) -> (String, Vec<(String, Bytes)>) {
    let mut out = String::new();
    let mut assets = Vec::new();

    let _ = writeln!(
        out,
        "#set page(width: {:.2}mm, height: {:.2}mm, margin: 0mm)",
        document.width_mm, document.height_mm
    );
    match font_family {
        Some(family) => {
            let _ = writeln!(
                out,
                "#set text(font: (\"{}\", \"Libertinus Serif\"))",
                escape_string(family)
            );
        }
        None => out.push_str("#set text(font: \"Libertinus Serif\")\n"),
    }

    for (page_index, page) in document.pages.iter().enumerate() {
        if page_index > 0 {
            out.push_str("#pagebreak()\n");
        }
        for element in &page.elements {
            match element {
                Element::Text(block) => write_text(&mut out, block),
                Element::Image(block) => {
                    let path = asset_path(assets.len());
                    write_image(&mut out, block, &path);
                    assets.push((path, Bytes::new(block.image.png.clone())));
                }
            }
        }
    }

    (out, assets)
}

fn write_text(out: &mut String, block: &TextBlock) {
    for (n, line) in block.lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let dy = block.y_mm + n as f64 * block.line_height_mm;
        let _ = writeln!(
            out,
            "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, text(size: {}pt, \"{}\"))",
            block.x_mm,
            dy,
            block.font_pt,
            escape_string(line)
        );
    }
}

fn write_image(out: &mut String, block: &ImageBlock, path: &str) {
    let _ = writeln!(
        out,
        "#place(top + left, dx: {:.2}mm, dy: {:.2}mm, image(\"{}\", width: {:.2}mm, height: {:.2}mm))",
        block.x_mm, block.y_mm, path, block.width_mm, block.height_mm
    );
}

/// Escapes text for a Typst string literal
fn escape_string(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            c if c.is_control() => escaped.push(' '),
            c => escaped.push(c),
        }
    }
    escaped
}

/// In-memory Typst world holding one source file and the embedded images
struct ExportWorld {
    main_id: FileId,
    main: Source,
    library: LazyHash<Library>,
    font_book: LazyHash<FontBook>,
    fonts: Vec<Font>,
    files: HashMap<FileId, Bytes>,
}

impl ExportWorld {
    fn new(
        markup: String,
        font_book: LazyHash<FontBook>,
        fonts: Vec<Font>,
        assets: Vec<(String, Bytes)>,
    ) -> Self {
        let main_id = FileId::new(None, VirtualPath::new("/main.typ"));
        let files = assets
            .into_iter()
            .map(|(path, bytes)| (FileId::new(None, VirtualPath::new(&path)), bytes))
            .collect();

        Self {
            main_id,
            main: Source::new(main_id, markup),
            library: LazyHash::new(Library::builder().build()),
            font_book,
            fonts,
            files,
        }
    }
}

impl World for ExportWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.font_book
    }

    fn main(&self) -> FileId {
        self.main_id
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main_id {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.files
            .get(&id)
            .cloned()
            .ok_or_else(|| FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = chrono::Local::now();
        Datetime::from_ymd(now.year(), now.month() as u8, now.day() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::images::EmbeddedImage;
    use crate::config::LayoutConfig;
    use crate::core::export::layout::{BlockKind, PageLayout};

    fn tiny_png() -> EmbeddedImage {
        let img = image::RgbImage::from_pixel(4, 2, image::Rgb([10, 20, 30]));
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        EmbeddedImage {
            png,
            width_px: 4,
            height_px: 2,
        }
    }

    fn sample_document() -> Document {
        let mut layout = PageLayout::new(LayoutConfig::default());
        layout.push_text(BlockKind::Header, "For: Mother");
        layout.push_text(BlockKind::Question, "Question: Say \"hi\" \\ #now");
        layout.push_text(BlockKind::Answer, "Answer: Привет");
        layout.push_image(tiny_png());
        layout.end_response();
        layout.finish()
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string(r#"a "b" \c"#), r#"a \"b\" \\c"#);
        assert_eq!(escape_string("tab\there"), "tab here");
        assert_eq!(escape_string("#set [x] $y$"), "#set [x] $y$");
    }

    #[test]
    fn test_markup_places_lines_and_images() {
        let (markup, assets) = to_typst_markup(&sample_document(), None);

        assert!(markup.starts_with("#set page(width: 210.00mm, height: 297.00mm, margin: 0mm)"));
        assert!(markup.contains(
            "#place(top + left, dx: 10.00mm, dy: 10.00mm, text(size: 12pt, \"For: Mother\"))"
        ));
        assert!(markup.contains(r#"\"hi\" \\ #now"#));
        assert!(markup.contains("image(\"/assets/img-0.png\", width: 90.00mm, height: 45.00mm)"));
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].0, "/assets/img-0.png");
        assert!(!markup.contains("#pagebreak()"));
    }

    #[test]
    fn test_markup_font_family() {
        let (markup, _) = to_typst_markup(&sample_document(), Some("Roboto"));
        assert!(markup.contains("#set text(font: (\"Roboto\", \"Libertinus Serif\"))"));
    }

    #[test]
    fn test_render_produces_pdf() {
        let renderer = TypstPdfRenderer::new();
        assert!(renderer.font_count() > 0);

        let bytes = renderer.render(&sample_document()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_missing_font_file_is_configuration_error() {
        let config = ExportConfig {
            font_path: Some("/nonexistent/font.ttf".to_string()),
            ..ExportConfig::default()
        };
        let err = TypstPdfRenderer::from_config(&config).err().unwrap();
        assert!(matches!(err, KeepsakeError::Configuration(_)));
    }

    #[test]
    fn test_format_info() {
        let info = TypstPdfRenderer::new().format_info();
        assert_eq!(info.extension, "pdf");
        assert_eq!(info.mime_type, "application/pdf");
    }
}
