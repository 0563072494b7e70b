//! Drawing surfaces for the report writer.

use super::{ReportSurface, TextStyle};
use crate::error::{ExchangeError, Result};
use printpdf::*;
use std::io::BufWriter;

const PAGE_WIDTH: f32 = 210.0; // A4 width
const PAGE_HEIGHT: f32 = 297.0; // A4 height
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_RIGHT: f32 = 190.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;

/// Report colours (RGB 0-255)
const PRIMARY: (u8, u8, u8) = (79, 70, 229);
const TEXT_DARK: (u8, u8, u8) = (31, 41, 55);
const TEXT_MUTED: (u8, u8, u8) = (107, 114, 128);

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

/// A4 PDF built with printpdf's builtin fonts. Table rows use Courier so
/// that padded columns line up.
pub struct PdfSurface {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PdfSurface {
    pub fn new(title: &str) -> Result<Self> {
        let (doc, page1, layer1) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let font = |builtin| {
            doc.add_builtin_font(builtin)
                .map_err(|e| ExchangeError::PdfRender(e.to_string()))
        };
        let regular = font(BuiltinFont::Helvetica)?;
        let bold = font(BuiltinFont::HelveticaBold)?;
        let mono = font(BuiltinFont::Courier)?;
        let mono_bold = font(BuiltinFont::CourierBold)?;
        let layer = doc.get_page(page1).get_layer(layer1);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            mono,
            mono_bold,
            y: TOP,
            pages: 1,
        })
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages + 1));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
        self.pages += 1;
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < BOTTOM {
            self.new_page();
        }
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::new());
        self.doc
            .save(&mut writer)
            .map_err(|e| ExchangeError::PdfRender(e.to_string()))?;
        writer
            .into_inner()
            .map_err(|e| ExchangeError::Io(e.into_error()))
    }
}

impl ReportSurface for PdfSurface {
    fn text(&mut self, style: TextStyle, text: &str) {
        let (size, leading, color) = match style {
            TextStyle::Title => (24.0, 11.0, PRIMARY),
            TextStyle::Subtitle => (12.0, 7.0, TEXT_MUTED),
            TextStyle::Heading => (16.0, 9.0, PRIMARY),
            TextStyle::Strong => (11.0, 6.0, TEXT_DARK),
            TextStyle::Body => (10.0, 5.5, TEXT_DARK),
            TextStyle::TableHeader | TextStyle::TableRow => (8.0, 4.5, TEXT_DARK),
            TextStyle::Small => (8.0, 4.5, TEXT_MUTED),
        };
        let font = match style {
            TextStyle::Title | TextStyle::Heading | TextStyle::Strong => &self.bold,
            TextStyle::TableHeader => &self.mono_bold,
            TextStyle::TableRow => &self.mono,
            _ => &self.regular,
        }
        .clone();

        self.ensure_room(leading);
        self.layer.set_fill_color(rgb(color));
        self.layer.use_text(text, size, Mm(MARGIN_LEFT), Mm(self.y), &font);
        self.y -= leading;
    }

    fn rule(&mut self) {
        self.ensure_room(4.0);
        self.layer.set_outline_color(rgb(TEXT_MUTED));
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_LEFT), Mm(self.y + 1.5)), false),
                (Point::new(Mm(MARGIN_RIGHT), Mm(self.y + 1.5)), false),
            ],
            is_closed: false,
        });
        self.y -= 4.0;
    }

    fn spacer(&mut self, height: f32) {
        self.y -= height;
    }

    fn page_break(&mut self) {
        self.new_page();
    }
}

/// Plain-text rendering of a report: one entry per text run, blank lines
/// for spacers, rules and page breaks. Mirrors what text extraction gets
/// back from the PDF.
#[derive(Debug, Default)]
pub struct TextSurface {
    lines: Vec<String>,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_text(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    fn blank(&mut self) {
        if self.lines.last().map_or(false, |l| !l.is_empty()) {
            self.lines.push(String::new());
        }
    }
}

impl ReportSurface for TextSurface {
    fn text(&mut self, _style: TextStyle, text: &str) {
        self.lines.push(text.to_string());
    }

    fn rule(&mut self) {
        self.blank();
    }

    fn spacer(&mut self, _height: f32) {
        self.blank();
    }

    fn page_break(&mut self) {
        self.blank();
    }
}
