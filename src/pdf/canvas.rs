use pdf_writer::{Content, Name, Str};

use crate::fonts::FontSet;
use crate::style::AVG_CHAR_WIDTH;

/// A single styled text run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextRun<'t> {
    pub text: &'t str,
    pub bold: bool,
    pub size: f32,
    pub color: [u8; 3],
}

/// Advance widths used for line wrapping. Pagination and drawing must wrap
/// with the same measure for reserved heights to hold.
pub trait TextMeasure {
    fn text_width(&self, text: &str, bold: bool, size: f32) -> f32;
}

/// Flat average glyph advance, for backends without font metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct AverageWidth;

impl TextMeasure for AverageWidth {
    fn text_width(&self, text: &str, _bold: bool, size: f32) -> f32 {
        text.chars().count() as f32 * size * AVG_CHAR_WIDTH
    }
}

/// Drawing surface the native backend paints on. Coordinates are PDF user
/// space: points, origin at the bottom-left corner of the page.
pub trait Canvas: TextMeasure {
    fn begin_page(&mut self);

    /// Ascent as a fraction of the font size.
    fn ascender(&self, _bold: bool) -> f32 {
        0.75
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]);

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: [u8; 3]);

    fn text(&mut self, x: f32, baseline: f32, run: &TextRun<'_>);
}

fn rgb(color: [u8; 3]) -> (f32, f32, f32) {
    (
        color[0] as f32 / 255.0,
        color[1] as f32 / 255.0,
        color[2] as f32 / 255.0,
    )
}

/// Canvas backed by `pdf-writer` content streams, one per page.
pub(crate) struct PdfCanvas<'f> {
    fonts: &'f FontSet,
    pages: Vec<Content>,
}

impl<'f> PdfCanvas<'f> {
    pub(crate) fn new(fonts: &'f FontSet) -> Self {
        Self {
            fonts,
            pages: Vec::new(),
        }
    }

    pub(crate) fn finish(self) -> Vec<Content> {
        self.pages
    }

    fn current(&mut self) -> &mut Content {
        if self.pages.is_empty() {
            self.pages.push(Content::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }
}

impl TextMeasure for PdfCanvas<'_> {
    fn text_width(&self, text: &str, bold: bool, size: f32) -> f32 {
        self.fonts.text_width(text, bold, size)
    }
}

impl Canvas for PdfCanvas<'_> {
    fn begin_page(&mut self) {
        self.pages.push(Content::new());
    }

    fn ascender(&self, bold: bool) -> f32 {
        self.fonts.entry(bold).metrics.ascender_ratio
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        let (r, g, b) = rgb(color);
        let content = self.current();
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.rect(x, y, width, height);
        content.fill_nonzero();
        content.restore_state();
    }

    fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: [u8; 3]) {
        let (r, g, b) = rgb(color);
        let content = self.current();
        content.save_state();
        content.set_line_width(width);
        content.set_stroke_rgb(r, g, b);
        content.move_to(from.0, from.1);
        content.line_to(to.0, to.1);
        content.stroke();
        content.restore_state();
    }

    fn text(&mut self, x: f32, baseline: f32, run: &TextRun<'_>) {
        if run.text.is_empty() {
            return;
        }
        let entry = self.fonts.entry(run.bold);
        let bytes = entry.encode(run.text);
        let font_name = entry.pdf_name.clone();
        let (r, g, b) = rgb(run.color);
        let content = self.current();
        content.save_state();
        content.set_fill_rgb(r, g, b);
        content.begin_text();
        content.set_font(Name(font_name.as_bytes()), run.size);
        content.next_line(x, baseline);
        content.show(Str(&bytes));
        content.end_text();
        content.restore_state();
    }
}
