mod canvas;
pub(crate) mod layout;
mod table;

use std::collections::HashSet;

use pdf_writer::{Filter, Name, Pdf, Rect, Ref};

use crate::backend::RenderBackend;
use crate::config::PageGeometry;
use crate::error::Error;
use crate::fonts::{FontMeasure, FontSet, register_font};
use crate::model::{Block, Document, Inline, RichText};
use crate::paginate::{Page, PlacedBlock, paginate_with};
use crate::style;

pub use canvas::{AverageWidth, Canvas, TextMeasure, TextRun};
use canvas::PdfCanvas;
use layout::{build_lines, draw_lines};
use table::draw_table;

/// Draws the paginated document directly with `pdf-writer`.
#[derive(Clone, Debug)]
pub struct NativeBackend {
    font_family: String,
}

impl NativeBackend {
    /// `font_family` lists candidate families separated by `;`.
    pub fn new(font_family: impl Into<String>) -> Self {
        Self {
            font_family: font_family.into(),
        }
    }
}

impl Default for NativeBackend {
    fn default() -> Self {
        Self::new(crate::config::ReportConfig::default().font_family)
    }
}

fn used_chars(document: &Document) -> HashSet<char> {
    let mut chars: HashSet<char> = HashSet::new();
    let add_rich = |text: &RichText, chars: &mut HashSet<char>| {
        for inline in &text.inlines {
            if let Inline::Text { text, .. } = inline {
                chars.extend(text.chars());
            }
        }
    };
    for block in &document.blocks {
        match block {
            Block::Heading(h) => chars.extend(h.text.chars()),
            Block::Paragraph(p) => add_rich(&p.text, &mut chars),
            Block::Table(t) => {
                for row in std::iter::once(&t.header).chain(t.rows.iter()) {
                    chars.extend(row.label.text.chars());
                    for cell in &row.cells {
                        chars.extend(cell.text.chars());
                    }
                }
            }
            Block::Spacer(_) | Block::PageBreak => {}
        }
    }
    chars.extend('0'..='9');
    chars.insert(' ');
    chars
}

/// Real wrapped lines covered by a placed text block. Identity when the pages
/// were laid out with the drawing canvas's metrics. Otherwise the fragment maps
/// proportionally and never draws more lines than the paginator reserved.
fn fragment_lines(placed: &PlacedBlock<'_>, real: usize) -> (usize, usize) {
    let reserved = placed.line_count;
    if reserved == 0 || reserved == real {
        return match &placed.lines {
            None => (0, real),
            Some(range) => (range.start.min(real), range.end.min(real)),
        };
    }
    let range = placed.lines.clone().unwrap_or(0..reserved);
    let start = ((range.start * real) / reserved).min(real);
    let mapped_end = if range.end >= reserved {
        real
    } else {
        ((range.end * real) / reserved).min(real)
    };
    let end = mapped_end.min(start + range.len());
    if end < mapped_end {
        log::warn!(
            "{} wrapped lines drawn into space reserved for {}; {} line(s) dropped",
            real,
            reserved,
            mapped_end - end
        );
    }
    (start, end.max(start))
}

/// Paint every page onto `canvas`, one `begin_page` per layout page. Text is
/// wrapped with the canvas's own metrics, so `pages` should come from
/// [`paginate_with`] using the same measure.
pub fn draw_pages<C: Canvas>(canvas: &mut C, pages: &[Page<'_>], geometry: &PageGeometry) {
    let text_width = geometry.printable_width();
    let area_top = geometry.height - geometry.margin_top;

    for page in pages {
        canvas.begin_page();
        for placed in &page.blocks {
            let y_top = area_top - placed.top;
            match placed.block {
                Block::Heading(h) => {
                    let st = style::style(style::heading_role(h.level));
                    let rich = RichText::plain(h.text.clone());
                    let lines = build_lines(&*canvas, &rich, &st, text_width);
                    let (_, end) = fragment_lines(placed, lines.len());
                    let baseline =
                        y_top - st.space_before - st.font_size * canvas.ascender(st.bold);
                    draw_lines(
                        canvas,
                        &lines[..end],
                        &st,
                        geometry.margin_left,
                        text_width,
                        baseline,
                    );
                }
                Block::Paragraph(p) => {
                    let st = style::style(style::paragraph_role(p.role));
                    let lines = build_lines(&*canvas, &p.text, &st, text_width);
                    let (start, end) = fragment_lines(placed, lines.len());
                    if start >= end {
                        continue;
                    }
                    let lead_in = if start == 0 { st.space_before } else { 0.0 };
                    let baseline = y_top - lead_in - st.font_size * canvas.ascender(st.bold);
                    draw_lines(
                        canvas,
                        &lines[start..end],
                        &st,
                        geometry.margin_left,
                        text_width,
                        baseline,
                    );
                }
                Block::Table(t) => {
                    draw_table(canvas, t, geometry.margin_left, y_top, text_width);
                }
                Block::Spacer(_) | Block::PageBreak => {}
            }
        }
    }
}

impl RenderBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    /// Lays out with the metrics of the faces that will be embedded.
    fn paginate<'a>(&self, document: &'a Document, geometry: &PageGeometry) -> Vec<Page<'a>> {
        let measure = FontMeasure::load(&self.font_family, &used_chars(document));
        paginate_with(document, geometry, &measure)
    }

    fn render(
        &self,
        document: &Document,
        pages: &[Page<'_>],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, Error> {
        let t0 = std::time::Instant::now();
        let mut pdf = Pdf::new();
        let mut next_id = 1i32;
        let mut alloc = || {
            let r = Ref::new(next_id);
            next_id += 1;
            r
        };

        let catalog_id = alloc();
        let pages_id = alloc();

        // Phase 1: fonts
        let chars = used_chars(document);
        let fonts = FontSet {
            regular: register_font(
                &mut pdf,
                &self.font_family,
                false,
                "F1".to_string(),
                &mut alloc,
                &chars,
            ),
            bold: register_font(
                &mut pdf,
                &self.font_family,
                true,
                "F2".to_string(),
                &mut alloc,
                &chars,
            ),
        };
        let t_fonts = t0.elapsed();

        // Phase 2: content streams
        let mut canvas = PdfCanvas::new(&fonts);
        draw_pages(&mut canvas, pages, geometry);
        let contents = canvas.finish();
        if contents.len() != pages.len() {
            return Err(Error::Pdf(format!(
                "drew {} pages for a layout of {}",
                contents.len(),
                pages.len()
            )));
        }
        let t_draw = t0.elapsed();

        // Phase 3: allocate page and content IDs now that page count is known
        let n = contents.len();
        let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
        let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

        for (i, c) in contents.into_iter().enumerate() {
            let raw = c.finish();
            let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
            pdf.stream(content_ids[i], &compressed)
                .filter(Filter::FlateDecode);
        }

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(n as i32);

        for i in 0..n {
            let mut page = pdf.page(page_ids[i]);
            page.media_box(Rect::new(0.0, 0.0, geometry.width, geometry.height))
                .parent(pages_id)
                .contents(content_ids[i]);
            let mut resources = page.resources();
            let mut font_dict = resources.fonts();
            for entry in fonts.entries() {
                font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
            }
        }

        let bytes = pdf.finish();
        let t_total = t0.elapsed();

        log::info!(
            "Render phases: font_embed={:.1}ms, draw={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
            t_fonts.as_secs_f64() * 1000.0,
            (t_draw - t_fonts).as_secs_f64() * 1000.0,
            (t_total - t_draw).as_secs_f64() * 1000.0,
            n,
            bytes.len(),
        );

        Ok(bytes)
    }
}
