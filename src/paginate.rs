use std::ops::Range;

use crate::config::PageGeometry;
use crate::model::{Block, Document, RichText};
use crate::pdf::layout::build_lines;
use crate::pdf::{AverageWidth, TextMeasure};
use crate::style::{self, Style};

/// A block (or a line range of a paragraph) placed on a page.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBlock<'a> {
    pub block: &'a Block,
    /// Offset from the top of the printable area, in points.
    pub top: f32,
    pub height: f32,
    /// Lines of a split paragraph carried by this fragment.
    pub lines: Option<Range<usize>>,
    /// Wrapped line count of the whole block as measured by the paginator.
    pub line_count: usize,
    /// Block alone is taller than the printable area and runs past the bottom margin.
    pub overflow: bool,
}

impl PlacedBlock<'_> {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// True when this placement is the last (or only) part of its block.
    pub fn is_final_fragment(&self, total_lines: usize) -> bool {
        self.lines.as_ref().is_none_or(|r| r.end >= total_lines)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page<'a> {
    pub blocks: Vec<PlacedBlock<'a>>,
}

impl Page<'_> {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn used_height(&self) -> f32 {
        self.blocks.last().map_or(0.0, |b| b.bottom())
    }
}

/// Wrapped lines of rich text at `width` under a flat average glyph width.
pub fn estimate_lines(text: &RichText, style: &Style, width: f32) -> usize {
    wrapped_lines(&AverageWidth, text, style, width)
}

fn wrapped_lines<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &RichText,
    style: &Style,
    width: f32,
) -> usize {
    build_lines(measure, text, style, width).len()
}

/// Block measurements: (line count, leading, space before, space after).
/// Tables and spacers report a single "line" equal to their full height.
fn measure<M: TextMeasure + ?Sized>(
    measure: &M,
    block: &Block,
    geometry: &PageGeometry,
) -> (usize, f32, f32, f32) {
    let width = geometry.printable_width();
    match block {
        Block::Heading(h) => {
            let st = style::style(style::heading_role(h.level));
            let lines = wrapped_lines(measure, &RichText::plain(h.text.clone()), &st, width);
            (lines, st.leading, st.space_before, st.space_after)
        }
        Block::Paragraph(p) => {
            let st = style::style(style::paragraph_role(p.role));
            let lines = wrapped_lines(measure, &p.text, &st, width);
            (lines, st.leading, st.space_before, st.space_after)
        }
        Block::Table(t) => {
            let ts = style::table_style(t.kind);
            (1, ts.height(t.rows.len()), 0.0, 0.0)
        }
        Block::Spacer(h) => (1, h.max(0.0), 0.0, 0.0),
        Block::PageBreak => (0, 0.0, 0.0, 0.0),
    }
}

/// Estimated height of a block laid out across the full printable width.
pub fn block_height(block: &Block, geometry: &PageGeometry) -> f32 {
    let (lines, leading, before, after) = measure(&AverageWidth, block, geometry);
    if lines == 0 {
        return 0.0;
    }
    before + lines as f32 * leading + after
}

struct Paginator<'a> {
    printable: f32,
    pages: Vec<Page<'a>>,
    current: Page<'a>,
    cursor: f32,
}

impl<'a> Paginator<'a> {
    fn new_page(&mut self) {
        let finished = std::mem::take(&mut self.current);
        self.pages.push(finished);
        self.cursor = 0.0;
    }

    fn place(
        &mut self,
        block: &'a Block,
        height: f32,
        lines: Option<Range<usize>>,
        line_count: usize,
    ) {
        let overflow = height > self.printable;
        self.current.blocks.push(PlacedBlock {
            block,
            top: self.cursor,
            height,
            lines,
            line_count,
            overflow,
        });
        self.cursor += height;
    }

    fn remaining(&self) -> f32 {
        self.printable - self.cursor
    }

    fn place_whole(&mut self, block: &'a Block, height: f32, line_count: usize) {
        if height > self.remaining() && !self.current.is_empty() {
            log::debug!(
                "paginate: moving block to page {} (needs {:.1}pt, {:.1}pt left)",
                self.pages.len() + 2,
                height,
                self.remaining()
            );
            self.new_page();
        }
        self.place(block, height, None, line_count);
        if height > self.printable {
            log::warn!(
                "paginate: block of {:.1}pt exceeds printable height {:.1}pt; overflowing",
                height,
                self.printable
            );
            self.new_page();
        }
    }

    fn place_lines(&mut self, block: &'a Block, lines: usize, leading: f32, before: f32, after: f32) {
        let total = before + lines as f32 * leading + after;
        if total <= self.remaining() {
            self.place(block, total, None, lines);
            return;
        }

        let mut next = 0usize;
        let mut first_fragment = true;
        while next < lines {
            let lead_in = if first_fragment { before } else { 0.0 };
            let room = self.remaining() - lead_in;
            let fit = if room > 0.0 {
                ((room / leading).floor() as usize).min(lines - next)
            } else {
                0
            };
            if fit == 0 {
                if self.current.is_empty() {
                    // Leading taller than the page; place one line regardless.
                    let end = next + 1;
                    let tail = if end == lines { after } else { 0.0 };
                    self.place(block, lead_in + leading + tail, Some(next..end), lines);
                    next = end;
                    first_fragment = false;
                }
                self.new_page();
                continue;
            }
            let end = next + fit;
            let tail = if end == lines { after } else { 0.0 };
            let range = if next == 0 && end == lines {
                None
            } else {
                Some(next..end)
            };
            self.place(block, lead_in + fit as f32 * leading + tail, range, lines);
            next = end;
            first_fragment = false;
            if next < lines {
                self.new_page();
            }
        }
    }

    fn finish(mut self) -> Vec<Page<'a>> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.new_page();
        }
        self.pages
    }
}

/// Split a document into pages, wrapping text with a flat average glyph width.
/// Engine-driven backends paginate on their own, so this estimate is advisory
/// for them; the native backend paginates with its font metrics through
/// [`paginate_with`].
pub fn paginate<'a>(document: &'a Document, geometry: &PageGeometry) -> Vec<Page<'a>> {
    paginate_with(document, geometry, &AverageWidth)
}

/// Split a document into pages, wrapping text with `measure`.
///
/// Headings and tables are never split: when they do not fit in the space left
/// they move to the next page. A block taller than a whole page gets a page of
/// its own and overflows it. Paragraphs split between lines, spacers that do
/// not fit are dropped, and `PageBreak` always starts a new page.
pub fn paginate_with<'a, M: TextMeasure + ?Sized>(
    document: &'a Document,
    geometry: &PageGeometry,
    measure: &M,
) -> Vec<Page<'a>> {
    let mut p = Paginator {
        printable: geometry.printable_height(),
        pages: Vec::new(),
        current: Page::default(),
        cursor: 0.0,
    };

    for block in &document.blocks {
        let (lines, leading, before, after) = self::measure(measure, block, geometry);
        match block {
            Block::PageBreak => {
                // A page just closed by an overflowing block already is the break.
                if p.current.is_empty()
                    && let Some(last) = p.pages.last_mut()
                {
                    let top = last.used_height();
                    last.blocks.push(PlacedBlock {
                        block,
                        top,
                        height: 0.0,
                        lines: None,
                        line_count: 0,
                        overflow: false,
                    });
                    continue;
                }
                p.place(block, 0.0, None, 0);
                p.new_page();
            }
            Block::Spacer(_) => {
                if p.current.is_empty() {
                    continue;
                }
                if leading <= p.remaining() {
                    p.place(block, leading, None, 0);
                } else {
                    p.new_page();
                }
            }
            Block::Heading(_) | Block::Table(_) => {
                let height = before + lines as f32 * leading + after;
                p.place_whole(block, height, lines);
            }
            Block::Paragraph(_) => p.place_lines(block, lines, leading, before, after),
        }
    }

    let pages = p.finish();
    log::debug!(
        "paginate: {} blocks → {} pages (printable {:.1}pt)",
        document.blocks.len(),
        pages.len(),
        geometry.printable_height()
    );
    pages
}
