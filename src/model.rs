use crate::status::ColorTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeadingLevel {
    Title,
    Subtitle,
    Section,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Heading {
    pub level: HeadingLevel,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    Text { text: String, bold: bool },
    LineBreak,
}

/// Inline rich text: bold spans and hard line breaks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RichText {
    pub inlines: Vec<Inline>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            inlines: vec![Inline::Text {
                text: text.into(),
                bold: false,
            }],
        }
    }

    /// Parse the small markup dialect used for narrative text: `<b>…</b>` for
    /// bold and `<br/>` (or `<br>`) for a line break. Other tags are dropped,
    /// runs of whitespace collapse to one space.
    pub fn parse(markup: &str) -> Self {
        let mut inlines = Vec::new();
        let mut bold = false;
        let mut buf = String::new();
        let mut rest = markup;

        let flush = |buf: &mut String, inlines: &mut Vec<Inline>, bold: bool| {
            let collapsed = collapse_whitespace(buf);
            if !collapsed.trim().is_empty() {
                inlines.push(Inline::Text {
                    text: collapsed,
                    bold,
                });
            }
            buf.clear();
        };

        while let Some(lt) = rest.find('<') {
            buf.push_str(&rest[..lt]);
            let Some(gt) = rest[lt..].find('>') else {
                buf.push_str(&rest[lt..]);
                rest = "";
                break;
            };
            let tag = rest[lt + 1..lt + gt].trim().trim_end_matches('/').trim();
            match tag.to_ascii_lowercase().as_str() {
                "b" | "strong" => {
                    flush(&mut buf, &mut inlines, bold);
                    bold = true;
                }
                "/b" | "/strong" => {
                    flush(&mut buf, &mut inlines, bold);
                    bold = false;
                }
                "br" => {
                    flush(&mut buf, &mut inlines, bold);
                    inlines.push(Inline::LineBreak);
                }
                _ => {}
            }
            rest = &rest[lt + gt + 1..];
        }
        buf.push_str(rest);
        flush(&mut buf, &mut inlines, bold);

        // Leading whitespace of a line carries no meaning once wrapped.
        let mut at_line_start = true;
        for inline in &mut inlines {
            match inline {
                Inline::Text { text, .. } => {
                    if at_line_start {
                        *text = text.trim_start().to_string();
                    }
                    at_line_start = false;
                }
                Inline::LineBreak => at_line_start = true,
            }
        }
        inlines.retain(|i| !matches!(i, Inline::Text { text, .. } if text.is_empty()));

        Self { inlines }
    }

    pub fn is_empty(&self) -> bool {
        self.inlines.iter().all(|i| match i {
            Inline::Text { text, .. } => text.trim().is_empty(),
            Inline::LineBreak => true,
        })
    }

    /// Text split at hard line breaks, bold flags dropped.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![String::new()];
        for inline in &self.inlines {
            match inline {
                Inline::Text { text, .. } => {
                    if let Some(last) = lines.last_mut() {
                        last.push_str(text);
                    }
                }
                Inline::LineBreak => lines.push(String::new()),
            }
        }
        lines
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_ws {
                out.push(' ');
            }
            prev_ws = true;
        } else {
            out.push(ch);
            prev_ws = false;
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParagraphRole {
    Body,
    Closing,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Paragraph {
    pub role: ParagraphRole,
    pub text: RichText,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tag: Option<ColorTag>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag: None,
        }
    }

    pub fn tagged(text: impl Into<String>, tag: ColorTag) -> Self {
        Self {
            text: text.into(),
            tag: Some(tag),
        }
    }
}

/// Values of one parameter for a sparkline, keyed by date column.
#[derive(Clone, Debug, PartialEq)]
pub struct Trend {
    /// (date column, value) for every observation, in date order.
    pub points: Vec<(usize, f64)>,
    /// Number of date columns the points are spread over.
    pub columns: usize,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub tag: ColorTag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// Row header (parameter caption in body rows, corner label in the header row).
    pub label: Cell,
    pub cells: Vec<Cell>,
    /// Summary rows carry their series for the markup charts.
    pub trend: Option<Trend>,
}

impl Row {
    pub fn new(label: Cell, cells: Vec<Cell>) -> Self {
        Self {
            label,
            cells,
            trend: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableKind {
    Summary,
    Detail,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    pub kind: TableKind,
    pub header: Row,
    pub rows: Vec<Row>,
    /// Alternate body rows get a lighter fill.
    pub striped: bool,
}

impl Table {
    /// Data columns, not counting the row-header column.
    pub fn column_count(&self) -> usize {
        self.header.cells.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn id(&self) -> &'static str {
        match self.kind {
            TableKind::Summary => "summary",
            TableKind::Detail => "detail",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Heading(Heading),
    Paragraph(Paragraph),
    Table(Table),
    /// Vertical gap in points.
    Spacer(f32),
    PageBreak,
}

impl Block {
    /// Blocks that move to the next page whole instead of splitting.
    pub fn avoid_split(&self) -> bool {
        matches!(self, Block::Heading(_) | Block::Table(_))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            _ => None,
        })
    }

    pub fn table(&self, kind: TableKind) -> Option<&Table> {
        self.tables().find(|t| t.kind == kind)
    }
}
