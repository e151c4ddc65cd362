//! HTML and CSS serialization of a [`Document`] for the engine-driven backends.
//!
//! The output is well-formed XHTML: every element is closed, void elements are
//! self-closed, and text is escaped, so it loads in a browser and in a print
//! engine alike. Tables carry `data-table` and `data-row` attributes that the
//! readiness probe looks for in DOM snapshots.

use crate::config::PageGeometry;
use crate::model::{
    Block, Cell, Document, HeadingLevel, Inline, ParagraphRole, RichText, Table, TableKind, Trend,
};
use crate::status::ColorTag;
use crate::style::{self, Alignment, Role, Style, css_color};

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// CSS `font-family` value from a `;`-separated candidate list.
fn css_font_family(family_list: &str) -> String {
    let mut names: Vec<String> = family_list
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.contains(' ') {
                format!("\"{s}\"")
            } else {
                s.to_string()
            }
        })
        .collect();
    names.push("sans-serif".to_string());
    names.join(", ")
}

fn text_rule(selector: &str, st: &Style) -> String {
    let align = match st.alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Justify => "justify",
    };
    format!(
        "{selector} {{ font-size: {}pt; line-height: {}pt; font-weight: {}; color: {}; \
         text-align: {align}; margin: {}pt 0 {}pt 0; }}\n",
        st.font_size,
        st.leading,
        if st.bold { "bold" } else { "normal" },
        css_color(st.color),
        st.space_before,
        st.space_after,
    )
}

fn table_rules(class: &str, kind: TableKind) -> String {
    let ts = style::table_style(kind);
    let grid = format!("{}pt solid {}", ts.grid_width, css_color(ts.grid_color));
    let mut css = String::new();
    css.push_str(&format!(
        "table.{class} {{ width: 100%; border-collapse: collapse; border: {grid}; }}\n"
    ));
    css.push_str(&format!(
        "table.{class} th, table.{class} td {{ border: {grid}; padding: 0 {}pt; \
         text-align: center; white-space: nowrap; }}\n",
        ts.cell_padding
    ));
    css.push_str(&format!(
        "table.{class} thead th {{ height: {}pt; font-size: {}pt; font-weight: bold; \
         background: {}; color: {}; }}\n",
        ts.header_height,
        ts.header_font_size,
        css_color(ts.header_fill),
        css_color(style::style(Role::TableHeader).color),
    ));
    css.push_str(&format!(
        "table.{class} tbody th, table.{class} tbody td {{ height: {}pt; font-size: {}pt; \
         font-weight: normal; background: {}; }}\n",
        ts.row_height,
        ts.body_font_size,
        css_color(ts.body_fill),
    ));
    css.push_str(&format!(
        "table.{class} tbody tr.stripe th, table.{class} tbody tr.stripe td {{ background: {}; }}\n",
        css_color(ts.stripe_fill),
    ));
    css
}

/// Stylesheet carrying the page geometry as `@page` rules plus the style table.
pub fn stylesheet(geometry: &PageGeometry, font_family: &str) -> String {
    let body = style::style(Role::Body);
    let mut css = String::new();
    css.push_str(&format!(
        "@page {{ size: {}pt {}pt; margin: {}pt {}pt {}pt {}pt; }}\n",
        geometry.width,
        geometry.height,
        geometry.margin_top,
        geometry.margin_right,
        geometry.margin_bottom,
        geometry.margin_left,
    ));
    // Browsers drop backgrounds when printing unless told otherwise.
    css.push_str("html, body { -webkit-print-color-adjust: exact; print-color-adjust: exact; }\n");
    css.push_str(&format!(
        "body {{ margin: 0; font-family: {}; font-size: {}pt; line-height: {}pt; color: {}; }}\n",
        css_font_family(font_family),
        body.font_size,
        body.leading,
        css_color(body.color),
    ));
    css.push_str(&text_rule("h1.title", &style::style(Role::Title)));
    css.push_str(&text_rule("h2.subtitle", &style::style(Role::Subtitle)));
    css.push_str(&text_rule("h2.section", &style::style(Role::Heading)));
    css.push_str(&text_rule("p.body", &body));
    css.push_str(&text_rule("p.closing", &style::style(Role::Closing)));
    css.push_str(&table_rules("summary", TableKind::Summary));
    css.push_str(&table_rules("detail", TableKind::Detail));
    for tag in [ColorTag::Positive, ColorTag::Caution, ColorTag::Alert] {
        css.push_str(&format!(
            "td.{} {{ color: {}; font-weight: bold; }}\n",
            tag.css_class(),
            css_color(style::tag_color(tag)),
        ));
    }
    css.push_str(&format!(
        ".trends {{ display: flex; flex-wrap: wrap; gap: 4pt; margin: 6pt 0; }}\n\
         figure.trend {{ margin: 0; width: {CHART_WIDTH}pt; font-size: 7pt; text-align: center; }}\n"
    ));
    css.push_str(".card, table, figure.trend { break-inside: avoid; page-break-inside: avoid; }\n");
    css.push_str("tr { break-inside: avoid; page-break-inside: avoid; }\n");
    css.push_str(".page-break { break-after: page; page-break-after: always; }\n");
    css
}

fn push_rich(out: &mut String, text: &RichText) {
    for inline in &text.inlines {
        match inline {
            Inline::Text { text, bold: true } => {
                out.push_str("<b>");
                out.push_str(&escape(text));
                out.push_str("</b>");
            }
            Inline::Text { text, bold: false } => out.push_str(&escape(text)),
            Inline::LineBreak => out.push_str("<br/>"),
        }
    }
}

fn push_cell(out: &mut String, element: &str, cell: &Cell, extra: &str) {
    match cell.tag {
        Some(tag) => out.push_str(&format!("<{element}{extra} class=\"{}\">", tag.css_class())),
        None => out.push_str(&format!("<{element}{extra}>")),
    }
    out.push_str(&escape(&cell.text));
    out.push_str(&format!("</{element}>"));
}

fn push_table(out: &mut String, table: &Table) {
    let id = table.id();
    out.push_str("<div class=\"card\">\n");
    out.push_str(&format!(
        "<table class=\"{id}\" data-table=\"{id}\" data-rows=\"{}\">\n<thead><tr>",
        table.row_count()
    ));
    push_cell(out, "th", &table.header.label, " scope=\"col\"");
    for cell in &table.header.cells {
        push_cell(out, "th", cell, " scope=\"col\"");
    }
    out.push_str("</tr></thead>\n<tbody>\n");
    for (i, row) in table.rows.iter().enumerate() {
        let stripe = if table.striped && i % 2 == 0 {
            " class=\"stripe\""
        } else {
            ""
        };
        out.push_str(&format!("<tr data-row=\"{id}-{i}\"{stripe}>"));
        push_cell(out, "th", &row.label, " scope=\"row\"");
        for cell in &row.cells {
            push_cell(out, "td", cell, "");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</div>\n");
}

const CHART_WIDTH: f32 = 120.0;
const CHART_HEIGHT: f32 = 36.0;
const CHART_PAD: f32 = 4.0;
const BAND_FILL: [u8; 3] = [228, 242, 228];

/// Inline SVG sparkline: the reference band behind a polyline of the values.
fn push_sparkline(out: &mut String, trend: &Trend) {
    let values = trend.points.iter().map(|&(_, v)| v);
    let bounds = trend.low.into_iter().chain(trend.high);
    let (mut lo, mut hi) = values
        .chain(bounds)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        (lo, hi) = (0.0, 1.0);
    }
    if hi - lo < f64::EPSILON {
        (lo, hi) = (lo - 1.0, hi + 1.0);
    }
    let inner_w = CHART_WIDTH - 2.0 * CHART_PAD;
    let inner_h = CHART_HEIGHT - 2.0 * CHART_PAD;
    let x = |col: usize| -> f32 {
        if trend.columns <= 1 {
            CHART_WIDTH / 2.0
        } else {
            CHART_PAD + inner_w * col as f32 / (trend.columns - 1) as f32
        }
    };
    let y = |v: f64| -> f32 { CHART_PAD + inner_h * ((hi - v) / (hi - lo)) as f32 };

    out.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{CHART_WIDTH}pt\" \
         height=\"{CHART_HEIGHT}pt\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\">"
    ));
    if trend.low.is_some() || trend.high.is_some() {
        let top = trend.high.map_or(0.0, y);
        let bottom = trend.low.map_or(CHART_HEIGHT, y);
        out.push_str(&format!(
            "<rect class=\"band\" x=\"0\" y=\"{top:.1}\" width=\"{CHART_WIDTH}\" \
             height=\"{:.1}\" fill=\"{}\"/>",
            (bottom - top).max(0.0),
            css_color(BAND_FILL),
        ));
    }
    let color = css_color(style::tag_color(trend.tag));
    let points: Vec<String> = trend
        .points
        .iter()
        .map(|&(col, v)| format!("{:.1},{:.1}", x(col), y(v)))
        .collect();
    out.push_str(&format!(
        "<polyline points=\"{}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"1.5\"/>",
        points.join(" ")
    ));
    for &(col, v) in &trend.points {
        out.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2\" fill=\"{color}\"/>",
            x(col),
            y(v)
        ));
    }
    out.push_str("</svg>");
}

/// One captioned sparkline per row that carries a trend.
fn push_trends(out: &mut String, table: &Table) {
    if table.rows.iter().all(|r| r.trend.is_none()) {
        return;
    }
    let id = table.id();
    out.push_str(&format!("<div class=\"trends\" data-trends=\"{id}\">\n"));
    for (i, row) in table.rows.iter().enumerate() {
        let Some(trend) = &row.trend else {
            continue;
        };
        out.push_str(&format!(
            "<figure class=\"trend\" data-chart=\"{id}-{i}\"><figcaption>{}</figcaption>",
            escape(&row.label.text)
        ));
        push_sparkline(out, trend);
        out.push_str("</figure>\n");
    }
    out.push_str("</div>\n");
}

/// Complete HTML page for the document with the stylesheet inlined.
pub fn to_html(document: &Document, geometry: &PageGeometry, font_family: &str) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<head>\n");
    out.push_str("<meta charset=\"utf-8\"/>\n");
    let title = document.blocks.iter().find_map(|b| match b {
        Block::Heading(h) if h.level == HeadingLevel::Title => Some(h.text.as_str()),
        _ => None,
    });
    out.push_str(&format!("<title>{}</title>\n", escape(title.unwrap_or("Report"))));
    out.push_str("<style>\n");
    out.push_str(&stylesheet(geometry, font_family));
    out.push_str("</style>\n</head>\n<body>\n<div class=\"report\">\n");

    for block in &document.blocks {
        match block {
            Block::Heading(h) => {
                let (tag, class) = match h.level {
                    HeadingLevel::Title => ("h1", "title"),
                    HeadingLevel::Subtitle => ("h2", "subtitle"),
                    HeadingLevel::Section => ("h2", "section"),
                };
                out.push_str(&format!(
                    "<{tag} class=\"{class}\">{}</{tag}>\n",
                    escape(&h.text)
                ));
            }
            Block::Paragraph(p) => {
                let class = match p.role {
                    ParagraphRole::Body => "body",
                    ParagraphRole::Closing => "closing",
                };
                out.push_str(&format!("<p class=\"{class}\">"));
                push_rich(&mut out, &p.text);
                out.push_str("</p>\n");
            }
            Block::Table(t) => {
                push_table(&mut out, t);
                push_trends(&mut out, t);
            }
            Block::Spacer(h) => {
                out.push_str(&format!(
                    "<div class=\"spacer\" style=\"height: {}pt\"></div>\n",
                    h.max(0.0)
                ));
            }
            Block::PageBreak => out.push_str("<div class=\"page-break\"></div>\n"),
        }
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

/// Structural markers a DOM snapshot must contain before capture: every
/// table's marker attribute, its last body row and its last trend chart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessProbe {
    markers: Vec<String>,
}

impl ReadinessProbe {
    pub fn for_document(document: &Document) -> Self {
        let mut markers = Vec::new();
        for table in document.tables() {
            let id = table.id();
            markers.push(format!("data-table=\"{id}\""));
            if let Some(last) = table.row_count().checked_sub(1) {
                markers.push(format!("data-row=\"{id}-{last}\""));
            }
            if let Some(last) = table.rows.iter().rposition(|r| r.trend.is_some()) {
                markers.push(format!("data-chart=\"{id}-{last}\""));
            }
        }
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn missing<'a>(&'a self, dom: &str) -> Vec<&'a str> {
        self.markers
            .iter()
            .filter(|m| !dom.contains(m.as_str()))
            .map(String::as_str)
            .collect()
    }

    pub fn is_satisfied(&self, dom: &str) -> bool {
        self.markers.iter().all(|m| dom.contains(m.as_str()))
    }
}
