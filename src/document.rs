use std::fmt::Write;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::config::ReportConfig;
use crate::model::{
    Block, Cell, Document, Heading, HeadingLevel, Paragraph, ParagraphRole, RichText, Row, Table,
    TableKind, Trend,
};
use crate::observation::{ObservationModel, format_value};
use crate::status::{Status, classify_series};

/// Column and status captions.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Labels {
    pub parameter: String,
    pub reference: String,
    pub status: String,
    pub missing: String,
    pub improving: String,
    pub stable: String,
    pub monitor: String,
    pub low: String,
    pub high: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            parameter: "Parameter".into(),
            reference: "Reference".into(),
            status: "Status".into(),
            missing: "-".into(),
            improving: "Improving".into(),
            stable: "Stable".into(),
            monitor: "Monitor".into(),
            low: "Low".into(),
            high: "High".into(),
        }
    }
}

impl Labels {
    pub fn status_label(&self, status: Status) -> &str {
        match status {
            Status::Improving => &self.improving,
            Status::Stable => &self.stable,
            Status::Monitor => &self.monitor,
            Status::Low => &self.low,
            Status::High => &self.high,
        }
    }
}

/// Pre-authored text supplied by the caller. Nothing here is generated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Narrative {
    pub title: String,
    pub subtitle: String,
    pub commentary_heading: String,
    pub commentary: RichText,
    pub summary_heading: String,
    pub detail_heading: String,
    pub closing_heading: String,
    pub closing: RichText,
    pub labels: Labels,
}

/// Build the report document. Identical inputs give an identical block sequence.
pub fn build_document(
    model: &ObservationModel,
    narrative: &Narrative,
    config: &ReportConfig,
) -> Document {
    let mut blocks = Vec::new();

    push_heading(&mut blocks, HeadingLevel::Title, &narrative.title);
    push_heading(&mut blocks, HeadingLevel::Subtitle, &narrative.subtitle);
    blocks.push(Block::Spacer(20.0));

    push_heading(&mut blocks, HeadingLevel::Section, &narrative.commentary_heading);
    if !narrative.commentary.is_empty() {
        blocks.push(Block::Paragraph(Paragraph {
            role: ParagraphRole::Body,
            text: narrative.commentary.clone(),
        }));
        blocks.push(Block::Spacer(20.0));
    }

    push_heading(&mut blocks, HeadingLevel::Section, &narrative.summary_heading);
    blocks.push(Block::Table(summary_table(model, narrative, config)));
    blocks.push(Block::Spacer(20.0));

    blocks.push(Block::PageBreak);

    push_heading(&mut blocks, HeadingLevel::Section, &narrative.detail_heading);
    blocks.push(Block::Table(detail_table(model, narrative, config)));
    blocks.push(Block::Spacer(30.0));

    push_heading(&mut blocks, HeadingLevel::Section, &narrative.closing_heading);
    if !narrative.closing.is_empty() {
        blocks.push(Block::Paragraph(Paragraph {
            role: ParagraphRole::Closing,
            text: narrative.closing.clone(),
        }));
    }

    log::debug!(
        "build_document: {} parameters, {} blocks",
        model.len(),
        blocks.len()
    );
    Document { blocks }
}

fn push_heading(blocks: &mut Vec<Block>, level: HeadingLevel, text: &str) {
    if !text.trim().is_empty() {
        blocks.push(Block::Heading(Heading {
            level,
            text: text.to_string(),
        }));
    }
}

/// Falls back to ISO form when the format string is invalid.
fn format_date(date: NaiveDate, fmt: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(fmt)).is_err() {
        return date.to_string();
    }
    out
}

fn header_row(model: &ObservationModel, narrative: &Narrative, config: &ReportConfig) -> Row {
    let cells = model
        .dates()
        .iter()
        .map(|&d| Cell::new(format_date(d, &config.date_format)))
        .chain(std::iter::once(Cell::new(&narrative.labels.reference)))
        .collect();
    Row::new(Cell::new(&narrative.labels.parameter), cells)
}

fn value_rows(
    model: &ObservationModel,
    narrative: &Narrative,
    config: &ReportConfig,
    with_status: bool,
) -> Vec<Row> {
    let dates = model.dates();
    model
        .iter()
        .map(|series| {
            let decimals = series.parameter.decimals;
            let mut cells: Vec<Cell> = dates
                .iter()
                .map(|&date| match series.value_on(date) {
                    Some(v) => Cell::new(format_value(v, decimals)),
                    None => Cell::new(&narrative.labels.missing),
                })
                .collect();
            cells.push(Cell::new(series.range.display(decimals)));
            let mut row = Row::new(Cell::new(series.parameter.caption()), Vec::new());
            if with_status {
                let status = classify_series(series, &config.classifier);
                cells.push(Cell::tagged(
                    narrative.labels.status_label(status),
                    status.color_tag(),
                ));
                row.trend = Some(Trend {
                    points: dates
                        .iter()
                        .enumerate()
                        .filter_map(|(i, &date)| Some((i, series.value_on(date)?)))
                        .collect(),
                    columns: dates.len(),
                    low: series.range.low,
                    high: series.range.high,
                    tag: status.color_tag(),
                });
            }
            row.cells = cells;
            row
        })
        .collect()
}

fn summary_table(model: &ObservationModel, narrative: &Narrative, config: &ReportConfig) -> Table {
    let mut header = header_row(model, narrative, config);
    header.cells.push(Cell::new(&narrative.labels.status));
    Table {
        kind: TableKind::Summary,
        header,
        rows: value_rows(model, narrative, config, true),
        striped: false,
    }
}

fn detail_table(model: &ObservationModel, narrative: &Narrative, config: &ReportConfig) -> Table {
    Table {
        kind: TableKind::Detail,
        header: header_row(model, narrative, config),
        rows: value_rows(model, narrative, config, false),
        striped: true,
    }
}
