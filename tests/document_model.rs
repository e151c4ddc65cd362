mod common;

use labreport_pdf::{
    Block, ColorTag, HeadingLevel, Inline, Narrative, Observation, ObservationModel, Parameter,
    ParagraphRole, ReferenceRange, ReportConfig, RichText, TableKind, build_document,
};

fn kind(block: &Block) -> &'static str {
    match block {
        Block::Heading(h) => match h.level {
            HeadingLevel::Title => "title",
            HeadingLevel::Subtitle => "subtitle",
            HeadingLevel::Section => "section",
        },
        Block::Paragraph(p) => match p.role {
            ParagraphRole::Body => "body",
            ParagraphRole::Closing => "closing",
        },
        Block::Table(t) => match t.kind {
            TableKind::Summary => "summary",
            TableKind::Detail => "detail",
        },
        Block::Spacer(_) => "spacer",
        Block::PageBreak => "break",
    }
}

#[test]
fn block_order_follows_report_layout() {
    let doc = build_document(
        &common::post_op_model(),
        &common::narrative(),
        &ReportConfig::default(),
    );
    let kinds: Vec<&str> = doc.blocks.iter().map(kind).collect();
    assert_eq!(
        kinds,
        [
            "title", "subtitle", "spacer", "section", "body", "spacer", "section", "summary",
            "spacer", "break", "section", "detail", "spacer", "section", "closing",
        ]
    );
}

#[test]
fn build_is_deterministic() {
    let model = common::full_panel_model();
    let narrative = common::narrative();
    let config = ReportConfig::default();
    let a = build_document(&model, &narrative, &config);
    let b = build_document(&model, &narrative, &config);
    assert_eq!(a, b);
}

#[test]
fn summary_shape_is_parameters_by_dates_plus_two() {
    let model = common::post_op_model();
    let doc = build_document(&model, &common::narrative(), &ReportConfig::default());
    let summary = doc.table(TableKind::Summary).unwrap();
    assert_eq!(summary.row_count(), model.len());
    assert_eq!(summary.column_count(), model.dates().len() + 2);
    for row in &summary.rows {
        assert_eq!(row.cells.len(), summary.column_count());
    }

    let detail = doc.table(TableKind::Detail).unwrap();
    assert_eq!(detail.row_count(), model.len());
    assert_eq!(detail.column_count(), model.dates().len() + 1);
    assert!(detail.striped);
    assert!(!summary.striped);
}

#[test]
fn summary_cells_match_the_original_report() {
    let doc = build_document(
        &common::post_op_model(),
        &common::narrative(),
        &ReportConfig::default(),
    );
    let summary = doc.table(TableKind::Summary).unwrap();

    let header: Vec<&str> = std::iter::once(summary.header.label.text.as_str())
        .chain(summary.header.cells.iter().map(|c| c.text.as_str()))
        .collect();
    assert_eq!(
        header,
        ["Parameter", "18 Sep", "19 Sep", "20 Sep", "21 Sep", "Reference", "Status"]
    );

    let crp = &summary.rows[0];
    assert_eq!(crp.label.text, "CRP (mg/dl)");
    let texts: Vec<&str> = crp.cells.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["3.04", "2.17", "0.47", "0.25", "0.00-0.50", "Improving"]);

    let status: Vec<(String, Option<ColorTag>)> = summary
        .rows
        .iter()
        .map(|r| {
            let last = r.cells.last().unwrap();
            (last.text.clone(), last.tag)
        })
        .collect();
    assert_eq!(
        status,
        vec![
            ("Improving".to_string(), Some(ColorTag::Positive)),
            ("Improving".to_string(), Some(ColorTag::Positive)),
            ("Improving".to_string(), Some(ColorTag::Positive)),
            ("High".to_string(), Some(ColorTag::Alert)),
            ("Monitor".to_string(), Some(ColorTag::Caution)),
            ("Low".to_string(), Some(ColorTag::Alert)),
        ]
    );

    // Only status cells are tagged.
    for row in &summary.rows {
        assert!(row.cells[..row.cells.len() - 1].iter().all(|c| c.tag.is_none()));
    }
}

#[test]
fn missing_values_print_placeholder() {
    let mut model = ObservationModel::new();
    model
        .add_series(
            Parameter::new("A", "u"),
            ReferenceRange::new(0.0, 10.0),
            vec![
                Observation::new(common::date(9, 18), 1.0),
                Observation::new(common::date(9, 20), 2.0),
            ],
        )
        .unwrap();
    model
        .add_series(
            Parameter::new("B", "u"),
            ReferenceRange::new(0.0, 10.0),
            vec![Observation::new(common::date(9, 19), 3.0)],
        )
        .unwrap();

    let doc = build_document(&model, &Narrative::default(), &ReportConfig::default());
    let summary = doc.table(TableKind::Summary).unwrap();
    let a: Vec<&str> = summary.rows[0].cells.iter().map(|c| c.text.as_str()).collect();
    let b: Vec<&str> = summary.rows[1].cells.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(a[..3], ["1", "-", "2"]);
    assert_eq!(b[..3], ["-", "3", "-"]);

    // Trend points keep their date columns across the gaps.
    let trend = summary.rows[0].trend.as_ref().unwrap();
    assert_eq!(trend.points, [(0, 1.0), (2, 2.0)]);
    assert_eq!(trend.columns, 3);
    assert_eq!((trend.low, trend.high), (Some(0.0), Some(10.0)));
    let trend = summary.rows[1].trend.as_ref().unwrap();
    assert_eq!(trend.points, [(1, 3.0)]);

    let detail = doc.table(TableKind::Detail).unwrap();
    assert!(detail.rows.iter().all(|r| r.trend.is_none()));
    assert!(summary.header.trend.is_none());
}

#[test]
fn empty_narrative_parts_are_skipped() {
    let doc = build_document(
        &common::post_op_model(),
        &Narrative::default(),
        &ReportConfig::default(),
    );
    let kinds: Vec<&str> = doc.blocks.iter().map(kind).collect();
    assert_eq!(
        kinds,
        ["spacer", "summary", "spacer", "break", "detail", "spacer"]
    );
}

#[test]
fn custom_labels_and_date_format() {
    let mut narrative = common::narrative();
    narrative.labels.parameter = "Parametre".into();
    narrative.labels.status = "Durum".into();
    narrative.labels.improving = "İyileşme".into();
    let config = ReportConfig {
        date_format: "%Y-%m-%d".into(),
        ..ReportConfig::default()
    };
    let doc = build_document(&common::post_op_model(), &narrative, &config);
    let summary = doc.table(TableKind::Summary).unwrap();
    assert_eq!(summary.header.label.text, "Parametre");
    assert_eq!(summary.header.cells[0].text, "2025-09-18");
    assert_eq!(summary.header.cells.last().unwrap().text, "Durum");
    assert_eq!(summary.rows[0].cells.last().unwrap().text, "İyileşme");
}

#[test]
fn invalid_date_format_falls_back_to_iso() {
    let config = ReportConfig {
        date_format: "%Q".into(),
        ..ReportConfig::default()
    };
    let doc = build_document(&common::post_op_model(), &Narrative::default(), &config);
    let summary = doc.table(TableKind::Summary).unwrap();
    assert_eq!(summary.header.cells[0].text, "2025-09-18");
}

#[test]
fn rich_text_markup_parsing() {
    let text = RichText::parse("  Levels of <b>CRP</b>, falling.<br/><br/>Next   line ");
    assert_eq!(
        text.inlines,
        vec![
            Inline::Text {
                text: "Levels of ".into(),
                bold: false
            },
            Inline::Text {
                text: "CRP".into(),
                bold: true
            },
            Inline::Text {
                text: ", falling.".into(),
                bold: false
            },
            Inline::LineBreak,
            Inline::LineBreak,
            Inline::Text {
                text: "Next line ".into(),
                bold: false
            },
        ]
    );
    assert_eq!(text.lines(), ["Levels of CRP, falling.", "", "Next line "]);
    assert!(RichText::parse("  <br/> ").is_empty());
}
