mod common;

use labreport_pdf::{
    Block, Cell, Document, Heading, HeadingLevel, Inline, Page, PageGeometry, Paragraph,
    ParagraphRole, ReportConfig, RichText, Row, Table, TableKind, block_height, build_document,
    paginate,
};

/// Printable area 555 x 160 pt.
fn short_page() -> PageGeometry {
    PageGeometry::with_margins(595.0, 200.0, 20.0)
}

fn heading(text: &str) -> Block {
    Block::Heading(Heading {
        level: HeadingLevel::Section,
        text: text.to_string(),
    })
}

fn table(kind: TableKind, rows: usize) -> Block {
    Block::Table(Table {
        kind,
        header: Row::new(
            Cell::new("Parameter"),
            vec![Cell::new("18 Sep"), Cell::new("Reference")],
        ),
        rows: (0..rows)
            .map(|i| Row::new(Cell::new(format!("P{i}")), vec![Cell::new("1.0"), Cell::new("0-2")]))
            .collect(),
        striped: kind == TableKind::Detail,
    })
}

/// Paragraph of `lines` short lines separated by hard breaks.
fn lines_paragraph(lines: usize) -> Block {
    let mut inlines = Vec::new();
    for i in 0..lines {
        if i > 0 {
            inlines.push(Inline::LineBreak);
        }
        inlines.push(Inline::Text {
            text: format!("line {i}"),
            bold: false,
        });
    }
    Block::Paragraph(Paragraph {
        role: ParagraphRole::Body,
        text: RichText { inlines },
    })
}

fn table_placements<'a>(pages: &'a [Page<'a>]) -> Vec<(usize, &'a labreport_pdf::PlacedBlock<'a>)> {
    pages
        .iter()
        .enumerate()
        .flat_map(|(i, p)| p.blocks.iter().map(move |b| (i, b)))
        .filter(|(_, b)| matches!(b.block, Block::Table(_)))
        .collect()
}

#[test]
fn table_that_does_not_fit_moves_to_page_two() {
    let geometry = short_page();
    let doc = Document {
        blocks: vec![heading("Lab values"), table(TableKind::Summary, 7)],
    };
    assert_eq!(block_height(&doc.blocks[1], &geometry), 25.0 + 7.0 * 18.0);

    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].blocks.len(), 1);
    assert!(matches!(pages[0].blocks[0].block, Block::Heading(_)));
    assert_eq!(pages[1].blocks.len(), 1);
    assert!(matches!(pages[1].blocks[0].block, Block::Table(_)));
    assert_eq!(pages[1].blocks[0].top, 0.0);
    assert!(!pages[1].blocks[0].overflow);
}

#[test]
fn avoid_split_blocks_are_never_split() {
    let geometry = PageGeometry::a4();
    let printable = geometry.printable_height();
    for lead_lines in [0usize, 3, 17, 40] {
        for rows in [1usize, 6, 18, 30, 38] {
            let mut blocks = Vec::new();
            if lead_lines > 0 {
                blocks.push(lines_paragraph(lead_lines));
            }
            blocks.push(heading("Summary"));
            blocks.push(table(TableKind::Summary, rows));
            blocks.push(Block::Spacer(20.0));
            blocks.push(heading("Detail"));
            blocks.push(table(TableKind::Detail, rows));
            let doc = Document { blocks };
            let pages = paginate(&doc, &geometry);

            let placed = table_placements(&pages);
            assert_eq!(placed.len(), 2, "lead={lead_lines} rows={rows}");
            for (_, p) in &placed {
                assert!(p.lines.is_none());
                assert_eq!(p.height, block_height(p.block, &geometry));
                if !p.overflow {
                    assert!(p.bottom() <= printable + 0.01, "lead={lead_lines} rows={rows}");
                }
            }
            for page in &pages {
                for b in page.blocks.iter().filter(|b| b.block.avoid_split()) {
                    assert!(b.overflow || b.bottom() <= printable + 0.01);
                }
            }
        }
    }
}

#[test]
fn oversize_table_gets_a_page_of_its_own() {
    let geometry = PageGeometry::a4();
    let doc = Document {
        blocks: vec![
            heading("Everything"),
            table(TableKind::Summary, 60),
            lines_paragraph(2),
        ],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 3);
    assert_eq!(pages[1].blocks.len(), 1);
    let t = &pages[1].blocks[0];
    assert!(t.overflow);
    assert_eq!(t.top, 0.0);
    assert!(matches!(pages[2].blocks[0].block, Block::Paragraph(_)));
}

#[test]
fn page_break_forces_new_page() {
    let geometry = PageGeometry::a4();
    let doc = Document {
        blocks: vec![lines_paragraph(2), Block::PageBreak, lines_paragraph(2)],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 2);
    assert!(matches!(pages[1].blocks[0].block, Block::Paragraph(_)));
}

#[test]
fn page_break_after_oversize_block_adds_no_blank_page() {
    let geometry = PageGeometry::a4();
    let doc = Document {
        blocks: vec![table(TableKind::Detail, 60), Block::PageBreak, heading("Next")],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| !p.is_empty()));
    assert!(matches!(pages[1].blocks[0].block, Block::Heading(_)));
}

#[test]
fn consecutive_page_breaks_add_no_blank_page() {
    let geometry = PageGeometry::a4();
    let doc = Document {
        blocks: vec![
            lines_paragraph(2),
            Block::PageBreak,
            Block::PageBreak,
            heading("Next"),
        ],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 2);
    assert!(pages.iter().all(|p| !p.is_empty()));

    // Both breaks stay on the first page, after the paragraph.
    let breaks: Vec<f32> = pages[0]
        .blocks
        .iter()
        .filter(|b| matches!(b.block, Block::PageBreak))
        .map(|b| b.top)
        .collect();
    assert_eq!(breaks.len(), 2);
    assert!(breaks.iter().all(|&top| top == pages[0].blocks[0].bottom()));
    assert!(matches!(pages[1].blocks[0].block, Block::Heading(_)));
}

#[test]
fn long_paragraph_splits_between_lines() {
    let geometry = short_page();
    let doc = Document {
        blocks: vec![lines_paragraph(30)],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 3);

    let ranges: Vec<_> = pages
        .iter()
        .map(|p| p.blocks[0].lines.clone().unwrap())
        .collect();
    assert_eq!(ranges, vec![0..11, 11..22, 22..30]);
    for page in &pages {
        assert!(page.used_height() <= geometry.printable_height() + 0.01);
    }
    assert!(!pages[0].blocks[0].is_final_fragment(30));
    assert!(pages[2].blocks[0].is_final_fragment(30));
}

#[test]
fn spacer_at_page_end_is_dropped() {
    let geometry = short_page();
    let doc = Document {
        blocks: vec![lines_paragraph(10), Block::Spacer(20.0), heading("After")],
    };
    let pages = paginate(&doc, &geometry);
    assert_eq!(pages.len(), 2);
    assert!(
        pages
            .iter()
            .flat_map(|p| p.blocks.iter())
            .all(|b| !matches!(b.block, Block::Spacer(_)))
    );
    assert!(matches!(pages[1].blocks[0].block, Block::Heading(_)));
    assert_eq!(pages[1].blocks[0].top, 0.0);
}

#[test]
fn empty_document_is_one_blank_page() {
    let doc = Document::default();
    let pages = paginate(&doc, &PageGeometry::a4());
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
}

#[test]
fn full_report_puts_detail_after_the_break() {
    let config = ReportConfig::default();
    let doc = build_document(&common::full_panel_model(), &common::narrative(), &config);
    let pages = paginate(&doc, &config.page);
    assert_eq!(pages.len(), 2);

    let kinds = |p: &Page<'_>| -> Vec<TableKind> {
        p.blocks
            .iter()
            .filter_map(|b| match b.block {
                Block::Table(t) => Some(t.kind),
                _ => None,
            })
            .collect()
    };
    assert_eq!(kinds(&pages[0]), [TableKind::Summary]);
    assert_eq!(kinds(&pages[1]), [TableKind::Detail]);

    // Offsets grow down the page.
    for page in &pages {
        for pair in page.blocks.windows(2) {
            assert!(pair[1].top >= pair[0].top);
        }
    }
}
