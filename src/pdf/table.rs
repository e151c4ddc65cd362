use crate::model::{Cell, Row, Table};
use crate::style::{self, TableStyle};

use super::canvas::{Canvas, TextRun};

/// Share of the table width the row-header column starts with before auto-fit.
const LABEL_COLUMN_SHARE: f32 = 0.3;

/// Column widths for the row-header column followed by the data columns.
/// Every column starts at its nominal share; columns whose widest cell does not
/// fit grow, the others shrink proportionally, and the total stays `total_width`.
pub(super) fn auto_fit_columns<C: Canvas>(canvas: &C, table: &Table, total_width: f32) -> Vec<f32> {
    let ts = style::table_style(table.kind);
    let ncols = table.column_count() + 1;
    if ncols == 1 {
        return vec![total_width];
    }

    let label_w = total_width * LABEL_COLUMN_SHARE;
    let data_w = (total_width - label_w) / (ncols - 1) as f32;
    let mut widths: Vec<f32> = std::iter::once(label_w)
        .chain(std::iter::repeat_n(data_w, ncols - 1))
        .collect();

    let mut min_widths = vec![0.0f32; ncols];
    let measure = |row: &Row, bold: bool, size: f32, min_widths: &mut Vec<f32>| {
        for (i, cell) in std::iter::once(&row.label).chain(row.cells.iter()).enumerate() {
            if i >= ncols {
                break;
            }
            let w = canvas.text_width(&cell.text, bold || cell.tag.is_some(), size)
                + 2.0 * ts.cell_padding;
            min_widths[i] = min_widths[i].max(w);
        }
    };
    measure(&table.header, true, ts.header_font_size, &mut min_widths);
    for row in &table.rows {
        measure(row, false, ts.body_font_size, &mut min_widths);
    }

    let mut extra_needed: f32 = 0.0;
    let mut shrinkable: f32 = 0.0;
    for i in 0..ncols {
        if min_widths[i] > widths[i] {
            extra_needed += min_widths[i] - widths[i];
            widths[i] = min_widths[i];
        } else {
            shrinkable += widths[i] - min_widths[i];
        }
    }

    if extra_needed > 0.0 && shrinkable > 0.0 {
        let factor = extra_needed.min(shrinkable) / shrinkable;
        for i in 0..ncols {
            if widths[i] > min_widths[i] {
                widths[i] -= (widths[i] - min_widths[i]) * factor;
            }
        }
    }
    let new_total: f32 = widths.iter().sum();
    if (new_total - total_width).abs() > 0.01 {
        let scale = total_width / new_total;
        for w in &mut widths {
            *w *= scale;
        }
    }
    widths
}

/// Centered in the cell both ways; the baseline sits below the row's midline
/// by roughly a third of the font size.
fn draw_cell_text<C: Canvas>(
    canvas: &mut C,
    cell: &Cell,
    x: f32,
    width: f32,
    row_top: f32,
    row_h: f32,
    run: TextRun<'_>,
) {
    let text_w = canvas.text_width(&cell.text, run.bold, run.size);
    let tx = x + ((width - text_w) / 2.0).max(0.0);
    let baseline = row_top - row_h / 2.0 - run.size * 0.35;
    canvas.text(tx, baseline, &run);
}

/// Draw a table with its top edge at `top_y`. Rows use the fixed heights of the
/// table style, matching what the paginator reserved.
pub(super) fn draw_table<C: Canvas>(
    canvas: &mut C,
    table: &Table,
    left_x: f32,
    top_y: f32,
    total_width: f32,
) {
    let ts: TableStyle = style::table_style(table.kind);
    let widths = auto_fit_columns(canvas, table, total_width);
    let col_x: Vec<f32> = widths
        .iter()
        .scan(left_x, |x, w| {
            let start = *x;
            *x += w;
            Some(start)
        })
        .collect();

    let header_style = style::style(style::Role::TableHeader);
    let body_style = style::style(style::Role::TableBody);

    log::debug!(
        "TABLE {} rows={} cols={} top={:.2}",
        table.id(),
        table.rows.len(),
        widths.len(),
        top_y
    );

    // Header row
    let header_bottom = top_y - ts.header_height;
    canvas.fill_rect(left_x, header_bottom, total_width, ts.header_height, ts.header_fill);
    for (i, cell) in std::iter::once(&table.header.label)
        .chain(table.header.cells.iter())
        .enumerate()
        .take(widths.len())
    {
        let run = TextRun {
            text: &cell.text,
            bold: true,
            size: ts.header_font_size,
            color: header_style.color,
        };
        draw_cell_text(canvas, cell, col_x[i], widths[i], top_y, ts.header_height, run);
    }

    // Body rows
    let mut row_top = header_bottom;
    for (ri, row) in table.rows.iter().enumerate() {
        let row_bottom = row_top - ts.row_height;
        canvas.fill_rect(
            left_x,
            row_bottom,
            total_width,
            ts.row_height,
            ts.row_fill(ri, table.striped),
        );
        for (i, cell) in std::iter::once(&row.label)
            .chain(row.cells.iter())
            .enumerate()
            .take(widths.len())
        {
            let (bold, color) = match cell.tag {
                Some(tag) => (true, style::tag_color(tag)),
                None => (body_style.bold, body_style.color),
            };
            let run = TextRun {
                text: &cell.text,
                bold,
                size: ts.body_font_size,
                color,
            };
            draw_cell_text(canvas, cell, col_x[i], widths[i], row_top, ts.row_height, run);
        }
        row_top = row_bottom;
    }

    // Grid
    let bottom_y = row_top;
    let mut y = top_y;
    canvas.line((left_x, y), (left_x + total_width, y), ts.grid_width, ts.grid_color);
    y = header_bottom;
    for _ in 0..=table.rows.len() {
        canvas.line((left_x, y), (left_x + total_width, y), ts.grid_width, ts.grid_color);
        y -= ts.row_height;
    }
    for x in col_x.iter().copied().chain(std::iter::once(left_x + total_width)) {
        canvas.line((x, top_y), (x, bottom_y), ts.grid_width, ts.grid_color);
    }
}
