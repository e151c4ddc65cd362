use crate::model::{Inline, RichText};
use crate::style::{Alignment, Style};

use super::canvas::{Canvas, TextMeasure, TextRun};

pub(super) struct WordChunk {
    pub(super) text: String,
    pub(super) bold: bool,
    pub(super) x_offset: f32, // x relative to line start
    pub(super) width: f32,
}

pub(crate) struct TextLine {
    pub(super) chunks: Vec<WordChunk>,
    pub(super) total_width: f32,
    /// Line ends at a hard break (or is the paragraph's last line); never justified.
    pub(super) hard_end: bool,
}

fn finish_line(chunks: &mut Vec<WordChunk>, hard_end: bool) -> TextLine {
    let total_width = chunks.last().map(|c| c.x_offset + c.width).unwrap_or(0.0);
    TextLine {
        chunks: std::mem::take(chunks),
        total_width,
        hard_end,
    }
}

/// Wrap rich text into lines no wider than `max_width`.
/// No space is inserted between adjacent spans unless the text on either side
/// of the boundary has whitespace there ("<b>CRP</b>, " → "CRP,").
pub(crate) fn build_lines<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &RichText,
    style: &Style,
    max_width: f32,
) -> Vec<TextLine> {
    let font_size = style.font_size;
    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<WordChunk> = Vec::new();
    let mut current_x: f32 = 0.0;
    let mut prev_ended_with_ws = false;
    let mut prev_space_w: f32 = 0.0;

    for inline in &text.inlines {
        let (span, bold) = match inline {
            Inline::Text { text, bold } => (text, *bold || style.bold),
            Inline::LineBreak => {
                lines.push(finish_line(&mut current, true));
                current_x = 0.0;
                prev_ended_with_ws = false;
                continue;
            }
        };

        let space_w = measure.text_width(" ", bold, font_size);
        let starts_with_ws = span.starts_with(char::is_whitespace);

        for (i, word) in span.split_whitespace().enumerate() {
            let ww = measure.text_width(word, bold, font_size);
            let need_space = !current.is_empty() && (i > 0 || starts_with_ws || prev_ended_with_ws);
            let gap = if i > 0 || starts_with_ws {
                space_w
            } else {
                prev_space_w
            };
            let proposed_x = if need_space { current_x + gap } else { current_x };

            if !current.is_empty() && proposed_x + ww > max_width {
                lines.push(finish_line(&mut current, false));
                current_x = 0.0;
            } else {
                current_x = proposed_x;
            }

            current.push(WordChunk {
                text: word.to_string(),
                bold,
                x_offset: current_x,
                width: ww,
            });
            current_x += ww;
        }

        prev_ended_with_ws = span.ends_with(char::is_whitespace);
        prev_space_w = space_w;
    }

    lines.push(finish_line(&mut current, true));
    lines
}

/// Draw pre-built lines with the style's alignment, first baseline at `first_baseline_y`.
pub(super) fn draw_lines<C: Canvas>(
    canvas: &mut C,
    lines: &[TextLine],
    style: &Style,
    margin_left: f32,
    text_width: f32,
    first_baseline_y: f32,
) {
    for (line_num, line) in lines.iter().enumerate() {
        let y = first_baseline_y - line_num as f32 * style.leading;

        let is_justified =
            style.alignment == Alignment::Justify && !line.hard_end && line.chunks.len() > 1;

        let line_start_x = match style.alignment {
            Alignment::Center => margin_left + (text_width - line.total_width) / 2.0,
            Alignment::Left | Alignment::Justify => margin_left,
        };

        let extra_per_gap = if is_justified {
            (text_width - line.total_width) / (line.chunks.len() - 1) as f32
        } else {
            0.0
        };

        for (chunk_idx, chunk) in line.chunks.iter().enumerate() {
            let x = line_start_x + chunk.x_offset + chunk_idx as f32 * extra_per_gap;
            canvas.text(
                x,
                y,
                &TextRun {
                    text: &chunk.text,
                    bold: chunk.bold,
                    size: style.font_size,
                    color: style.color,
                },
            );
        }
    }
}
