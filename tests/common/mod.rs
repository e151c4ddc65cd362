#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use labreport_pdf::{
    Canvas, Labels, Narrative, Observation, ObservationModel, Parameter, ReferenceRange,
    RichText, TextMeasure, TextRun,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

pub fn post_op_dates() -> [NaiveDate; 4] {
    [date(9, 18), date(9, 19), date(9, 20), date(9, 21)]
}

fn series(values: [f64; 4]) -> Vec<Observation> {
    post_op_dates()
        .into_iter()
        .zip(values)
        .map(|(d, v)| Observation::new(d, v))
        .collect()
}

/// (id, label, unit, decimals, low, high, values)
type Row = (&'static str, &'static str, &'static str, usize, f64, f64, [f64; 4]);

const KEY_PARAMETERS: [Row; 6] = [
    ("CRP", "CRP", "mg/dl", 2, 0.0, 0.5, [3.04, 2.17, 0.47, 0.246]),
    ("WBC", "WBC", "x10³/μL", 2, 4.0, 10.0, [14.30, 15.47, 9.62, 6.46]),
    ("NEU", "Neutrophil", "x10³/μL", 2, 2.0, 7.0, [13.31, 13.99, 8.06, 5.12]),
    ("GLU", "Glucose", "mg/dl", 0, 70.0, 110.0, [174.0, 168.0, 169.0, 151.0]),
    ("K", "Potassium", "mmol/L", 2, 3.5, 5.2, [3.42, 3.12, 3.09, 3.48]),
    ("HCT", "HCT", "%", 1, 37.0, 47.0, [37.8, 35.4, 32.9, 35.4]),
];

const PANEL_EXTRA: [Row; 12] = [
    ("LYM", "Lymphocyte", "x10³/μL", 2, 0.8, 4.0, [0.69, 1.04, 1.27, 1.12]),
    ("MON", "Monocyte", "x10³/μL", 2, 0.12, 1.2, [0.30, 0.41, 0.29, 0.22]),
    ("RBC", "RBC", "x10⁶/μL", 2, 3.5, 6.13, [4.37, 4.02, 3.74, 4.07]),
    ("HGB", "HGB", "g/dl", 1, 11.0, 16.0, [13.3, 12.2, 11.4, 12.4]),
    ("MCV", "MCV", "fl", 1, 80.0, 100.0, [86.5, 88.0, 87.9, 86.8]),
    ("PLT", "PLT", "x10³/μL", 0, 150.0, 400.0, [251.0, 216.0, 191.0, 188.0]),
    ("CREA", "Creatinine", "mg/dl", 2, 0.6, 1.1, [0.86, 0.91, 0.69, 0.79]),
    ("CA", "Calcium", "mg/dl", 1, 8.1, 10.7, [8.1, 8.7, 7.7, 8.9]),
    ("NA", "Sodium", "mmol/L", 0, 134.0, 148.0, [143.0, 145.0, 141.0, 137.0]),
    ("ALT", "ALT", "U/L", 0, 0.0, 35.0, [23.0, 26.0, 25.0, 27.0]),
    ("AST", "AST", "U/L", 0, 0.0, 35.0, [27.0, 28.0, 14.0, 15.0]),
    ("UREA", "Urea", "mg/dl", 1, 8.2, 23.2, [9.4, 14.3, 13.4, 16.3]),
];

fn add_rows(model: &mut ObservationModel, rows: &[Row]) {
    for &(id, label, unit, decimals, low, high, values) in rows {
        model
            .add_series(
                Parameter::new(id, unit)
                    .with_label(label)
                    .with_decimals(decimals),
                ReferenceRange::new(low, high),
                series(values),
            )
            .unwrap();
    }
}

/// The six key parameters of the post-operative follow-up report.
pub fn post_op_model() -> ObservationModel {
    let mut model = ObservationModel::new();
    add_rows(&mut model, &KEY_PARAMETERS);
    model
}

/// Key parameters plus the rest of the daily panel (18 parameters).
pub fn full_panel_model() -> ObservationModel {
    let mut model = post_op_model();
    add_rows(&mut model, &PANEL_EXTRA);
    model
}

pub fn narrative() -> Narrative {
    Narrative {
        title: "Post-operative Recovery Follow-up".into(),
        subtitle: "Daily Laboratory Results".into(),
        commentary_heading: "Physician Commentary".into(),
        commentary: RichText::parse(
            "The results show recovery progressing as expected. The inflammation marker \
             <b>CRP</b> has returned to its normal range.<br/><br/>\
             <b>WBC</b> and <b>Neutrophil</b> counts are falling back to normal. \
             <b>Potassium</b> remains just below its range and should be followed.",
        ),
        summary_heading: "Key Parameter Trends".into(),
        detail_heading: "Daily Parameter Table".into(),
        closing_heading: "Summary and Recommendations".into(),
        closing: RichText::parse(
            "<b>Overall:</b> recovery is on track.<br/>• CRP fell from 3.04 to 0.246\
             <br/>• WBC fell from 14.30 to 6.46",
        ),
        labels: Labels::default(),
    }
}

pub fn output_dir(case: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(case);
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Leaf page objects (`/Type /Page`, not the `/Pages` tree node).
pub fn count_pages(pdf: &[u8]) -> usize {
    let needle = b"/Type /Page";
    pdf.windows(needle.len() + 1)
        .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
        .count()
}

/// Width and height of the first `/MediaBox` in the file.
pub fn media_box(pdf: &[u8]) -> Option<(f32, f32)> {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("/MediaBox [")? + "/MediaBox [".len();
    let end = start + text[start..].find(']')?;
    let nums: Vec<f32> = text[start..end]
        .split_whitespace()
        .filter_map(|s| s.parse().ok())
        .collect();
    match nums.as_slice() {
        [x0, y0, x1, y1] => Some((x1 - x0, y1 - y0)),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawnText {
    pub x: f32,
    pub baseline: f32,
    pub text: String,
    pub bold: bool,
    pub size: f32,
    pub color: [u8; 3],
}

#[derive(Clone, Debug, Default)]
pub struct RecordedPage {
    pub texts: Vec<DrawnText>,
    pub rects: Vec<(f32, f32, f32, f32, [u8; 3])>,
    pub lines: usize,
}

/// Canvas that records primitives instead of drawing. Glyphs are half an em
/// wide unless set otherwise.
#[derive(Default)]
pub struct RecordingCanvas {
    pub pages: Vec<RecordedPage>,
    glyph_width: Option<f32>,
}

impl RecordingCanvas {
    /// Every glyph is `em` font sizes wide.
    pub fn with_glyph_width(em: f32) -> Self {
        Self {
            glyph_width: Some(em),
            ..Self::default()
        }
    }

    fn page(&mut self) -> &mut RecordedPage {
        if self.pages.is_empty() {
            self.pages.push(RecordedPage::default());
        }
        self.pages.last_mut().unwrap()
    }

    pub fn all_text(&self) -> Vec<&DrawnText> {
        self.pages.iter().flat_map(|p| p.texts.iter()).collect()
    }
}

impl TextMeasure for RecordingCanvas {
    fn text_width(&self, text: &str, _bold: bool, size: f32) -> f32 {
        text.chars().count() as f32 * size * self.glyph_width.unwrap_or(0.5)
    }
}

impl Canvas for RecordingCanvas {
    fn begin_page(&mut self) {
        self.pages.push(RecordedPage::default());
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 3]) {
        self.page().rects.push((x, y, width, height, color));
    }

    fn line(&mut self, _from: (f32, f32), _to: (f32, f32), _width: f32, _color: [u8; 3]) {
        self.page().lines += 1;
    }

    fn text(&mut self, x: f32, baseline: f32, run: &TextRun<'_>) {
        self.page().texts.push(DrawnText {
            x,
            baseline,
            text: run.text.to_string(),
            bold: run.bold,
            size: run.size,
            color: run.color,
        });
    }
}
