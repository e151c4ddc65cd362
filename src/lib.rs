mod backend;
mod config;
mod document;
mod engine;
mod error;
mod fonts;
mod input;
mod markup;
mod model;
mod observation;
mod paginate;
mod pdf;
mod status;
mod style;

pub use backend::{HeadlessBackend, PrintBackend, RenderBackend, backend_for, render};
pub use config::{BackendKind, PageGeometry, ReportConfig};
pub use document::{Labels, Narrative, build_document};
pub use engine::{
    Chromium, Engine, EngineSession, ProcessOutput, ReadinessWait, WeasyPrint, find_program,
    find_program_in, run_bounded,
};
pub use error::Error;
pub use input::{load_dataset, load_narrative, parse_dataset, parse_narrative};
pub use markup::{ReadinessProbe, escape, stylesheet, to_html};
pub use model::{
    Block, Cell, Document, Heading, HeadingLevel, Inline, Paragraph, ParagraphRole, RichText, Row,
    Table, TableKind, Trend,
};
pub use observation::{Observation, ObservationModel, Parameter, ReferenceRange, Series};
pub use paginate::{Page, PlacedBlock, block_height, estimate_lines, paginate, paginate_with};
pub use pdf::{AverageWidth, Canvas, NativeBackend, TextMeasure, TextRun, draw_pages};
pub use status::{ClassifierConfig, ColorTag, Status, classify, classify_series};
pub use style::{Alignment, Role, Style, TableStyle, style, table_style};

use std::path::Path;
use std::time::Instant;

/// Classify, lay out and render a report in memory.
pub fn render_report(
    model: &ObservationModel,
    narrative: &Narrative,
    config: &ReportConfig,
) -> Result<Vec<u8>, Error> {
    let t0 = Instant::now();

    let doc = build_document(model, narrative, config);
    let t_build = t0.elapsed();

    let bytes = backend::render(&doc, config)?;
    let t_render = t0.elapsed();

    log::info!(
        "Timing: build={:.1}ms, render={:.1}ms, total={:.1}ms (backend {}, output {} bytes)",
        t_build.as_secs_f64() * 1000.0,
        (t_render - t_build).as_secs_f64() * 1000.0,
        t_render.as_secs_f64() * 1000.0,
        config.backend.name(),
        bytes.len(),
    );

    Ok(bytes)
}

/// Render a report and write it to `output`. Nothing is written unless
/// rendering succeeds.
pub fn write_report(
    model: &ObservationModel,
    narrative: &Narrative,
    config: &ReportConfig,
    output: &Path,
) -> Result<(), Error> {
    let t0 = Instant::now();

    let bytes = render_report(model, narrative, config)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes).map_err(Error::Io)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: render={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_render.as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(())
}
