use std::time::{Duration, Instant};

use crate::config::{BackendKind, PageGeometry, ReportConfig};
use crate::engine::{Chromium, Engine, ReadinessWait, WeasyPrint};
use crate::error::Error;
use crate::markup::{self, ReadinessProbe};
use crate::model::Document;
use crate::paginate::{Page, paginate};
use crate::pdf::NativeBackend;

/// Turns a paginated document into PDF bytes.
///
/// Engine-driven backends paginate on their own; for them `pages` is advisory.
pub trait RenderBackend {
    fn name(&self) -> &'static str;

    /// Page layout for `document`. The default wraps text with a flat
    /// average glyph width.
    fn paginate<'a>(&self, document: &'a Document, geometry: &PageGeometry) -> Vec<Page<'a>> {
        paginate(document, geometry)
    }

    fn render(
        &self,
        document: &Document,
        pages: &[Page<'_>],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, Error>;
}

fn check_pdf(backend: &'static str, bytes: Vec<u8>) -> Result<Vec<u8>, Error> {
    if bytes.starts_with(b"%PDF-") {
        Ok(bytes)
    } else {
        Err(Error::Pdf(format!(
            "{backend}: engine output is not a PDF ({} bytes)",
            bytes.len()
        )))
    }
}

/// Loads the markup into a browser engine, waits for every table to be in
/// the DOM, then prints.
pub struct HeadlessBackend<E> {
    engine: E,
    timeout: Duration,
    poll_interval: Duration,
    font_family: String,
}

impl<E: Engine> HeadlessBackend<E> {
    pub fn new(engine: E, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            poll_interval: Duration::from_millis(100),
            font_family: ReportConfig::default().font_family,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }
}

impl<E: Engine> RenderBackend for HeadlessBackend<E> {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn render(
        &self,
        document: &Document,
        _pages: &[Page<'_>],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let html = markup::to_html(document, geometry, &self.font_family);
        let probe = ReadinessProbe::for_document(document);

        let mut session = self.engine.launch()?;
        session.load(&html)?;
        let t_load = t0.elapsed();

        ReadinessWait::new(self.timeout)
            .with_poll_interval(self.poll_interval)
            .wait(self.name(), |remaining| {
                let dom = session.snapshot(remaining)?;
                let missing = probe.missing(&dom);
                if !missing.is_empty() {
                    log::debug!("{}: waiting for {:?}", self.engine.name(), missing);
                }
                Ok(missing.is_empty())
            })?;
        let t_ready = t0.elapsed();

        let bytes = session.capture(geometry, self.timeout)?;
        drop(session);
        let t_capture = t0.elapsed();

        log::info!(
            "Render phases: load={:.1}ms, ready={:.1}ms, capture={:.1}ms ({} bytes)",
            t_load.as_secs_f64() * 1000.0,
            (t_ready - t_load).as_secs_f64() * 1000.0,
            (t_capture - t_ready).as_secs_f64() * 1000.0,
            bytes.len(),
        );
        check_pdf(self.name(), bytes)
    }
}

/// Hands the markup and an `@page` stylesheet to a CSS print engine.
pub struct PrintBackend {
    engine: WeasyPrint,
    timeout: Duration,
    font_family: String,
}

impl PrintBackend {
    pub fn new(engine: WeasyPrint, timeout: Duration) -> Self {
        Self {
            engine,
            timeout,
            font_family: ReportConfig::default().font_family,
        }
    }

    pub fn with_font_family(mut self, font_family: impl Into<String>) -> Self {
        self.font_family = font_family.into();
        self
    }
}

impl RenderBackend for PrintBackend {
    fn name(&self) -> &'static str {
        "print"
    }

    fn render(
        &self,
        document: &Document,
        _pages: &[Page<'_>],
        geometry: &PageGeometry,
    ) -> Result<Vec<u8>, Error> {
        let t0 = Instant::now();
        let html = markup::to_html(document, geometry, &self.font_family);
        let css = markup::stylesheet(geometry, &self.font_family);
        let bytes = self.engine.convert(&html, &css, self.timeout)?;
        log::info!(
            "Render phases: print={:.1}ms ({} bytes)",
            t0.elapsed().as_secs_f64() * 1000.0,
            bytes.len(),
        );
        check_pdf(self.name(), bytes)
    }
}

/// The backend selected by `config`. Engine executables are located here, so
/// a missing engine fails before any layout work.
pub fn backend_for(config: &ReportConfig) -> Result<Box<dyn RenderBackend>, Error> {
    Ok(match config.backend {
        BackendKind::Native => Box::new(NativeBackend::new(config.font_family.clone())),
        BackendKind::Headless => Box::new(
            HeadlessBackend::new(Chromium::locate()?, config.render_timeout())
                .with_font_family(config.font_family.clone()),
        ),
        BackendKind::Print => Box::new(
            PrintBackend::new(WeasyPrint::locate()?, config.render_timeout())
                .with_font_family(config.font_family.clone()),
        ),
    })
}

/// Paginate `document` with the configured geometry and render it with the
/// configured backend.
pub fn render(document: &Document, config: &ReportConfig) -> Result<Vec<u8>, Error> {
    let backend = backend_for(config)?;
    let t0 = Instant::now();
    let pages = backend.paginate(document, &config.page);
    log::debug!(
        "{}: {} layout pages in {:.1}ms",
        backend.name(),
        pages.len(),
        t0.elapsed().as_secs_f64() * 1000.0
    );
    backend.render(document, &pages, &config.page)
}
