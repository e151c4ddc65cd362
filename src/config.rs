use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::status::ClassifierConfig;

const MM: f32 = 72.0 / 25.4;

/// Page size and margins in PDF points.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
}

impl PageGeometry {
    pub fn a4() -> Self {
        Self::with_margins(210.0 * MM, 297.0 * MM, 20.0 * MM)
    }

    pub fn letter() -> Self {
        Self::with_margins(612.0, 792.0, 72.0)
    }

    pub fn with_margins(width: f32, height: f32, margin: f32) -> Self {
        Self {
            width,
            height,
            margin_top: margin,
            margin_right: margin,
            margin_bottom: margin,
            margin_left: margin,
        }
    }

    pub fn printable_height(&self) -> f32 {
        (self.height - self.margin_top - self.margin_bottom).max(0.0)
    }

    pub fn printable_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(0.0)
    }

    /// Look up a named preset (`a4`, `letter`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "a4" => Some(Self::a4()),
            "letter" => Some(Self::letter()),
            _ => None,
        }
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    #[default]
    Native,
    Headless,
    #[serde(alias = "print-engine")]
    Print,
}

impl BackendKind {
    pub fn name(self) -> &'static str {
        match self {
            BackendKind::Native => "native",
            BackendKind::Headless => "headless",
            BackendKind::Print => "print",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "headless" => Ok(BackendKind::Headless),
            "print" | "print-engine" => Ok(BackendKind::Print),
            other => Err(Error::Input(format!("unknown backend: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub classifier: ClassifierConfig,
    pub page: PageGeometry,
    pub render_timeout_ms: u64,
    pub backend: BackendKind,
    /// Font family candidates separated by `;`, tried in order.
    pub font_family: String,
    /// `chrono` format for date column headers.
    pub date_format: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            page: PageGeometry::default(),
            render_timeout_ms: 5000,
            backend: BackendKind::Native,
            font_family: "Liberation Sans; Arial; DejaVu Sans; Helvetica".to_string(),
            date_format: "%d %b".to_string(),
        }
    }
}

impl ReportConfig {
    pub fn render_timeout(&self) -> Duration {
        Duration::from_millis(self.render_timeout_ms)
    }

    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::Input(format!("config: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}
