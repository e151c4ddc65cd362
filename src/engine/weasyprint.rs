use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use super::{find_program, require_file, run_bounded};
use crate::error::Error;

const BACKEND: &str = "print";

/// The WeasyPrint command-line converter.
#[derive(Clone, Debug)]
pub struct WeasyPrint {
    program: PathBuf,
}

impl WeasyPrint {
    /// `LABREPORT_WEASYPRINT` or `weasyprint` on `PATH`.
    pub fn locate() -> Result<Self, Error> {
        Ok(Self {
            program: find_program("LABREPORT_WEASYPRINT", &["weasyprint"], BACKEND)?,
        })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Convert `html` with the extra user stylesheet `css` applied.
    pub fn convert(&self, html: &str, css: &str, timeout: Duration) -> Result<Vec<u8>, Error> {
        let workdir = tempfile::Builder::new()
            .prefix("labreport-print-")
            .tempdir()?;
        let html_path = workdir.path().join("report.html");
        let css_path = workdir.path().join("print.css");
        let target = workdir.path().join("report.pdf");
        std::fs::write(&html_path, html)?;
        std::fs::write(&css_path, css)?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("--encoding")
            .arg("utf-8")
            .arg("--stylesheet")
            .arg(&css_path)
            .arg(&html_path)
            .arg(&target);
        let out = run_bounded(cmd, BACKEND, timeout)?;
        if !out.status.success() {
            return Err(Error::Pdf(format!(
                "weasyprint exited with {}: {}",
                out.status,
                out.stderr.trim()
            )));
        }
        require_file(&target, BACKEND)?;
        Ok(std::fs::read(&target)?)
    }
}
