use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use tempfile::TempDir;

use super::{Engine, EngineSession, find_program, require_file, run_bounded};
use crate::config::PageGeometry;
use crate::error::Error;

const BACKEND: &str = "headless";
const CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

/// Headless Chromium driven through its command line.
#[derive(Clone, Debug)]
pub struct Chromium {
    program: PathBuf,
}

impl Chromium {
    /// `LABREPORT_CHROMIUM` or the first Chromium build on `PATH`.
    pub fn locate() -> Result<Self, Error> {
        Ok(Self {
            program: find_program("LABREPORT_CHROMIUM", CANDIDATES, BACKEND)?,
        })
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Engine for Chromium {
    fn name(&self) -> &'static str {
        "chromium"
    }

    fn launch(&self) -> Result<Box<dyn EngineSession>, Error> {
        let workdir = tempfile::Builder::new()
            .prefix("labreport-chromium-")
            .tempdir()?;
        log::debug!("chromium: session dir {}", workdir.path().display());
        Ok(Box::new(ChromiumSession {
            program: self.program.clone(),
            workdir,
            page: None,
        }))
    }
}

/// Temporary profile and page files for one render. Each Chromium invocation
/// is a bounded child process; the directory goes away with the session.
struct ChromiumSession {
    program: PathBuf,
    workdir: TempDir,
    page: Option<PathBuf>,
}

impl ChromiumSession {
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--hide-scrollbars")
            .arg(format!(
                "--user-data-dir={}",
                self.workdir.path().join("profile").display()
            ));
        cmd
    }

    fn page_url(&self) -> Result<String, Error> {
        let page = self
            .page
            .as_ref()
            .ok_or_else(|| Error::Pdf("chromium: no page loaded".into()))?;
        Ok(format!("file://{}", page.display()))
    }
}

impl EngineSession for ChromiumSession {
    fn load(&mut self, html: &str) -> Result<(), Error> {
        let path = self.workdir.path().join("report.html");
        std::fs::write(&path, html)?;
        self.page = Some(path);
        Ok(())
    }

    fn snapshot(&mut self, budget: Duration) -> Result<String, Error> {
        let url = self.page_url()?;
        let mut cmd = self.command();
        cmd.arg(format!("--virtual-time-budget={}", budget.as_millis()))
            .arg("--dump-dom")
            .arg(url);
        let out = run_bounded(cmd, BACKEND, budget)?;
        if !out.status.success() {
            log::debug!("chromium: dump-dom failed: {}", out.stderr.trim());
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn capture(&mut self, geometry: &PageGeometry, budget: Duration) -> Result<Vec<u8>, Error> {
        let url = self.page_url()?;
        let target = self.workdir.path().join("report.pdf");
        log::debug!(
            "chromium: printing {}x{}pt to {}",
            geometry.width,
            geometry.height,
            target.display()
        );
        let mut cmd = self.command();
        cmd.arg("--no-pdf-header-footer")
            .arg("--print-to-pdf-no-header")
            .arg(format!("--print-to-pdf={}", target.display()))
            .arg(url);
        let out = run_bounded(cmd, BACKEND, budget)?;
        if !out.status.success() {
            return Err(Error::Pdf(format!(
                "chromium exited with {}: {}",
                out.status,
                out.stderr.trim()
            )));
        }
        require_file(&target, BACKEND)?;
        Ok(std::fs::read(&target)?)
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        log::debug!("chromium: releasing {}", self.workdir.path().display());
    }
}
