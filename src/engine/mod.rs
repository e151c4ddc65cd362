//! External layout engines driven as child processes.
//!
//! Every process runs under a deadline in its own process group: it is
//! spawned, polled with `try_wait`, and the whole group is killed once the
//! deadline passes. Output pipes are collected with a bounded wait, so a
//! helper process that inherited them cannot stall the caller.

mod chromium;
mod weasyprint;

pub use chromium::Chromium;
pub use weasyprint::WeasyPrint;

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::config::PageGeometry;
use crate::error::Error;

const PROCESS_POLL: Duration = Duration::from_millis(20);

/// How long pipe readers may take to reach EOF once the process group is gone.
const READER_GRACE: Duration = Duration::from_millis(500);

pub struct ProcessOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Read `source` to EOF on a detached thread and send the bytes to `tx`.
fn drain<R: Read + Send + 'static>(
    source: Option<R>,
    stream: Stream,
    tx: &Sender<(Stream, Vec<u8>)>,
) -> usize {
    let Some(mut r) = source else {
        return 0;
    };
    let tx = tx.clone();
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = r.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
    1
}

/// Wait for up to `expected` reader results until `deadline`. Readers that
/// miss the deadline are abandoned with whatever they would have returned.
fn collect(
    rx: &Receiver<(Stream, Vec<u8>)>,
    expected: usize,
    deadline: Instant,
    backend: &'static str,
) -> (Vec<u8>, Vec<u8>) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for _ in 0..expected {
        let wait = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok((Stream::Stdout, buf)) => stdout = buf,
            Ok((Stream::Stderr, buf)) => stderr = buf,
            Err(_) => {
                log::warn!("{backend}: output pipe still open; abandoning reader");
                break;
            }
        }
    }
    (stdout, stderr)
}

#[cfg(unix)]
fn isolate(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate(_cmd: &mut Command) {}

/// Kill everything in the child's process group, including helpers it forked.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    let pgid = child.id() as libc::pid_t;
    // The group id equals the leader's pid because of `process_group(0)`.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        child.kill().ok();
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    child.kill().ok();
}

/// Run `cmd` to completion or kill its process group once `timeout` has
/// elapsed. Helpers left behind by a process that exited on its own are
/// killed as well.
pub fn run_bounded(
    mut cmd: Command,
    backend: &'static str,
    timeout: Duration,
) -> Result<ProcessOutput, Error> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    isolate(&mut cmd);

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::BackendUnavailable {
            backend,
            reason: format!("{:?}: {e}", cmd.get_program()),
        },
        _ => Error::Io(e),
    })?;
    let pid = child.id();
    log::debug!("{backend}: spawned pid {pid}");

    let (tx, rx) = mpsc::channel();
    let readers = drain(child.stdout.take(), Stream::Stdout, &tx)
        + drain(child.stderr.take(), Stream::Stderr, &tx);
    drop(tx);

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() >= timeout {
                    log::warn!(
                        "{backend}: pid {pid} still running after {}ms; killing its group",
                        timeout.as_millis()
                    );
                    kill_group(&mut child);
                    child.wait().ok();
                    collect(&rx, readers, Instant::now() + READER_GRACE, backend);
                    return Err(Error::RenderTimeout {
                        backend,
                        waited: start.elapsed(),
                    });
                }
                std::thread::sleep(PROCESS_POLL.min(timeout.saturating_sub(start.elapsed())));
            }
            Err(e) => {
                kill_group(&mut child);
                child.wait().ok();
                return Err(Error::Io(e));
            }
        }
    };
    kill_group(&mut child);

    let (stdout, stderr) = collect(&rx, readers, Instant::now() + READER_GRACE, backend);
    let stderr = String::from_utf8_lossy(&stderr).into_owned();

    log::debug!(
        "{backend}: pid {pid} exited with {status} after {:.1}ms ({} bytes stdout)",
        start.elapsed().as_secs_f64() * 1000.0,
        stdout.len()
    );
    Ok(ProcessOutput {
        status,
        stdout,
        stderr,
    })
}

/// Locate an engine executable: the path in `env_var` when set, otherwise the
/// first of `candidates` found on `PATH`.
pub fn find_program(
    env_var: &str,
    candidates: &[&str],
    backend: &'static str,
) -> Result<PathBuf, Error> {
    find_program_in(env_var, candidates, backend, std::env::var_os("PATH"))
}

/// Like [`find_program`], searching `search_path` instead of `PATH`. Only
/// executable files qualify.
pub fn find_program_in<P: AsRef<OsStr>>(
    env_var: &str,
    candidates: &[&str],
    backend: &'static str,
    search_path: Option<P>,
) -> Result<PathBuf, Error> {
    if let Some(path) = std::env::var_os(env_var) {
        return which::which(&path).map_err(|e| Error::BackendUnavailable {
            backend,
            reason: format!("{env_var}={}: {e}", PathBuf::from(&path).display()),
        });
    }
    let search: Option<OsString> = search_path.map(|p| p.as_ref().to_os_string());
    let cwd = std::env::current_dir()?;
    for name in candidates {
        match which::which_in(name, search.as_ref(), &cwd) {
            Ok(path) => {
                log::debug!("{backend}: using {}", path.display());
                return Ok(path);
            }
            Err(e) => log::debug!("{backend}: {name}: {e}"),
        }
    }
    Err(Error::BackendUnavailable {
        backend,
        reason: format!(
            "none of [{}] found on PATH (set {env_var} to override)",
            candidates.join(", ")
        ),
    })
}

/// Check that a file exists before handing it to an engine.
pub(crate) fn require_file(path: &Path, backend: &'static str) -> Result<(), Error> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::Pdf(format!(
            "{backend}: expected output {} was not written",
            path.display()
        )))
    }
}

/// Bounded polling loop. The probe is always run at least once and receives the
/// time left in the budget; the wait fails with `RenderTimeout` once the budget
/// is spent without the probe succeeding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReadinessWait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl ReadinessWait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: Duration::from_millis(100),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn wait<F>(&self, backend: &'static str, mut probe: F) -> Result<(), Error>
    where
        F: FnMut(Duration) -> Result<bool, Error>,
    {
        let start = Instant::now();
        let mut attempts = 0u32;
        loop {
            let remaining = self.timeout.saturating_sub(start.elapsed());
            attempts += 1;
            if probe(remaining)? {
                log::debug!(
                    "{backend}: ready after {attempts} probe(s), {:.1}ms",
                    start.elapsed().as_secs_f64() * 1000.0
                );
                return Ok(());
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                log::warn!("{backend}: not ready after {attempts} probe(s)");
                return Err(Error::RenderTimeout {
                    backend,
                    waited: elapsed,
                });
            }
            std::thread::sleep(self.poll_interval.min(self.timeout - elapsed));
        }
    }
}

/// A browser-like engine that can host one document at a time.
pub trait Engine {
    fn name(&self) -> &'static str;

    /// Start a session. Everything the session holds is released when it is dropped.
    fn launch(&self) -> Result<Box<dyn EngineSession>, Error>;
}

pub trait EngineSession {
    fn load(&mut self, html: &str) -> Result<(), Error>;

    /// Serialized DOM of the loaded page, after at most `budget` of rendering.
    fn snapshot(&mut self, budget: Duration) -> Result<String, Error>;

    /// Print the loaded page to PDF bytes.
    fn capture(&mut self, geometry: &PageGeometry, budget: Duration) -> Result<Vec<u8>, Error>;
}
