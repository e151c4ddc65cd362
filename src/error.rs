use std::fmt;
use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// Series rejected while building the observation model.
    InvalidSeries { parameter: String, reason: String },
    UnknownParameter(String),
    /// Asynchronous content never became ready within the render budget.
    RenderTimeout {
        backend: &'static str,
        waited: Duration,
    },
    /// External rendering engine missing or unreachable.
    BackendUnavailable {
        backend: &'static str,
        reason: String,
    },
    Pdf(String),
    Input(String),
}

impl Error {
    pub(crate) fn invalid_series(parameter: &str, reason: impl Into<String>) -> Self {
        Error::InvalidSeries {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::InvalidSeries { parameter, reason } => {
                write!(f, "invalid series for {parameter}: {reason}")
            }
            Error::UnknownParameter(id) => write!(f, "unknown parameter: {id}"),
            Error::RenderTimeout { backend, waited } => write!(
                f,
                "{backend} backend: content not ready after {:.1}s",
                waited.as_secs_f64()
            ),
            Error::BackendUnavailable { backend, reason } => {
                write!(f, "{backend} backend unavailable: {reason}")
            }
            Error::Pdf(msg) => write!(f, "PDF error: {msg}"),
            Error::Input(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
