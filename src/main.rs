use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use labreport_pdf::{BackendKind, Narrative, PageGeometry, ReportConfig};

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Native,
    Headless,
    Print,
}

impl From<BackendArg> for BackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Native => BackendKind::Native,
            BackendArg::Headless => BackendKind::Headless,
            BackendArg::Print => BackendKind::Print,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PageArg {
    A4,
    Letter,
}

#[derive(Parser)]
#[command(name = "labreport-pdf")]
#[command(version)]
#[command(about = "Render lab result time series into a PDF report", long_about = None)]
struct Cli {
    /// Dataset JSON file
    #[arg(value_name = "DATA")]
    input: PathBuf,

    /// Output PDF file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Narrative JSON file (title, headings, commentary)
    #[arg(long, value_name = "FILE")]
    narrative: Option<PathBuf>,

    /// Report configuration JSON file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Rendering backend, overrides the config file
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Render timeout for external engines in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Page size preset
    #[arg(long, value_enum)]
    page: Option<PageArg>,
}

fn run(cli: Cli) -> Result<(), labreport_pdf::Error> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(ms) = cli.timeout_ms {
        config.render_timeout_ms = ms;
    }
    if let Some(page) = cli.page {
        config.page = match page {
            PageArg::A4 => PageGeometry::a4(),
            PageArg::Letter => PageGeometry::letter(),
        };
    }

    let model = labreport_pdf::load_dataset(&cli.input)?;
    let narrative = match &cli.narrative {
        Some(path) => labreport_pdf::load_narrative(path)?,
        None => Narrative::default(),
    };

    labreport_pdf::write_report(&model, &narrative, &config, &cli.output)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    let output = cli.output.clone();

    match run(cli) {
        Ok(()) => {
            log::info!("Wrote {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
