use std::{
    io::{self, Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use crate::{DEFAULT_MODEL_PATH, MODEL_PATH_ENV, Predictor};

#[derive(Parser, Debug)]
#[command(name = "frost-risk", version)]
#[command(about = "Score frost risk for one weather feature vector", long_about = None)]
pub struct Cli {
    /// JSON payload: {"vector": [12 numbers], "threshold": 0.9}. Reads stdin when omitted or "-"
    #[arg(value_name = "PAYLOAD")]
    pub payload: Option<String>,

    /// Model artifact (.onnx or .json)
    #[arg(
        short,
        long,
        value_name = "PATH",
        env = MODEL_PATH_ENV,
        default_value = DEFAULT_MODEL_PATH
    )]
    pub model: PathBuf,

    /// Estimate risk from temperature, humidity and dew point if the model fails
    #[arg(long)]
    pub heuristic_fallback: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (_, 0) => "warn",
            (_, 1) => "info",
            _ => "debug",
        }
    }
}

/// Logs go to stderr; stdout carries only the result line.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A host that already installed a subscriber keeps it.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn read_payload(arg: Option<&str>) -> Result<String> {
    match arg {
        Some(payload) if payload != "-" => Ok(payload.to_owned()),
        _ => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read payload from stdin")?;
            Ok(buffer)
        }
    }
}

pub fn run(cli: &Cli) -> Result<()> {
    init_tracing(cli.log_level());

    let payload = read_payload(cli.payload.as_deref())?;
    let predictor = Predictor::new(&cli.model).with_heuristic_fallback(cli.heuristic_fallback);
    let assessment = predictor.assess_json(&payload).with_context(|| {
        format!(
            "Failed to assess frost risk with model {}",
            cli.model.display()
        )
    })?;

    let line = serde_json::to_string(&assessment)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")?;
    stdout.flush()?;
    Ok(())
}
