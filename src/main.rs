use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde_json::json;
use shinglecheck::{build_analyzer, text_statistics, LoggingYamlConfig, ShingleCheckConfig};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: shinglecheck [--config FILE] DOC_ID=PATH...";

/// Analyzes each `DOC_ID=PATH` in order against the configured store and
/// prints one JSON line per document.
///
/// ```bash
/// shinglecheck --config shinglecheck.yaml essay-1=essays/1.txt essay-2=essays/2.txt
/// ```
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config_path, documents) = parse_args(env::args().skip(1))?;

    let config = match &config_path {
        Some(path) => ShingleCheckConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ShingleCheckConfig::default(),
    };
    init_tracing(&config.logging);

    let analyzer = build_analyzer(&config).context("opening fingerprint store")?;
    tracing::info!(
        documents = documents.len(),
        backend = %config.store.backend,
        "shinglecheck_started"
    );

    for (document_id, path) in documents {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let outcome = analyzer
            .analyze(&content, &document_id)
            .await
            .with_context(|| format!("analyzing {document_id}"))?;

        let line = json!({
            "document_id": document_id,
            "persistence": outcome.persistence,
            "report": outcome.report,
            "statistics": text_statistics(&content),
        });
        println!("{}", serde_json::to_string(&line)?);
    }

    Ok(())
}

fn parse_args<I>(args: I) -> anyhow::Result<(Option<PathBuf>, Vec<(String, PathBuf)>)>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config = None;
    let mut documents = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            "-c" | "--config" => {
                let Some(path) = args.next() else {
                    bail!("--config needs a file\n{USAGE}");
                };
                config = Some(PathBuf::from(path));
            }
            _ => match arg.split_once('=') {
                Some((id, path)) if !id.trim().is_empty() && !path.is_empty() => {
                    documents.push((id.trim().to_string(), PathBuf::from(path)));
                }
                _ => bail!("unexpected argument {arg:?}\n{USAGE}"),
            },
        }
    }

    if documents.is_empty() {
        bail!("no documents given\n{USAGE}");
    }
    Ok((config, documents))
}

fn init_tracing(logging: &LoggingYamlConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
