use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chatwire_client::{manifest_from_response, ClientConfig, ManifestClient};
use chatwire_protocol::{Decoder, ManifestDocument};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: chatwire-decode (--manifest <file> | --room <id>) \
[--config <file>] [--version-key <version>] [--pretty]";

/// Command-line arguments.
#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    manifest: Option<PathBuf>,
    room: Option<String>,
    config: Option<PathBuf>,
    version_key: Option<String>,
    pretty: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> anyhow::Result<Args> {
    let mut args = args.into_iter();
    let mut parsed = Args::default();

    while let Some(arg) = args.next() {
        let mut value = || {
            args.next()
                .with_context(|| format!("{arg} expects a value\n{USAGE}"))
        };
        match arg.as_str() {
            "--manifest" => parsed.manifest = Some(PathBuf::from(value()?)),
            "--room" => parsed.room = Some(value()?),
            "--config" => parsed.config = Some(PathBuf::from(value()?)),
            "--version-key" => parsed.version_key = Some(value()?),
            "--pretty" => parsed.pretty = true,
            other => bail!("unknown argument {other}\n{USAGE}"),
        }
    }

    if parsed.manifest.is_some() == parsed.room.is_some() {
        bail!("exactly one of --manifest or --room is required\n{USAGE}");
    }
    Ok(parsed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(version) = args.version_key.clone() {
        config.manifest_version = version;
    }

    let decoder = if let Some(path) = &args.manifest {
        let bytes =
            std::fs::read(path).with_context(|| format!("reading manifest {}", path.display()))?;
        let document = load_manifest(&bytes)
            .with_context(|| format!("parsing manifest {}", path.display()))?;
        Decoder::with_version(Arc::new(document), &config.manifest_version)?
    } else if let Some(room) = &args.room {
        ManifestClient::from_config(config)
            .create_decoder(room)
            .await
            .with_context(|| format!("fetching parser manifest for room {room}"))?
    } else {
        bail!(USAGE);
    };

    tracing::info!(version = decoder.version(), "decoder ready, reading messages from stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let summary = decode_stream(&decoder, stdin.lock(), stdout.lock(), args.pretty)?;

    tracing::info!(
        decoded = summary.decoded,
        skipped = summary.skipped,
        "input exhausted"
    );
    Ok(())
}

/// A manifest file holds either the bare document or a saved room response.
fn load_manifest(bytes: &[u8]) -> anyhow::Result<ManifestDocument> {
    let value: Value = serde_json::from_slice(bytes)?;
    if value.get("parserManifests").is_some() {
        return Ok(manifest_from_response(bytes)?);
    }
    Ok(ManifestDocument::from_value(value)?)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    decoded: usize,
    skipped: usize,
}

/// Decode one raw message per input line, writing one JSON object per line.
///
/// Lines that fail to decode are logged and skipped.
fn decode_stream(
    decoder: &Decoder,
    input: impl BufRead,
    mut output: impl Write,
    pretty: bool,
) -> anyhow::Result<Summary> {
    let mut summary = Summary::default();

    for (number, line) in input.lines().enumerate() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        match decoder.decode_str(&line) {
            Ok(message) => {
                if pretty {
                    serde_json::to_writer_pretty(&mut output, &message)?;
                } else {
                    serde_json::to_writer(&mut output, &message)?;
                }
                writeln!(output)?;
                summary.decoded += 1;
            }
            Err(e) => {
                tracing::warn!(line = number + 1, error = %e, "skipping undecodable message");
                summary.skipped += 1;
            }
        }
    }

    output.flush()?;
    Ok(summary)
}
