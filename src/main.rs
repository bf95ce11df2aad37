use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustysum::{
    api,
    config::{self, SummaryMethod},
    logging,
    processing::{CancelSignal, SummarizeError, Summarizer, to_bullets, write_artifact},
    sources::{SourceAdapter, StdinSource, TextFileSource, WebpageSource},
};
use std::{path::PathBuf, sync::Arc};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "rustysum",
    version,
    about = "Condense long-form text into a plain-language summary"
)]
struct Cli {
    /// Backend to use: `remote` (hosted chat completion) or `local` (Ollama).
    #[arg(long, global = true)]
    method: Option<SummaryMethod>,
    /// Override the chunk packing bound for the selected backend.
    #[arg(long, global = true)]
    max_chunk_length: Option<usize>,
    /// Render the summary as a bullet list.
    #[arg(long, global = true)]
    bullets: bool,
    /// Write the summary to this file instead of stdout.
    #[arg(long, global = true)]
    output: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize a UTF-8 text file.
    Text {
        #[arg(long)]
        path: PathBuf,
    },
    /// Summarize everything read from standard input.
    Stdin,
    /// Summarize the visible text of a web page.
    Web {
        #[arg(long)]
        url: String,
    },
    /// Serve the HTTP API.
    Serve,
}

#[tokio::main]
async fn main() {
    logging::init_tracing();
    if let Err(err) = run(Cli::parse()).await {
        report(&err);
        std::process::exit(1);
    }
}

fn report(err: &anyhow::Error) {
    match err.downcast_ref::<SummarizeError>() {
        Some(error) => match error.chunk_index() {
            Some(index) => eprintln!("error ({:?}, chunk {index}): {error}", error.kind()),
            None => eprintln!("error ({:?}): {error}", error.kind()),
        },
        None => eprintln!("error: {err:#}"),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::load_config().map_err(SummarizeError::from)?;
    if let Some(method) = cli.method {
        config = config.with_method(method);
    }
    if let Some(max_chunk_length) = cli.max_chunk_length {
        config = config.with_max_chunk_length(max_chunk_length);
    }

    let summarizer = Summarizer::from_config(&config)?;
    let source: Box<dyn SourceAdapter> = match cli.command {
        Command::Serve => return serve(summarizer, config.server_port).await,
        Command::Text { path } => Box::new(TextFileSource::new(path)),
        Command::Stdin => Box::new(StdinSource),
        Command::Web { url } => Box::new(WebpageSource::new(url).map_err(SummarizeError::from)?),
    };

    let cancel = CancelSignal::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received; cancelling summarization");
                cancel.cancel();
            }
        })
    };
    let outcome = summarizer.summarize_source(source.as_ref(), &cancel).await;
    interrupt.abort();
    let outcome = outcome?;

    let rendered = if cli.bullets {
        to_bullets(&outcome.summary)
    } else {
        outcome.summary
    };
    match cli.output {
        Some(path) => write_artifact(&path, &rendered)
            .await
            .with_context(|| format!("failed to write summary to {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}

async fn serve(summarizer: Summarizer, port: Option<u16>) -> Result<()> {
    let app = api::create_router(Arc::new(summarizer));
    let (listener, port) = bind_listener(port)
        .await
        .context("failed to bind listener")?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn bind_listener(port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 4100..=4199;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 4100-4199",
    ))
}
