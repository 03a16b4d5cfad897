mod chat;
mod evidence;
mod llm;
mod session;
mod sources;
mod text;

pub const USER_AGENT: &str = concat!("sleuth/", env!("CARGO_PKG_VERSION"));

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use chat::{Args, Assistant};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let directive = if args.verbose {
        "sleuth=debug"
    } else {
        "sleuth=warn"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    info!(model = %args.model, "starting sleuth");

    let mut assistant = Assistant::from_args(&args)
        .inspect_err(|e| tracing::error!("failed to build HTTP client: {e}"))?;
    let mut stdout = std::io::stdout();

    match args.question.as_deref() {
        Some(question) => assistant.ask(question, &mut stdout).await?,
        None => {
            assistant
                .run(BufReader::new(tokio::io::stdin()), &mut stdout)
                .await?
        }
    }

    info!("sleuth stopped");
    Ok(())
}
