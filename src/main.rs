//! mdbook-tera-block
//!
//! mdBook preprocessor binary: reads `[context, book]` JSON on stdin, writes
//! the transformed book JSON on stdout. Logs go to stderr so the protocol
//! channel stays clean.

use std::io::Read;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdbook-tera-block", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a renderer is supported (mdBook protocol handshake).
    Supports {
        #[allow(dead_code)]
        renderer: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("mdbook_tera_block=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The output is chapter markdown spliced in place, so every renderer is
    // supported.
    if let Some(Command::Supports { .. }) = cli.command {
        return Ok(());
    }

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let output = mdbook_tera_block::preprocessor::run(&input)?;
    println!("{output}");
    Ok(())
}
