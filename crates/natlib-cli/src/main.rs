//! Diagnostic CLI printing the canonical platform tokens natlib uses when
//! composing bundled resource paths.
//!
//! Output is bare and newline-free so it can be spliced into packaging
//! scripts: `bundle/native/$(natlib)/libfoo.so`.

use std::io::Write;

use anyhow::Result;
use clap::Parser;
use natlib::{Platform, ShellAbiProbe};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "natlib", version, about = "Print canonical native-library platform tokens")]
struct Cli {
    /// Print only the OS token
    #[arg(long)]
    os: bool,

    /// Print only the architecture token
    #[arg(long)]
    arch: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let platform = Platform::current(&ShellAbiProbe);

    let mut stdout = std::io::stdout();
    // --os takes precedence when both flags are given.
    if cli.os {
        write!(stdout, "{}", platform.os())?;
    } else if cli.arch {
        write!(stdout, "{}", platform.arch())?;
    } else {
        write!(stdout, "{platform}")?;
    }
    stdout.flush()?;
    Ok(())
}
