//! weft command-line interface.
//!
//! Thin binary over the library crates: parse arguments, initialize
//! tracing to stderr, dispatch to a command, and map failures to exit
//! codes. Stdout is reserved for command output so generated-file lists
//! and format listings stay pipeable.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;
mod commands;

use cli::{LogLevel, exit_code_for, render_error};
use tracing_subscriber::EnvFilter;

fn main() {
    // Tracing infrastructure may be corrupted during a panic, so the hook
    // uses the most reliable output method.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with --level debug for more information.");
    }));

    let cli = cli::parse();
    if let Err(error) = init_tracing(cli.level) {
        eprintln!("Failed to initialize tracing: {error}");
    }

    if let Err(error) = commands::run(&cli) {
        render_error(&error);
        std::process::exit(exit_code_for(&error));
    }
}

/// Initialize tracing to stderr. `RUST_LOG` overrides the `--level` flag
/// when set.
fn init_tracing(level: LogLevel) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        let directive = level.as_str();
        EnvFilter::try_new(format!(
            "weft={directive},weft_core={directive},weft_ci={directive},weft_github={directive},weft_sourcehut={directive}"
        ))
    })?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()?;
    Ok(())
}
