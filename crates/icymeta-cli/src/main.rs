//! icymeta CLI — print the current title of an ICY stream

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use icymeta::{get_current_stream_title, CancelToken};

#[derive(Parser)]
#[command(name = "icymeta", about = "Print the current track title of an ICY stream", version)]
struct Cli {
    /// Stream URL
    url: String,

    /// Give up after this many seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = cancel_token(cli.timeout);

    match get_current_stream_title(&cancel, &cli.url) {
        Ok(title) => {
            println!("{title}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error ({}): {}", e.phase(), e);
            ExitCode::FAILURE
        }
    }
}

fn cancel_token(timeout: Option<u64>) -> CancelToken {
    let cancel = CancelToken::new();
    match timeout {
        Some(secs) => cancel.with_timeout(Duration::from_secs(secs)),
        None => cancel,
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
