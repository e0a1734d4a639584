use clap::Parser;
use savings_projection::cli::{Cli, Command, run_project};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    init_tracing();

    match Cli::parse().command {
        Command::Serve(args) => {
            if let Err(e) = savings_projection::api::run_http_server(args.socket_addr()).await {
                tracing::error!(error = %e, "server error");
                std::process::exit(1);
            }
        }
        Command::Project(args) => match run_project(&args) {
            Ok(output) => print!("{output}"),
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        },
    }
}

/// Logs go to stderr so `project` output stays pipeable. `RUST_LOG` overrides
/// the default `info` filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
