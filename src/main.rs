use std::env;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    // Frames go to stdout; logs stay on stderr.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("combat_viewer=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    std::process::exit(combat_viewer::cli::run_with_args(&args));
}
