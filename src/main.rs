use nestroute::cli::run_cli;
use nestroute::logging::{init_logging_with_config, LogConfig};

fn main() {
    if let Err(e) = init_logging_with_config(&LogConfig::from_env()) {
        eprintln!("Warning: {e:#}");
    }

    if let Err(e) = run_cli() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
