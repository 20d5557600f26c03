mod cli;
mod config;

use std::process;

use flexcreek::Storage;
use tracing_subscriber::EnvFilter;

use config::Config;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    init_logging(&config);

    let Some(path) = config.database.clone().or_else(Storage::default_path) else {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    };

    let storage = match Storage::new(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&storage) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to stderr so stdout stays clean for JSON output.
fn init_logging(config: &Config) {
    let default = config.log_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
