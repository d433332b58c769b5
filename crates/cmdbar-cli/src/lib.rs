pub mod cli;
pub mod commands;
pub mod utils;

use clap::Parser;
use cli::Cmdbar;
use commands::handle_command;
use std::process;

/// Run the cmdbar CLI application
pub fn run_main() {
    init_tracing();

    let args = Cmdbar::parse();
    let result = handle_command(args.commands);

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Log to a file in the config directory when CMDBAR_LOG is set.
///
/// File logging keeps diagnostics out of the alternate-screen UI.
fn init_tracing() {
    let Ok(filter) = std::env::var("CMDBAR_LOG") else {
        return;
    };

    let log_path = cmdbar_core::get_config_dir().join("cmdbar.log");
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::File::create(&log_path) else {
        eprintln!("Failed to create log file at {}", log_path.display());
        return;
    };

    tracing_subscriber::fmt()
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::sync::Arc::new(file))
        .init();
}
