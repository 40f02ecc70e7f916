//! Flowtrace CLI - Generate message-flow documentation from an analyzed type model

mod cli;

use clap::Parser;

fn main() {
    // Parse CLI args first to get logging configuration
    let cli_args = cli::Cli::parse();
    cli::configure_logging(&cli_args);

    let result = cli::FlowtraceApp::from_cli(&cli_args).and_then(|app| app.run(cli_args));
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
