//! tabscribe CLI entry point

use clap::Parser;
use std::process::ExitCode;
use tabscribe::client::HttpBackend;
use tabscribe::config::{Cli, Settings};
use tabscribe::pipeline;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);

    // Build settings from CLI
    let settings = Settings::from_cli(&cli);

    // Validate inputs
    if let Err(e) = validate_inputs(&settings) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let backend = match HttpBackend::new(&settings.server_url, settings.timeout) {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Run the pipeline
    match pipeline::run(&settings, &backend) {
        Ok(result) => {
            print!("{}", result.display);

            if let Some(path) = &result.text_path {
                println!("✓ Wrote tab to {}", path.display());
            }
            if let Some(path) = &result.json_path {
                println!("✓ Wrote analysis to {}", path.display());
            }
            if result.total_measures > 0 {
                println!(
                    "Showing {} of {} measures",
                    result.shown_measures, result.total_measures
                );
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_validation() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_inputs(settings: &Settings) -> Result<(), String> {
    settings.validate().map_err(|e| {
        format!(
            "{}\n\n  Examples:\n    tabscribe -i ./song.mp3 -o ./tabs\n    tabscribe --from-json ./tabs/song.json --regenerate --capo 2",
            e
        )
    })?;

    // Check output parent directory exists (we'll create the output dir itself)
    if let Some(output) = &settings.output {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                return Err(format!(
                    "Output parent directory does not exist: {}\n\n  Tip: The output directory will be created automatically,\n  but its parent directory must exist.\n  Example: mkdir -p {}",
                    parent.display(),
                    parent.display()
                ));
            }
        }
    }

    Ok(())
}
