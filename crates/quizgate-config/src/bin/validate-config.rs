//! Config validation CLI tool
//!
//! Validates a quizgate configuration file and reports any errors.

use quizgate_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a quizgate configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config config.example.toml");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match quizgate_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", quizgate_config::CURRENT_CONFIG_VERSION);
            println!(
                "  Session: {} (warn {} before, idle limit {})",
                format_duration(settings.session.session_duration),
                format_duration(settings.session.warning_threshold),
                format_duration(settings.session.inactivity_timeout)
            );
            println!("  Pages: login={} home={}", settings.pages.login, settings.pages.home);
            println!("  Panels: {}", settings.panels.len());

            if !settings.panels.is_empty() {
                println!();
                println!("Panels:");
                for panel in &settings.panels {
                    let timer = match panel.duration_seconds {
                        Some(secs) => format!("{}s timer", secs),
                        None => "no timer".to_string(),
                    };
                    println!("  - {} [{}]: {}", panel.id, timer, panel.label);
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                quizgate_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                quizgate_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                quizgate_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                quizgate_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        quizgate_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
