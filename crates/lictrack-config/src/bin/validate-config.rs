//! Config validation CLI tool
//!
//! Validates a lictrack configuration file and reports any errors.

use lictrack_util::default_config_path;
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
            eprintln!("Validates a lictrack configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match lictrack_config::load_config(&config_path) {
        Ok(settings) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", lictrack_config::CURRENT_CONFIG_VERSION);
            println!("  Refresh interval: {}s", settings.sync.refresh_interval.as_secs());
            println!("  Warning threshold: {}d", settings.sync.warning_threshold_days);
            println!("  Request timeout: {}s", settings.sync.request_timeout.as_secs());
            println!(
                "  Webhook alerts: {}",
                if settings.notifier.webhook_url.is_some() { "enabled" } else { "disabled" }
            );
            println!("  Instances: {}", settings.directory.len());

            if !settings.directory.is_empty() {
                println!();
                println!("Instances:");
                for instance in settings.directory.iter() {
                    println!(
                        "  - {} [{}]: {}",
                        instance.id, instance.environment, instance.base_url
                    );
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                lictrack_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                lictrack_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                lictrack_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                lictrack_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        lictrack_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
