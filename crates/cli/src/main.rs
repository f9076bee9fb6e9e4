use std::process::ExitCode;

use pengadaan_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use pengadaan_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn main() -> ExitCode {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config);

    pengadaan_cli::run()
}
