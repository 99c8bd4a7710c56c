//! Utilities for configuring logging
use std::sync::Once;

use colored::*;
use env_logger::Logger;
use log::Log;
use log::Record;

static ONCE_INIT: Once = Once::new();

/// Environment variable holding an env_logger style filter, e.g. `retrocloud_core::bridge=debug`.
pub const LOG_FILTER_VAR: &str = "RETROCLOUD_LOG";

/// Logger that uses env_logger for filtering and prints a compact, colored one-letter level tag
/// followed by the module the record came from.
struct LauncherLogger {
    logger: Logger,
}

impl LauncherLogger {
    pub fn new(logger: Logger) -> Self {
        log::set_max_level(logger.filter());
        Self { logger }
    }

    fn format_record(record: &Record) -> String {
        let target = record.target().dimmed();
        let message = record.args().to_string();
        match record.level() {
            log::Level::Error => format!("{} {} {}", "E".red().bold(), target, message.red()),
            log::Level::Warn => format!("{} {} {}", "W".yellow().bold(), target, message.yellow()),
            log::Level::Info => format!("{} {} {}", "I".blue().bold(), target, message),
            log::Level::Debug => format!("{} {} {}", "D".blue(), target, message),
            log::Level::Trace => format!("{} {} {}", "T".dimmed(), target, message.dimmed()),
        }
    }
}

impl Log for LauncherLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.logger.matches(record) {
            return;
        }
        eprintln!("{}", Self::format_record(record));
    }

    fn flush(&self) {}
}

fn install(default_filter: &str) {
    ONCE_INIT.call_once(|| {
        let filter_config =
            std::env::var(LOG_FILTER_VAR).unwrap_or_else(|_| default_filter.to_string());
        let filter = env_logger::builder().parse_filters(&filter_config).build();
        // Another logger may already be installed by an embedding application.
        let _ = log::set_boxed_logger(Box::new(LauncherLogger::new(filter)));
    });
}

pub fn init() {
    install("warn");
}

pub fn test_init(verbose: bool) {
    install(if verbose { "debug" } else { "warn" });
}
