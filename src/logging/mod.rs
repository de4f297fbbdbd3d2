/*!
 * Logging Module
 * Subscriber setup: rolling files plus console, JSON in production
 */
pub mod middleware;

use std::io;
use std::path::Path;

use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Settings;

const LOG_DIR: &str = "logs";

/// Flushes the background writers when dropped. Hold it for the lifetime of
/// the server.
#[must_use = "dropping the guards stops the log writers"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

/// Default filter directive when neither `RUST_LOG` nor `LOG_LEVEL` says
/// otherwise.
pub fn default_directive(settings: &Settings, log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or(if settings.is_production() { "info" } else { "debug" });
    format!("wedding_backend={},tower_http=info,sqlx=warn", level)
}

/// Initialize the logging system
pub fn init(settings: &Settings) -> LogGuards {
    if let Err(e) = std::fs::create_dir_all(LOG_DIR) {
        eprintln!("cannot create {}: {}", Path::new(LOG_DIR).display(), e);
    }

    let (file_writer, file_guard) = non_blocking(rolling::daily(LOG_DIR, "app.log"));
    let (console_writer, console_guard) = non_blocking(io::stdout());

    let log_level = std::env::var("LOG_LEVEL").ok();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(settings, log_level.as_deref())));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let mut guards = vec![file_guard, console_guard];

    if settings.is_production() {
        let (error_writer, error_guard) = non_blocking(rolling::daily(LOG_DIR, "error.log"));
        guards.push(error_guard);

        let file_layer = fmt::layer()
            .json()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);

        let error_layer = fmt::layer()
            .json()
            .with_writer(error_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);

        let console_layer = fmt::layer()
            .json()
            .with_writer(console_writer)
            .with_target(false);

        // try_init: a second call (tests, embedding) keeps the first subscriber
        let _ = subscriber
            .with(file_layer)
            .with(error_layer)
            .with(console_layer)
            .try_init();
    } else {
        let file_layer = fmt::layer()
            .with_writer(file_writer)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false);

        let console_layer = fmt::layer()
            .with_writer(console_writer)
            .with_target(true)
            .pretty();

        let _ = subscriber.with(file_layer).with(console_layer).try_init();
    }

    tracing::info!(environment = %settings.environment, "logging initialized");
    LogGuards { _guards: guards }
}
