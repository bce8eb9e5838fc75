use std::fs::File;
use std::sync::Mutex;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{fmt::time, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Installs the global tracing subscriber.
///
/// Output goes to the configured log file without ANSI colors, because the
/// terminal is in raw mode while a demo runs. `RUST_LOG` directives are
/// combined with the configured ones and win where both name the same
/// target. Call once, early.
pub fn init(config: &LogConfig) -> anyhow::Result<()> {
    let file = File::create(&config.file)
        .with_context(|| format!("cannot create log file {}", config.file.display()))?;

    let default_level = if cfg!(debug_assertions) {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(default_level, &config.filter, env.as_deref())?;

    tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_timer(time::uptime())
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}

/// Joins the directive sources in rising precedence: build default, quiet
/// audio backend, config, then `RUST_LOG`. A later directive for the same
/// target replaces an earlier one.
fn build_filter(
    default_level: LevelFilter,
    configured: &str,
    env: Option<&str>,
) -> Result<EnvFilter, ParseError> {
    let default_level = default_level.to_string();
    let directives: Vec<&str> = [default_level.as_str(), "cpal=warn"]
        .into_iter()
        .chain(configured.split(','))
        .chain(env.into_iter().flat_map(|e| e.split(',')))
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .collect();
    EnvFilter::builder().parse(directives.join(","))
}
