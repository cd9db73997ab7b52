use anyhow::{Result, anyhow};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Must be called once, before the
/// mutator is built, otherwise its span is disabled.
pub fn setup_tracing(log_level: &str, log_fmt: &str, log_no_color: bool) -> Result<()> {
    let filter_layer = EnvFilter::builder()
        .parse(log_level)
        .map_err(|e| anyhow!("invalid log level {}: {}", log_level, e))?;
    // some of our dependencies generate trace events too, but we don't care about them ->
    // let's filter them
    let filter_layer = ["h2", "hyper", "rustls", "tower", "tower_http"]
        .iter()
        .try_fold(filter_layer, |filter, target| {
            format!("{target}=off")
                .parse()
                .map(|directive| filter.add_directive(directive))
        })?;

    match log_fmt {
        "json" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().json())
            .try_init()?,
        "text" => tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt::layer().with_ansi(!log_no_color))
            .try_init()?,
        _ => return Err(anyhow!("Unknown log message format: {}", log_fmt)),
    };

    Ok(())
}
