//! tracing subscriber setup: console layer plus an optional JSON-lines file.

use std::path::Path;

use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

/// Install the global subscriber.
///
/// Console output goes to stderr so stdout carries only command output.
/// `RUST_LOG` wins over `level`. The file layer logs JSON lines at the
/// config's `logging.level` (default info).
pub fn init(level: &str, json: bool, cfg: &airsense_config::Logging) -> eyre::Result<()> {
    let console_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let console = if json {
        fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(console_filter)
            .boxed()
    };

    let file = match cfg.file.as_deref() {
        Some(path) => {
            let appender = rolling_appender(Path::new(path), cfg.rotation.as_deref())?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let file_filter = EnvFilter::try_new(cfg.level.as_deref().unwrap_or("info"))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()?;
    Ok(())
}

fn rolling_appender(
    path: &Path,
    rotation: Option<&str>,
) -> eyre::Result<tracing_appender::rolling::RollingFileAppender> {
    use tracing_appender::rolling;

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .ok_or_else(|| eyre::eyre!("invalid configuration: logging.file has no file name"))?;
    Ok(match rotation.unwrap_or("never") {
        "daily" => rolling::daily(dir, name),
        "hourly" => rolling::hourly(dir, name),
        _ => rolling::never(dir, name),
    })
}
