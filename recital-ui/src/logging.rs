//! Tracing subscriber setup
//!
//! The subscriber is installed before the config file is read so that config
//! warnings are visible. It starts from `RUST_LOG`, the `--log-level` flag or
//! `info`; once the config is loaded its `[logging] level` replaces the
//! bootstrap filter unless `RUST_LOG` or the flag pinned one.

use tracing::{warn, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

pub const DEFAULT_LEVEL: &str = "info";

/// Filter covering both workspace crates at `level`
pub fn crate_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("recital_ui={level},recital_common={level}"))
}

/// Handle to swap the bootstrap filter for the configured one
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned: bool,
}

impl LogFilter {
    /// True when `RUST_LOG` or `--log-level` chose the filter
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    pub fn apply_config_level(&self, level: &str) {
        if self.pinned {
            return;
        }
        if let Err(e) = self.handle.reload(crate_filter(level)) {
            warn!("Failed to apply configured log level {}: {}", level, e);
        }
    }
}

/// Build the subscriber without installing it
pub fn build_subscriber<W>(
    env_filter: Option<EnvFilter>,
    cli_level: Option<&str>,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogFilter)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let pinned = env_filter.is_some() || cli_level.is_some();
    let bootstrap =
        env_filter.unwrap_or_else(|| crate_filter(cli_level.unwrap_or(DEFAULT_LEVEL)));
    let (filter, handle) = reload::Layer::new(bootstrap);

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));

    (subscriber, LogFilter { handle, pinned })
}

/// Install the global subscriber, logging to stderr
pub fn init(cli_level: Option<&str>) -> LogFilter {
    let (subscriber, filter) = build_subscriber(
        EnvFilter::try_from_default_env().ok(),
        cli_level,
        std::io::stderr,
    );
    subscriber.init();
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use recital_common::config::load_config;
    use std::io;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_missing_config_file_warning_is_logged() {
        let captured = Captured::default();
        let sink = captured.clone();
        let (subscriber, filter) = build_subscriber(None, None, move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            let config = load_config(Some(Path::new("/nonexistent/recital/config.toml")))
                .unwrap();
            filter.apply_config_level(&config.logging.level);
        });

        let text = captured.text();
        assert!(text.contains("not found, using compiled defaults"), "{}", text);
        assert!(!filter.is_pinned());
    }

    #[test]
    fn test_config_level_replaces_bootstrap_filter() {
        let captured = Captured::default();
        let sink = captured.clone();
        let (subscriber, filter) = build_subscriber(None, None, move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("before config");
            filter.apply_config_level("debug");
            tracing::debug!("after config");
        });

        let text = captured.text();
        assert!(!text.contains("before config"));
        assert!(text.contains("after config"));
    }

    #[test]
    fn test_cli_level_is_not_overridden() {
        let captured = Captured::default();
        let sink = captured.clone();
        let (subscriber, filter) = build_subscriber(None, Some("warn"), move || sink.clone());

        tracing::subscriber::with_default(subscriber, || {
            filter.apply_config_level("debug");
            tracing::info!("suppressed");
            tracing::warn!("shown");
        });

        let text = captured.text();
        assert!(filter.is_pinned());
        assert!(!text.contains("suppressed"));
        assert!(text.contains("shown"));
    }
}
