//! Tracing setup. The subscriber is installed once at startup with default
//! settings and re-targeted after the configuration file was read, so
//! messages emitted while loading it are not lost.

use crate::config::LoggingConfig;

use anyhow::{Context, Result};
use tracing::Subscriber;
use tracing_subscriber::layer::{Layered, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type Output = Box<dyn Layer<Filtered> + Send + Sync>;

/// Changes the level and format of an installed subscriber.
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    output: reload::Handle<Output, Filtered>,
}

impl LogHandle {
    pub fn apply(&self, config: &LoggingConfig) -> Result<()> {
        self.filter
            .reload(build_filter(config))
            .context("Cannot reload log filter")?;
        self.output
            .reload(build_output(config))
            .context("Cannot reload log output")?;
        Ok(())
    }
}

/// Build the subscriber without installing it.
pub fn subscriber(config: &LoggingConfig) -> (impl Subscriber + Send + Sync + 'static, LogHandle) {
    let (filter_layer, filter) = reload::Layer::new(build_filter(config));
    let (output_layer, output) = reload::Layer::new(build_output(config));
    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(output_layer);
    (subscriber, LogHandle { filter, output })
}

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over the
/// configured level. Calling this twice keeps the first subscriber and
/// returns `None`.
pub fn init(config: &LoggingConfig) -> Option<LogHandle> {
    let (subscriber, handle) = subscriber(config);
    match subscriber.try_init() {
        Ok(()) => Some(handle),
        Err(e) => {
            tracing::debug!("Tracing subscriber already installed: {}", e);
            None
        }
    }
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(config)))
}

fn build_output(config: &LoggingConfig) -> Output {
    if config.json {
        Box::new(fmt::layer::<Filtered>().json())
    } else {
        Box::new(fmt::layer::<Filtered>())
    }
}

/// Crate logs at the configured level; audit records are always kept.
fn default_directives(config: &LoggingConfig) -> String {
    format!("headerauth={},audit=info", config.level.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingLevel;
    use tracing::Level;

    #[test]
    fn directives_follow_level() {
        let config = LoggingConfig {
            level: LoggingLevel::Debug,
            json: false,
        };
        assert_eq!(default_directives(&config), "headerauth=debug,audit=info");
        assert!(EnvFilter::try_new(default_directives(&config)).is_ok());
    }

    #[test]
    fn applied_config_changes_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let quiet = LoggingConfig {
            level: LoggingLevel::Error,
            json: false,
        };
        let (subscriber, handle) = subscriber(&quiet);

        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(target: "headerauth", Level::INFO));

            let verbose = LoggingConfig {
                level: LoggingLevel::Debug,
                json: true,
            };
            handle.apply(&verbose).unwrap();
            assert!(tracing::enabled!(target: "headerauth", Level::DEBUG));
        });
    }
}
