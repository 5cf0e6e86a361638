//! Process-wide tracing setup.
//!
//! The subscriber is installed before configuration is read so config
//! loading can log. `RUST_LOG` wins when set; otherwise the built-in filter
//! is used until [`LogFilter::apply`] swaps in the configured one.

use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use oceanyx_config::LoggingConfig;

/// Handle to the live log filter.
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Replace the filter with `directives` unless `RUST_LOG` chose it.
    /// Returns whether the filter changed.
    pub fn apply(&self, directives: &str) -> anyhow::Result<bool> {
        if self.from_env {
            return Ok(false);
        }
        self.handle.reload(EnvFilter::new(directives))?;
        Ok(true)
    }
}

/// Reloadable filter layer, seeded from `RUST_LOG` or the default filter.
pub fn filter_layer(env: Option<EnvFilter>) -> (reload::Layer<EnvFilter, Registry>, LogFilter) {
    let from_env = env.is_some();
    let initial = env.unwrap_or_else(|| EnvFilter::new(LoggingConfig::default().filter));
    let (layer, handle) = reload::Layer::new(initial);
    (layer, LogFilter { handle, from_env })
}

/// Install the global subscriber.
pub fn init() -> LogFilter {
    let (filter, handle) = filter_layer(EnvFilter::try_from_default_env().ok());
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
    handle
}
