//! Where the log level and format come from.
//!
//! Level precedence, highest first: `-q`/`-v`/`--log-level`, `AW_LOG`, then
//! raw `RUST_LOG` directives, then `info`. `RUST_LOG` is only consulted when
//! nothing above it picked a level, so `-q` always silences the run.

use clap::ValueEnum;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const ENV_LEVEL: &str = "AW_LOG";
const ENV_FORMAT: &str = "AW_LOG_FORMAT";
const ENV_DIRECTIVES: &str = "RUST_LOG";

/// stderr log encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Human,
    /// One JSON object per event.
    #[value(alias = "json")]
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    #[value(alias = "warning")]
    Warn,
    Error,
    #[value(alias = "quiet")]
    Off,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Resolved logging setup for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// `RUST_LOG` directives, kept only when no explicit level was given.
    pub directives: Option<String>,
}

impl LogConfig {
    /// Resolve from the process environment and CLI flags.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::resolve(cli_level, cli_format, |key| std::env::var(key).ok())
    }

    /// Resolve against an arbitrary variable lookup. Unparseable `AW_LOG`
    /// and `AW_LOG_FORMAT` values count as unset.
    pub fn resolve<F>(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_level = env(ENV_LEVEL).and_then(|v| LogLevel::from_str(v.trim(), true).ok());
        let env_format = env(ENV_FORMAT).and_then(|v| LogFormat::from_str(v.trim(), true).ok());

        let (level, directives) = match cli_level.or(env_level) {
            Some(level) => (level, None),
            None => (
                LogLevel::default(),
                env(ENV_DIRECTIVES).filter(|d| !d.trim().is_empty()),
            ),
        };

        LogConfig {
            format: cli_format.or(env_format).unwrap_or_default(),
            level,
            directives,
        }
    }

    /// The subscriber filter. Invalid `RUST_LOG` directives fall back to
    /// the resolved level.
    pub fn filter(&self) -> EnvFilter {
        self.directives
            .as_deref()
            .and_then(|d| EnvFilter::try_new(d).ok())
            .unwrap_or_else(|| EnvFilter::new(self.level.as_str()))
    }
}
