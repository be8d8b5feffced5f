use std::io;
use tracing_subscriber::{fmt, EnvFilter};

/// Output format of the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable single line per event.
    Compact,
    /// One JSON object per line for container log collectors.
    Json,
}

impl LogFormat {
    /// `json` (any case) selects JSON; unset or anything else is compact.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Compact,
        }
    }

    /// Filter used when `RUST_LOG` is unset.
    pub fn default_filter(self) -> &'static str {
        match self {
            Self::Compact => "info,tower_http=info,axum=info",
            // 结构化日志下默认打开 store 层的 debug，便于排查后端调用
            Self::Json => "info,service::store=debug",
        }
    }
}

/// Install the global subscriber writing to stdout.
///
/// `RUST_LOG` wins over the format's default filter. Calling this twice is
/// harmless: the second install is ignored.
pub fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format.default_filter()));
    let builder = fmt().with_env_filter(env_filter).with_target(false).with_writer(io::stdout);
    let installed = match format {
        LogFormat::Compact => builder.compact().try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };
    if installed {
        tracing::debug!(?format, "tracing subscriber installed");
    }
}

/// Pick the format from `LOG_FORMAT` and install it.
pub fn init_logging_from_env() {
    let setting = std::env::var("LOG_FORMAT").ok();
    init_logging(LogFormat::from_setting(setting.as_deref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_selected_only_by_its_name() {
        assert_eq!(LogFormat::from_setting(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_setting(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::from_setting(Some("compact")), LogFormat::Compact);
        assert_eq!(LogFormat::from_setting(Some("")), LogFormat::Compact);
        assert_eq!(LogFormat::from_setting(None), LogFormat::Compact);
    }

    #[test]
    fn default_filters_parse() {
        for format in [LogFormat::Compact, LogFormat::Json] {
            assert!(EnvFilter::try_new(format.default_filter()).is_ok());
        }
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init_logging(LogFormat::Json);
        init_logging(LogFormat::Compact);
    }
}
