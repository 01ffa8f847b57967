use crate::config::ConfigError;
use std::str::FromStr;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::{format::Writer, time::FormatTime};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const CLOCK_FORMAT: &str = "%H:%M:%S%.3f";

/// Local wall-clock time with milliseconds; log lines carry no date.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct WallClock;

impl FormatTime for WallClock {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(CLOCK_FORMAT))
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default level;
/// `verbose` lowers the default to debug.
pub fn init_tracing(verbose: bool) -> Result<(), ConfigError> {
    let default_directive = if verbose { "steer=debug" } else { "steer=info" };
    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_timer(WallClock);
    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(
            EnvFilter::builder()
                .with_default_directive(
                    Directive::from_str(default_directive)
                        .map_err(|_| ConfigError::Internal("Tracing filter"))?,
                )
                .from_env_lossy(),
        )
        .try_init()
        .map_err(|_| ConfigError::Internal("Tracing subscriber"))?;
    Ok(())
}

#[test]
fn test_wall_clock_format() {
    let mut buf = String::new();
    WallClock.format_time(&mut Writer::new(&mut buf)).unwrap();
    assert_eq!(buf.len(), "00:00:00.000".len());
    assert!(chrono::NaiveTime::parse_from_str(&buf, CLOCK_FORMAT).is_ok());
}
