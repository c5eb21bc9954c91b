//! Observability and diagnostics for the subtraction, matching and grooming stages.
//!
//! Logging goes through the `log` facade everywhere in the crate. Applications
//! that want to see it call [`init_logging`], which installs an `env_logger`
//! backend exactly once. The `log_metric!` macro is a structured key-value hook
//! compiled out of release builds.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::sync::Once;

use crate::error::HiJetError;

/// Logs a structured key-value metric line at debug level, only in debug builds.
///
/// # Example
/// ```
/// use hijet::log_metric;
/// let n_jets = 4;
/// log_metric!("event"="subtraction", "n_jets"=&n_jets);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("HIJET_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

static INIT_LOGGER: Once = Once::new();

/// Installs the global `env_logger` backend.
///
/// Only the first call has an effect. When `log_file` is given, records are
/// appended to that file instead of stderr.
pub fn init_logging(level: LevelFilter, log_file: Option<&str>) -> Result<(), HiJetError> {
    let target = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();
        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())
        });

        if let Some(file) = target {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        let _ = builder.try_init();
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(LevelFilter::Debug, None).unwrap();
        init_logging(LevelFilter::Trace, None).unwrap();
        log_metric!("event" = "logging_test", "n" = 1);
    }

    #[test]
    fn test_unwritable_log_file_is_io_error() {
        let err = init_logging(LevelFilter::Info, Some("/nonexistent-dir/hijet.log")).unwrap_err();
        assert!(matches!(err, HiJetError::Io(_)));
    }
}
