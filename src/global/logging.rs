use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use super::config::{AppSettings, LogRotation};

impl From<LogRotation> for Rotation {
    fn from(rotation: LogRotation) -> Self {
        match rotation {
            LogRotation::Daily => Rotation::DAILY,
            LogRotation::Hourly => Rotation::HOURLY,
            LogRotation::Never => Rotation::NEVER,
        }
    }
}

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mongo_bundle={},info", log_level).into())
}

/// Install the global subscriber. Keep the returned guard alive for as long
/// as file logging should flush.
pub fn init(settings: &AppSettings) -> Option<WorkerGuard> {
    let logging = &settings.logging;

    let console = logging.log_to_console.then(|| {
        if logging.json {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        }
    });

    let (file, guard) = if logging.log_to_file {
        let appender = RollingFileAppender::new(
            logging.log_rotation.into(),
            &logging.log_directory,
            &logging.log_file_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(writer)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter(&settings.log_level))
        .with(console)
        .with(file)
        .init();

    guard
}
