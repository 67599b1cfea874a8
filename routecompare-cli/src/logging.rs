//! Log setup. Records go to stderr as one JSON object per line so stdout
//! stays free for the progress stream.

use std::io::Write;

use env_logger::{Builder, Target};
use log::Level;
use serde_json::json;

/// Variable holding the log filter, e.g. `debug` or `routecompare_data=warn`.
pub(crate) const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Install the global logger. Later calls are ignored.
pub(crate) fn init() {
    let filter = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_owned());
    let installed = Builder::new()
        .parse_filters(&filter)
        .target(Target::Stderr)
        .format(|buf, record| {
            let line = format_line(record.level(), record.target(), &record.args().to_string());
            writeln!(buf, "{line}")
        })
        .try_init();
    if installed.is_err() {
        log::debug!("logger already installed");
    }
}

fn format_line(level: Level, target: &str, message: &str) -> String {
    json!({
        "level": level.as_str(),
        "target": target,
        "message": message,
    })
    .to_string()
}
