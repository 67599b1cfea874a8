//! Progress events rendered as JSON lines.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use log::warn;
use routecompare_core::{ProgressEvent, ProgressSink};
use serde::Serialize;

#[derive(Serialize)]
#[serde(tag = "type", rename = "progress")]
struct ProgressLine<'a> {
    progress: u8,
    message: &'a str,
}

/// Writes `{"type":"progress","progress":N,"message":...}` per event and
/// flushes after each line.
pub(crate) struct JsonLinesProgress<W> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesProgress<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Release the wrapped writer.
    pub(crate) fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> ProgressSink for JsonLinesProgress<W> {
    fn report(&self, event: &ProgressEvent) {
        let line = ProgressLine {
            progress: event.percent(),
            message: &event.message,
        };
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let written = serde_json::to_writer(&mut *writer, &line)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"))
            .and_then(|()| writer.flush());
        if let Err(err) = written {
            warn!("failed to write progress event: {err}");
        }
    }
}
