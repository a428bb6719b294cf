use std::io::{self, Write};

use serde::Serialize;
use tracing::info;

use crate::app::{ConvertReport, ProgressEvent, ProgressSink};
use crate::store::Listing;

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_report(report: &ConvertReport) -> io::Result<()> {
        Self::print_json(report)
    }

    pub fn print_listing(listing: &Listing) -> io::Result<()> {
        Self::print_json(listing)
    }

    pub fn print_images(images: &[String]) -> io::Result<()> {
        Self::print_json(&images)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Forwards progress events to the tracing subscriber.
pub struct LogSink;

impl ProgressSink for LogSink {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => info!(elapsed_ms = elapsed.as_millis() as u64, "{}", event.message),
            None => info!("{}", event.message),
        }
    }
}
