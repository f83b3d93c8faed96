//! Diagnostics sink injected into extraction sessions
//!
//! Sessions never log on their own; they report lifecycle events to a
//! [`DiagnosticsSink`]. [`LogSink`] forwards them to the `log` facade.

use crate::error::ExtractError;
use std::time::Duration;

/// Lifecycle event of a single extraction session
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticEvent {
    SessionStarted {
        source: String,
    },
    SessionCompleted {
        source: String,
        records: u64,
        /// Wall-clock time from session entry, measured for document stores only
        elapsed: Option<Duration>,
    },
    SessionFailed {
        source: String,
        records: u64,
        error: ExtractError,
    },
    SessionCancelled {
        source: String,
        records: u64,
    },
}

/// Receiver for [`DiagnosticEvent`]s
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);
}

/// Forward diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticsSink for LogSink {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::SessionStarted { source } => {
                log::debug!("Starting extraction from {}", source);
            }
            DiagnosticEvent::SessionCompleted {
                source,
                records,
                elapsed,
            } => match elapsed {
                Some(elapsed) => log::info!(
                    "Extracted {} record(s) from {} in {}",
                    records,
                    source,
                    format_elapsed(elapsed)
                ),
                None => log::info!("Extracted {} record(s) from {}", records, source),
            },
            DiagnosticEvent::SessionFailed {
                source,
                records,
                error,
            } => {
                log::error!(
                    "Extraction from {} failed after {} record(s): {}",
                    source,
                    records,
                    error
                );
            }
            DiagnosticEvent::SessionCancelled { source, records } => {
                log::debug!(
                    "Extraction from {} cancelled after {} record(s)",
                    source,
                    records
                );
            }
        }
    }
}

/// Discard all diagnostics
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}
}

/// Format a duration as `HH:MM:SS.t`
///
/// Hours wrap at 24 and only tenths of a second are kept.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let tenths = (ms % 1000) / 100;
    let seconds = (ms / 1000) % 60;
    let minutes = (ms / (1000 * 60)) % 60;
    let hours = (ms / (1000 * 60 * 60)) % 24;

    format!("{:02}:{:02}:{:02}.{}", hours, minutes, seconds, tenths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "00:00:00.0");
        assert_eq!(format_elapsed(Duration::from_millis(1_999)), "00:00:01.9");
        assert_eq!(
            format_elapsed(Duration::from_millis(3_723_450)),
            "01:02:03.4"
        );
    }

    #[test]
    fn test_format_elapsed_wraps_hours() {
        assert_eq!(
            format_elapsed(Duration::from_secs(25 * 60 * 60)),
            "01:00:00.0"
        );
    }
}
