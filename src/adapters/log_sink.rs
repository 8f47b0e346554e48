//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production).  Telemetry goes out as a
//! single JSON line so it can be scraped off the serial console.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => match serde_json::to_string(t) {
                Ok(json) => info!("TELEM | {}", json),
                Err(e) => warn!("TELEM | encode failed: {}", e),
            },
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={:?}", state);
            }
            AppEvent::FilterFull { percent } => {
                warn!("FILTER | full at {:.1}%", percent);
            }
            AppEvent::FilterReset => {
                info!("FILTER | usage cleared");
            }
            AppEvent::LedgerDegraded { attempts, error } => {
                warn!("LEDGER | degraded after {} attempts: {}", attempts, error);
            }
            AppEvent::LedgerRecovered => {
                info!("LEDGER | recovered");
            }
            AppEvent::SensorStale { last_read_ms } => {
                warn!("SENSOR | stale, last frame at {} ms", last_read_ms);
            }
        }
    }
}
