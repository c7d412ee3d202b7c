//! Progress bar for interactive runs, driven by pipeline events.

use std::time::Duration;

use docket_fetch::{EventSink, FetchEvent, TracingSink};
use indicatif::{ProgressBar, ProgressStyle};

/// Shows a spinner during discovery and a bar during retrieval, and forwards
/// every event to [`TracingSink`] without tearing the bar.
pub(crate) struct ProgressSink {
    bar: ProgressBar,
    inner: TracingSink,
}

impl ProgressSink {
    pub(crate) fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(100));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Self {
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message("Scanning listing pages...");
        Self {
            bar,
            inner: TracingSink,
        }
    }

    pub(crate) fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl EventSink for ProgressSink {
    fn emit(&self, event: &FetchEvent) {
        self.bar.suspend(|| self.inner.emit(event));

        match event {
            FetchEvent::YearScanned { year, .. } | FetchEvent::YearUnavailable { year, .. } => {
                self.bar.set_message(format!("Scanned {year}"));
            }
            FetchEvent::DiscoveryComplete { total } => {
                self.bar.set_style(
                    ProgressStyle::with_template("{spinner} [{pos}/{len}] {bar:30} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_bar()),
                );
                self.bar.set_length(u64::try_from(*total).unwrap_or(u64::MAX));
                self.bar.set_position(0);
                self.bar.set_message("Downloading...");
            }
            FetchEvent::DocumentSaved { .. }
            | FetchEvent::DocumentSkipped { .. }
            | FetchEvent::DocumentFailed { .. } => self.bar.inc(1),
        }
    }
}
