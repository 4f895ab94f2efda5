//! Operations context for dependency injection

use std::sync::Arc;

use mirrorcheck_config::Config;
use mirrorcheck_errors::Error;
use mirrorcheck_events::{EventEmitter, EventSender};

use crate::ReportSink;

/// Everything a check run needs from its caller
pub struct CheckContext {
    /// Effective configuration
    pub config: Config,
    /// Event sender for progress reporting
    pub tx: EventSender,
    /// Destination of report lines
    pub sink: Arc<dyn ReportSink>,
}

impl EventEmitter for CheckContext {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

/// Builder for [`CheckContext`]
#[derive(Default)]
pub struct CheckContextBuilder {
    config: Option<Config>,
    tx: Option<EventSender>,
    sink: Option<Arc<dyn ReportSink>>,
}

impl CheckContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set report sink
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Build the context. A missing configuration falls back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the event sender or report sink is missing.
    pub fn build(self) -> Result<CheckContext, Error> {
        let tx = self
            .tx
            .ok_or_else(|| Error::internal("check context is missing its event sender"))?;

        let sink = self
            .sink
            .ok_or_else(|| Error::internal("check context is missing its report sink"))?;

        Ok(CheckContext {
            config: self.config.unwrap_or_default(),
            tx,
            sink,
        })
    }
}
