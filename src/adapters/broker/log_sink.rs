//! Broker log sink adapter forwarding to `tracing`.

use std::process;

use tracing::{debug, error, info, trace, warn};

use crate::ports::BrokerLogSink;

/// Forwards broker lifecycle callbacks to the host's structured logging.
///
/// `fatal` terminates the process with a non-zero exit code, since the
/// broker reports fatal conditions but does not exit itself.
pub struct TracingLogSink;

impl TracingLogSink {
    /// Creates the sink, shared-ready for the broker.
    pub fn shared() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self)
    }
}

impl BrokerLogSink for TracingLogSink {
    fn notice(&self, msg: &str) {
        info!(component = "broker", "{msg}");
    }

    fn warn(&self, msg: &str) {
        warn!(component = "broker", "{msg}");
    }

    fn error(&self, msg: &str) {
        error!(component = "broker", "{msg}");
    }

    fn fatal(&self, msg: &str) {
        error!(component = "broker", fatal = true, "{msg}");
        process::exit(1);
    }

    fn debug(&self, msg: &str) {
        debug!(component = "broker", "{msg}");
    }

    fn trace(&self, msg: &str) {
        trace!(component = "broker", "{msg}");
    }
}
