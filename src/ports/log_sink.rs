//! Broker log sink port.
//!
//! The broker reports its internal lifecycle through a pluggable sink with
//! severity-named callbacks rather than logging directly. The host wires in
//! an adapter that forwards to its own logging facility.

/// Severity-named logging callbacks the broker invokes.
///
/// `fatal` must terminate the process: the broker reports the condition but
/// does not exit on its own.
pub trait BrokerLogSink: Send + Sync {
    /// Normal lifecycle notices (startup, shutdown).
    fn notice(&self, msg: &str);

    /// Recoverable anomalies.
    fn warn(&self, msg: &str);

    /// Errors the broker survived.
    fn error(&self, msg: &str);

    /// Unrecoverable conditions. Implementations must not return control
    /// to the broker expecting it to continue.
    fn fatal(&self, msg: &str);

    /// Verbose diagnostics.
    fn debug(&self, msg: &str);

    /// Per-message tracing.
    fn trace(&self, msg: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[allow(dead_code)]
    fn assert_object_safe(_: &dyn BrokerLogSink) {}
}
