//! Injected logging sink for upload sessions.

/// Receives human-readable progress and failure messages of a transfer.
///
/// The orchestrator and uploader never log through a global; callers pass
/// the sink they want. [`TracingLog`] is the usual choice.
pub trait TransferLog: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to `tracing` under the `ironbox::transfer` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl TransferLog for TracingLog {
    fn info(&self, message: &str) {
        tracing::info!(target: "ironbox::transfer", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "ironbox::transfer", "{message}");
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLog;

impl TransferLog for NullLog {
    fn info(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}
