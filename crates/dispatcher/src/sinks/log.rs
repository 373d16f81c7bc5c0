//! LogInvoker - logs batches instead of invoking a function

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use contracts::{ContractError, InvokeResult, Invoker};
use tracing::{info, instrument};

/// Invoker for dry runs: every batch is logged and reported as accepted
pub struct LogInvoker {
    name: String,
    invocations: AtomicU64,
}

impl LogInvoker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            invocations: AtomicU64::new(0),
        }
    }

    /// Batches seen so far
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }
}

impl Invoker for LogInvoker {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "log_invoker_invoke", skip(self, payload), fields(function = %self.name))]
    async fn invoke(&self, payload: Bytes) -> Result<InvokeResult, ContractError> {
        let seq = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            function = %self.name,
            seq,
            bytes = payload.len(),
            "Dry run, batch not sent"
        );
        Ok(InvokeResult {
            status: 202,
            body: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_invoker_accepts_everything() {
        let invoker = LogInvoker::new("dry-run");
        let result = invoker.invoke(Bytes::from_static(b"{}")).await.unwrap();
        assert_eq!(result.status, 202);
        assert_eq!(invoker.invocations(), 1);
    }

    #[test]
    fn test_log_invoker_name() {
        assert_eq!(LogInvoker::new("sender").name(), "sender");
    }
}
