use thiserror::Error;

/// Failures while establishing a session with the chain.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("wallet keystore unavailable: {0}")]
    NoWalletProvider(String),
    #[error("wallet unlock rejected: {0}")]
    UserRejected(String),
    #[error("network unreachable at {url}: {reason}")]
    NetworkUnreachable { url: String, reason: String },
    #[error("connected to chain {actual} but expected chain {expected}")]
    NetworkMismatch { expected: u64, actual: u64 },
}

/// Failures while binding the contract to a connection.
#[derive(Debug, Error)]
pub enum BindingError {
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
}

/// Failures during a bulk inventory scan.
///
/// A failed scan never publishes partial results; the previously published
/// snapshot stays in place and `loading` remains set. All variants are
/// retryable by re-invoking the scan.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read {}: {reason}", match .id { Some(id) => format!("occasion {id}"), None => String::from("occasion count") })]
    ReadFailed { id: Option<u64>, reason: String },
    #[error("scan aborted at occasion {id} ({completed} of {total} read): {reason}")]
    PartialScanAborted {
        id: u64,
        completed: usize,
        total: u64,
        reason: String,
    },
    #[error("read of occasion {id} timed out after {timeout_ms}ms")]
    Timeout { id: u64, timeout_ms: u64 },
}

/// Failures during a ticket purchase.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("connection is read-only; a signing wallet is required to purchase")]
    ReadOnlyConnection,
    #[error("signing rejected: {0}")]
    UserRejected(String),
    #[error("transaction reverted on chain: {0}")]
    TransactionReverted(String),
    #[error("transaction submission failed: {0}")]
    SubmissionFailed(String),
}

/// Low-level outcome of a single contract call, classified by the flows
/// into the taxonomies above.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("call rejected by signer: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("connection has no signing capability")]
    ReadOnly,
}
