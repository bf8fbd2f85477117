use crate::{errors::CallError, occasions::Occasion};
use async_trait::async_trait;
use ethers::types::U256;

/// Settled outcome of a submitted write call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Settlement {
    Confirmed { tx_hash: String },
    Reverted { reason: String },
}

/// The fixed read/write surface the remote contract exposes.
///
/// The ethers-backed [`ContractHandle`](crate::binding::ContractHandle) is
/// the production implementation; tests substitute an in-memory fake so the
/// sync and purchase flows can be exercised without a node.
#[async_trait]
pub trait OccasionSource: Send + Sync {
    /// Read the authoritative occasion count.
    async fn total_occasions(&self) -> Result<u64, CallError>;

    /// Read one occasion record by its 1-based id.
    async fn occasion(&self, id: u64) -> Result<Occasion, CallError>;

    /// Submit a paid `purchaseTicket` call and await settlement.
    async fn purchase_ticket(&self, id: u64, payment: U256)
    -> Result<Settlement, CallError>;

    /// Whether this source can sign and submit write calls.
    fn can_sign(&self) -> bool;
}
