use ethers::types::U256;
use serde::{Deserialize, Serialize};

/// One ticketed event record as held by the remote contract.
///
/// Ids are 1-based, dense, and assigned by the contract; the client never
/// invents its own.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Occasion {
    pub id: u64,
    pub name: String,
    pub date: String,
    pub time: String,
    pub location: String,
    /// Price in the smallest payment unit.
    pub cost: U256,
    pub tickets_available: u64,
}

impl Occasion {
    pub fn is_sold_out(&self) -> bool {
        self.tickets_available == 0
    }
}

/// Point-in-time copy of all occasions, index-aligned to id order.
///
/// `loading` is true until a full scan completes; an errored scan leaves it
/// set so "failed to load" never masquerades as "loaded, zero results".
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InventorySnapshot {
    pub occasions: Vec<Occasion>,
    /// Occasion count captured at scan start.
    pub total: u64,
    pub loading: bool,
}

impl InventorySnapshot {
    pub fn empty() -> Self {
        Self {
            occasions: Vec::new(),
            total: 0,
            loading: true,
        }
    }

    pub fn occasion(&self, id: u64) -> Option<&Occasion> {
        self.occasions.iter().find(|o| o.id == id)
    }

    pub fn is_empty_inventory(&self) -> bool {
        !self.loading && self.occasions.is_empty()
    }
}

/// One submit-await cycle's worth of purchase intent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PurchaseRequest {
    pub occasion_id: u64,
    /// Attached as the transaction's value, in the smallest payment unit.
    pub payment: U256,
}
