pub mod binding;
pub mod client;
pub mod connector;
pub mod deployment;
pub mod errors;
pub mod inventory;
pub mod occasions;
pub mod purchase;
pub mod source;
pub mod test_helpers;
pub mod wallets;

/// Typed bindings generated from the static ABI descriptor.
pub mod tokenmaster_types {
    use ethers::contract::abigen;

    abigen!(TokenMaster, "abi/TokenMaster.json");
}

pub use binding::{ContractHandle, bind};
pub use connector::{ChainConnector, Connection, NetworkIdentity, NetworkTarget};
pub use errors::{BindingError, ConnectionError, PurchaseError, SyncError};
pub use inventory::{ScanConfig, SnapshotStore, refresh_occasion, scan_all};
pub use occasions::{InventorySnapshot, Occasion, PurchaseRequest};
pub use purchase::{PurchaseConfirmation, purchase};
pub use source::{OccasionSource, Settlement};
