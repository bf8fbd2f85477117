use crate::{
    binding::{self, ContractHandle},
    connector::{self, ChainConnector, NetworkIdentity, NetworkTarget, WalletConfig},
    deployment::{self, DeploymentEnv, DeploymentStore},
    errors::PurchaseError,
    inventory::{self, ScanConfig, SnapshotStore},
    occasions::{InventorySnapshot, PurchaseRequest},
    purchase,
    source::OccasionSource,
};
use color_eyre::eyre::{Result, eyre};
use tracing::error;

const MAX_RETAINED_ERRORS: usize = 50;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkTarget,
    pub wallets: WalletConfig,
    /// Overrides the recorded deployment address when set.
    pub contract_address: Option<String>,
    pub scan: ScanConfig,
}

pub fn deployment_env_for(target: &NetworkTarget) -> DeploymentEnv {
    match target {
        NetworkTarget::Mainnet { .. } => DeploymentEnv::Mainnet,
        NetworkTarget::Testnet { .. } => DeploymentEnv::Testnet,
        NetworkTarget::LocalNode { .. } => DeploymentEnv::Local,
    }
}

/// Resolves the contract address: explicit override first, otherwise the
/// deployment record for the selected environment. A recorded ABI hash must
/// match the checked-in descriptor.
fn resolve_contract_address(config: &AppConfig) -> Result<String> {
    if let Some(address) = &config.contract_address {
        return Ok(address.clone());
    }
    let env = deployment_env_for(&config.network);
    let store = DeploymentStore::new(env)?;
    let record = store.load()?.ok_or_else(|| {
        eyre!(
            "No deployment record for {env}; pass --address or save one at {}",
            store.path().display()
        )
    })?;
    if !record.matches_chain(env.chain_id()) {
        return Err(eyre!(
            "Deployment record for {env} was made against a different chain, expected {}",
            env.chain_id()
        ));
    }
    if record.abi_hash.is_some() {
        let current = deployment::compute_abi_hash(deployment::ABI_DESCRIPTOR_PATH)?;
        if !record.is_compatible_with_hash(&current) {
            return Err(eyre!(
                "Deployment record for {env} was made against a different ABI descriptor"
            ));
        }
    }
    Ok(record.address)
}

/// Session glue: one connection, one binding, one snapshot store.
pub struct AppController<S: OccasionSource> {
    source: S,
    store: SnapshotStore,
    network: NetworkIdentity,
    account: Option<String>,
    scan: ScanConfig,
    pub status: String,
    errors: Vec<String>,
}

impl AppController<ContractHandle> {
    /// Connects, validates the network, and binds the contract.
    pub async fn connect(config: AppConfig) -> Result<Self> {
        let connector = ChainConnector::new(config.network.clone(), config.wallets.clone());
        let (connection, network) = connector.connect().await?;
        let account = connection
            .account()
            .map(|a| format!("0x{}", hex::encode(a.as_bytes())));

        let address = resolve_contract_address(&config)?;
        let handle = binding::bind(&connection, &address)?;

        Ok(Self::with_source(handle, network, account, config.scan))
    }
}

impl<S: OccasionSource> AppController<S> {
    pub fn with_source(
        source: S,
        network: NetworkIdentity,
        account: Option<String>,
        scan: ScanConfig,
    ) -> Self {
        Self {
            source,
            store: SnapshotStore::new(),
            network,
            account,
            scan,
            status: String::from("Ready"),
            errors: Vec::new(),
        }
    }

    pub fn network(&self) -> &NetworkIdentity {
        &self.network
    }

    /// "Connected Account - 0x…" line, or the read-only notice.
    pub fn account_line(&self) -> String {
        match &self.account {
            Some(account) => format!("Connected Account - {account}"),
            None => String::from("Connected Account - none (read-only)"),
        }
    }

    pub fn rpc_line(&self, configured_url: &str) -> String {
        format!(
            "RPC URL: {}",
            connector::describe_rpc(self.network.chain_id, configured_url)
        )
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        self.store.current()
    }

    pub fn recent_errors(&self) -> Vec<String> {
        self.errors.iter().rev().take(5).cloned().collect()
    }

    /// Runs a full inventory scan and publishes the result.
    pub async fn refresh(&mut self) -> Result<InventorySnapshot> {
        match inventory::scan_all(&self.source, &self.store, &self.scan).await {
            Ok(snapshot) => {
                self.status = if snapshot.total == 0 {
                    String::from("No occasions listed")
                } else {
                    format!("Loaded {} occasion(s)", snapshot.total)
                };
                Ok(snapshot)
            }
            Err(e) => {
                self.status = format!("Failed to load occasions: {e}");
                self.push_errors(vec![self.status.clone()]);
                Err(e.into())
            }
        }
    }

    /// Buys one ticket for an occasion from the loaded inventory, paying
    /// the price the snapshot reports.
    pub async fn buy(&mut self, occasion_id: u64) -> Result<()> {
        let snapshot = self.store.current();
        let occasion = snapshot.occasion(occasion_id).ok_or_else(|| {
            eyre!("Occasion {occasion_id} is not in the loaded inventory; refresh first")
        })?;
        let request = PurchaseRequest {
            occasion_id,
            payment: occasion.cost,
        };

        match purchase::purchase(&self.source, &self.store, request, &self.scan).await {
            Ok(confirmation) => {
                self.status = format!(
                    "Purchased ticket for occasion {} | tx {}",
                    confirmation.occasion_id, confirmation.tx_hash
                );
                Ok(())
            }
            Err(e) => {
                self.status = match &e {
                    PurchaseError::ReadOnlyConnection => String::from(
                        "Purchase requires a signing wallet; this session is read-only",
                    ),
                    PurchaseError::UserRejected(reason) => {
                        format!("Purchase rejected by user: {reason}")
                    }
                    PurchaseError::TransactionReverted(reason) => {
                        format!("Purchase reverted on chain: {reason}")
                    }
                    PurchaseError::SubmissionFailed(reason) => {
                        format!("Purchase submission failed: {reason}")
                    }
                };
                self.push_errors(vec![self.status.clone()]);
                Err(e.into())
            }
        }
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > MAX_RETAINED_ERRORS {
            let drain = self.errors.len() - MAX_RETAINED_ERRORS;
            self.errors.drain(0..drain);
        }
    }
}
