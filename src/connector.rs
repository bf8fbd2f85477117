use crate::{
    errors::ConnectionError,
    wallets::{self, WalletDescriptor},
};
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::Address,
};
use std::{
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};
use tracing::info;

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const TESTNET_CHAIN_ID: u64 = 4;
pub const LOCAL_CHAIN_ID: u64 = 31337;

pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:8545";

/// Which deployment network the session is expected to talk to.
///
/// The chain id resolved from the node must match the target's id before
/// any contract traffic is allowed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum NetworkTarget {
    Mainnet { url: String },
    Testnet { url: String },
    LocalNode { url: String },
}

impl NetworkTarget {
    pub fn expected_chain_id(&self) -> u64 {
        match self {
            NetworkTarget::Mainnet { .. } => MAINNET_CHAIN_ID,
            NetworkTarget::Testnet { .. } => TESTNET_CHAIN_ID,
            NetworkTarget::LocalNode { .. } => LOCAL_CHAIN_ID,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            NetworkTarget::Mainnet { url }
            | NetworkTarget::Testnet { url }
            | NetworkTarget::LocalNode { url } => url,
        }
    }
}

/// Human name for a chain id, for status lines.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        MAINNET_CHAIN_ID => "Mainnet".to_string(),
        TESTNET_CHAIN_ID => "Rinkeby".to_string(),
        LOCAL_CHAIN_ID => "Hardhat".to_string(),
        other => format!("Unknown (Chain ID: {other})"),
    }
}

/// RPC label for status lines; unknown chains get the explicit
/// custom-endpoint wording rather than a guessed URL.
pub fn describe_rpc(chain_id: u64, configured_url: &str) -> String {
    match chain_id {
        MAINNET_CHAIN_ID | TESTNET_CHAIN_ID | LOCAL_CHAIN_ID => {
            configured_url.to_string()
        }
        other => format!("Custom RPC URL for Chain ID: {other}"),
    }
}

/// Identity of the network a connection resolved to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NetworkIdentity {
    pub chain_id: u64,
    pub name: String,
}

impl NetworkIdentity {
    fn resolved(chain_id: u64) -> Self {
        Self {
            chain_id,
            name: network_name(chain_id),
        }
    }
}

/// Where the signing key comes from, if anywhere.
#[derive(Clone, Debug)]
pub enum WalletConfig {
    /// Encrypted keystore profile under a wallet directory.
    Keystore { name: String, dir: PathBuf },
    /// No signer; the session runs read-only against the fallback RPC.
    None,
}

/// Capability-tagged connection: the whole pipeline is agnostic to the
/// variant except the purchase flow, which requires `Signed`.
#[derive(Clone)]
pub enum Connection {
    Signed {
        client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
        account: Address,
    },
    ReadOnly {
        provider: Arc<Provider<Http>>,
    },
}

impl Connection {
    pub fn can_sign(&self) -> bool {
        matches!(self, Connection::Signed { .. })
    }

    pub fn account(&self) -> Option<Address> {
        match self {
            Connection::Signed { account, .. } => Some(*account),
            Connection::ReadOnly { .. } => None,
        }
    }
}

/// Establishes and validates the session's connection.
///
/// The unlocked signer is cached so calling [`connect`](Self::connect) more
/// than once per session never re-prompts for the keystore password.
pub struct ChainConnector {
    target: NetworkTarget,
    wallet: WalletConfig,
    unlocked: OnceLock<LocalWallet>,
}

impl ChainConnector {
    pub fn new(target: NetworkTarget, wallet: WalletConfig) -> Self {
        Self {
            target,
            wallet,
            unlocked: OnceLock::new(),
        }
    }

    pub async fn connect(&self) -> Result<(Connection, NetworkIdentity), ConnectionError> {
        let url = self.target.url();
        let provider = Provider::<Http>::try_from(url).map_err(|e| {
            ConnectionError::NetworkUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| ConnectionError::NetworkUnreachable {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .as_u64();

        validate_chain(self.target.expected_chain_id(), chain_id)?;
        let network = NetworkIdentity::resolved(chain_id);
        info!(chain_id, network = %network.name, url, "connected");

        let connection = match &self.wallet {
            WalletConfig::None => Connection::ReadOnly {
                provider: Arc::new(provider),
            },
            WalletConfig::Keystore { name, dir } => {
                let signer = self.signer(name, dir)?.with_chain_id(chain_id);
                let account = signer.address();
                Connection::Signed {
                    client: Arc::new(SignerMiddleware::new(provider, signer)),
                    account,
                }
            }
        };

        Ok((connection, network))
    }

    fn signer(&self, name: &str, dir: &Path) -> Result<LocalWallet, ConnectionError> {
        if let Some(wallet) = self.unlocked.get() {
            return Ok(wallet.clone());
        }
        let descriptor: WalletDescriptor = wallets::find_wallet(dir, name)
            .map_err(|e| ConnectionError::NoWalletProvider(e.to_string()))?;
        let wallet = wallets::unlock_wallet(&descriptor)
            .map_err(|e| ConnectionError::UserRejected(e.to_string()))?;
        // A second connect racing here just drops its duplicate.
        let _ = self.unlocked.set(wallet.clone());
        Ok(wallet)
    }
}

fn validate_chain(expected: u64, actual: u64) -> Result<(), ConnectionError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConnectionError::NetworkMismatch { expected, actual })
    }
}
