use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployedAddress.json";

/// Path of the checked-in ABI descriptor, relative to the working directory.
pub const ABI_DESCRIPTOR_PATH: &str = "abi/TokenMaster.json";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Mainnet,
    Testnet,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Mainnet => "mainnet",
            DeploymentEnv::Testnet => "testnet",
            DeploymentEnv::Local => "local",
        }
    }

    pub fn chain_id(self) -> u64 {
        match self {
            DeploymentEnv::Mainnet => crate::connector::MAINNET_CHAIN_ID,
            DeploymentEnv::Testnet => crate::connector::TESTNET_CHAIN_ID,
            DeploymentEnv::Local => crate::connector::LOCAL_CHAIN_ID,
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Mainnet => "Mainnet",
            DeploymentEnv::Testnet => "Testnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

/// The artifact the one-shot deploy script leaves behind. Only `address` is
/// guaranteed; richer deploy tooling may also record when, for which chain,
/// and against which ABI descriptor it deployed.
#[derive(Clone, Debug, Deserialize)]
pub struct DeploymentRecord {
    pub address: String,
    #[serde(default)]
    pub deployed_at: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub abi_hash: Option<String>,
}

impl DeploymentRecord {
    /// A record with no recorded hash predates hash tracking and is
    /// accepted as-is.
    pub fn is_compatible_with_hash(&self, hash: &str) -> bool {
        match self.abi_hash.as_deref() {
            Some(recorded) => recorded == hash,
            None => true,
        }
    }

    /// A record with no recorded chain id is accepted for any environment.
    pub fn matches_chain(&self, chain_id: u64) -> bool {
        match self.chain_id {
            Some(recorded) => recorded == chain_id,
            None => true,
        }
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(env)?;
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Option<DeploymentRecord>> {
        read_record(&self.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

pub fn compute_abi_hash(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).wrap_err_with(|| {
        format!(
            "Failed to read ABI descriptor for hashing: {}",
            path.display()
        )
    })?;
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub fn ensure_structure() -> Result<()> {
    for env in [
        DeploymentEnv::Mainnet,
        DeploymentEnv::Testnet,
        DeploymentEnv::Local,
    ] {
        let _ = ensure_store(env)?;
    }
    Ok(())
}

fn ensure_store(env: DeploymentEnv) -> Result<PathBuf> {
    let root = Path::new(DEPLOYMENTS_ROOT);
    if !root.exists() {
        fs::create_dir_all(root).wrap_err("Failed to create .deployments directory")?;
    }

    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).wrap_err_with(|| {
            format!("Failed to create .deployments/{} directory", env.dir_name())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        let mut file = fs::File::create(&file_path).wrap_err_with(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
        file.write_all(b"").wrap_err_with(|| {
            format!("Failed to initialize deployment record file for {}", env)
        })?;
    }

    Ok(file_path)
}

fn read_record(path: impl AsRef<Path>) -> Result<Option<DeploymentRecord>> {
    let data = fs::read(path.as_ref()).wrap_err("Failed to read deployment record")?;
    if data.is_empty() || data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let record = serde_json::from_slice::<DeploymentRecord>(&data)
        .wrap_err("Failed to parse deployment record JSON")?;
    Ok(Some(record))
}
