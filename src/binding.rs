use crate::{
    connector::Connection,
    errors::{BindingError, CallError},
    occasions::Occasion,
    source::{OccasionSource, Settlement},
    tokenmaster_types as abi,
};
use async_trait::async_trait;
use ethers::{
    contract::ContractError,
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::LocalWallet,
    types::{Address, U64, U256},
};
use std::str::FromStr;

type SignedClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// A bound contract instance, tagged with the connection's capability.
///
/// One binding per session; it is only recreated if the connection itself
/// is replaced.
#[derive(Clone)]
pub enum ContractHandle {
    Signed(abi::TokenMaster<SignedClient>),
    ReadOnly(abi::TokenMaster<Provider<Http>>),
}

/// Binds the fixed ABI + address pair to the active connection.
///
/// Pure construction, no I/O; the ABI descriptor itself is fixed at compile
/// time from `abi/TokenMaster.json`.
pub fn bind(connection: &Connection, address: &str) -> Result<ContractHandle, BindingError> {
    let address = parse_address(address)?;
    let handle = match connection {
        Connection::Signed { client, .. } => {
            ContractHandle::Signed(abi::TokenMaster::new(address, client.clone()))
        }
        Connection::ReadOnly { provider } => {
            ContractHandle::ReadOnly(abi::TokenMaster::new(address, provider.clone()))
        }
    };
    Ok(handle)
}

fn parse_address(raw: &str) -> Result<Address, BindingError> {
    Address::from_str(raw.trim()).map_err(|e| {
        BindingError::InvalidAddress(format!("malformed contract address '{raw}': {e}"))
    })
}

impl ContractHandle {
    pub fn address(&self) -> Address {
        match self {
            ContractHandle::Signed(c) => c.address(),
            ContractHandle::ReadOnly(c) => c.address(),
        }
    }
}

#[async_trait]
impl OccasionSource for ContractHandle {
    async fn total_occasions(&self) -> Result<u64, CallError> {
        let total = match self {
            ContractHandle::Signed(c) => {
                c.total_occasions().call().await.map_err(read_error)?
            }
            ContractHandle::ReadOnly(c) => {
                c.total_occasions().call().await.map_err(read_error)?
            }
        };
        u256_to_u64(total, "totalOccasions")
    }

    async fn occasion(&self, id: u64) -> Result<Occasion, CallError> {
        let raw = match self {
            ContractHandle::Signed(c) => c
                .get_occasion(U256::from(id))
                .call()
                .await
                .map_err(read_error)?,
            ContractHandle::ReadOnly(c) => c
                .get_occasion(U256::from(id))
                .call()
                .await
                .map_err(read_error)?,
        };
        occasion_from_abi(raw)
    }

    async fn purchase_ticket(
        &self,
        id: u64,
        payment: U256,
    ) -> Result<Settlement, CallError> {
        let contract = match self {
            ContractHandle::ReadOnly(_) => return Err(CallError::ReadOnly),
            ContractHandle::Signed(c) => c,
        };

        let call = contract.purchase_ticket(U256::from(id)).value(payment);
        let pending = match call.send().await {
            Ok(pending) => pending,
            Err(e) => {
                // A revert surfaced during gas estimation settles the
                // question before anything reaches the mempool.
                if let Some(reason) = e.decode_revert::<String>() {
                    return Ok(Settlement::Reverted { reason });
                }
                return Err(classify_send_error(e));
            }
        };

        let receipt = pending
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;
        match receipt {
            None => Err(CallError::Transport(
                "transaction dropped without a receipt".to_string(),
            )),
            Some(r) if r.status == Some(U64::one()) => Ok(Settlement::Confirmed {
                tx_hash: format!("{:#x}", r.transaction_hash),
            }),
            Some(r) => Ok(Settlement::Reverted {
                reason: format!("transaction {:#x} reverted", r.transaction_hash),
            }),
        }
    }

    fn can_sign(&self) -> bool {
        matches!(self, ContractHandle::Signed(_))
    }
}

fn read_error<M: Middleware>(e: ContractError<M>) -> CallError {
    CallError::Transport(e.to_string())
}

fn classify_send_error<M: Middleware>(e: ContractError<M>) -> CallError {
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("rejected") || lower.contains("denied") {
        CallError::Rejected(message)
    } else {
        CallError::Transport(message)
    }
}

fn occasion_from_abi(raw: abi::Occasion) -> Result<Occasion, CallError> {
    Ok(Occasion {
        id: u256_to_u64(raw.id, "occasion id")?,
        name: raw.name,
        date: raw.date,
        time: raw.time,
        location: raw.location,
        cost: raw.cost,
        tickets_available: u256_to_u64(raw.tickets_available, "ticketsAvailable")?,
    })
}

fn u256_to_u64(value: U256, what: &str) -> Result<u64, CallError> {
    if value > U256::from(u64::MAX) {
        return Err(CallError::Transport(format!(
            "{what} value {value} exceeds u64 range"
        )));
    }
    Ok(value.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::Connection;
    use std::sync::Arc;

    fn read_only_connection() -> Connection {
        // No I/O happens until a call is issued, so an offline provider is
        // fine for construction tests.
        let provider = Provider::<Http>::try_from("http://localhost:8545").unwrap();
        Connection::ReadOnly {
            provider: Arc::new(provider),
        }
    }

    #[test]
    fn bind__rejects_malformed_address() {
        let connection = read_only_connection();
        let result = bind(&connection, "not-an-address");
        assert!(matches!(result, Err(BindingError::InvalidAddress(_))));
    }

    #[test]
    fn bind__accepts_checksummed_address() {
        let connection = read_only_connection();
        let handle =
            bind(&connection, "0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
        assert!(!handle.can_sign());
        assert_eq!(
            format!("{:#x}", handle.address()),
            "0x5fbdb2315678afecb367f032d93f642f64180aa3"
        );
    }

    #[test]
    fn bind__trims_surrounding_whitespace() {
        let connection = read_only_connection();
        let handle =
            bind(&connection, " 0x5FbDB2315678afecb367f032d93F642f64180aa3\n").unwrap();
        assert!(!handle.can_sign());
    }

    #[test]
    fn u256_to_u64__rejects_overflow() {
        let too_big = U256::from(u64::MAX) + U256::one();
        assert!(u256_to_u64(too_big, "x").is_err());
        assert_eq!(u256_to_u64(U256::from(7u64), "x").unwrap(), 7);
    }
}
