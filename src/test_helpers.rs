use crate::{
    errors::CallError,
    occasions::Occasion,
    source::{OccasionSource, Settlement},
};
use async_trait::async_trait;
use ethers::types::U256;
use std::{
    collections::HashSet,
    sync::{
        Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

/// What the fake does when a purchase is submitted.
#[derive(Clone, Debug)]
pub enum SettlementScript {
    Confirm,
    Revert(String),
    RejectSigning(String),
    FailSubmission(String),
}

/// In-memory stand-in for the remote contract so the sync and purchase
/// flows can run without a node. Reads and writes can be scripted to fail,
/// hang, or revert per occasion id.
pub struct FakeOccasionSource {
    occasions: Mutex<Vec<Occasion>>,
    fail_reads_for: Mutex<HashSet<u64>>,
    hang_reads_for: Mutex<HashSet<u64>>,
    misreport_reads_for: Mutex<HashSet<u64>>,
    fail_count_read: Mutex<bool>,
    settlement: Mutex<SettlementScript>,
    signing: bool,
    count_reads: AtomicU64,
    occasion_reads: AtomicU64,
    tx_counter: AtomicU64,
}

impl FakeOccasionSource {
    pub fn new(occasions: Vec<Occasion>) -> Self {
        Self {
            occasions: Mutex::new(occasions),
            fail_reads_for: Mutex::new(HashSet::new()),
            hang_reads_for: Mutex::new(HashSet::new()),
            misreport_reads_for: Mutex::new(HashSet::new()),
            fail_count_read: Mutex::new(false),
            settlement: Mutex::new(SettlementScript::Confirm),
            signing: true,
            count_reads: AtomicU64::new(0),
            occasion_reads: AtomicU64::new(0),
            tx_counter: AtomicU64::new(0),
        }
    }

    pub fn read_only(occasions: Vec<Occasion>) -> Self {
        Self {
            signing: false,
            ..Self::new(occasions)
        }
    }

    pub fn fail_read_of(&self, id: u64) {
        self.fail_reads_for.lock().unwrap().insert(id);
    }

    pub fn clear_read_failures(&self) {
        self.fail_reads_for.lock().unwrap().clear();
    }

    pub fn hang_read_of(&self, id: u64) {
        self.hang_reads_for.lock().unwrap().insert(id);
    }

    /// Serve the record for `id` with a different id field.
    pub fn misreport_read_of(&self, id: u64) {
        self.misreport_reads_for.lock().unwrap().insert(id);
    }

    pub fn fail_count_read(&self) {
        *self.fail_count_read.lock().unwrap() = true;
    }

    pub fn script_settlement(&self, script: SettlementScript) {
        *self.settlement.lock().unwrap() = script;
    }

    pub fn count_reads(&self) -> u64 {
        self.count_reads.load(Ordering::SeqCst)
    }

    pub fn occasion_reads(&self) -> u64 {
        self.occasion_reads.load(Ordering::SeqCst)
    }

    pub fn tickets_of(&self, id: u64) -> Option<u64> {
        self.occasions
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .map(|o| o.tickets_available)
    }
}

#[async_trait]
impl OccasionSource for FakeOccasionSource {
    async fn total_occasions(&self) -> Result<u64, CallError> {
        self.count_reads.fetch_add(1, Ordering::SeqCst);
        if *self.fail_count_read.lock().unwrap() {
            return Err(CallError::Transport("count read failed".to_string()));
        }
        Ok(self.occasions.lock().unwrap().len() as u64)
    }

    async fn occasion(&self, id: u64) -> Result<Occasion, CallError> {
        self.occasion_reads.fetch_add(1, Ordering::SeqCst);
        if self.hang_reads_for.lock().unwrap().contains(&id) {
            std::future::pending::<()>().await;
        }
        if self.fail_reads_for.lock().unwrap().contains(&id) {
            return Err(CallError::Transport(format!("read of occasion {id} failed")));
        }
        let mut occasion = self
            .occasions
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| CallError::Transport(format!("no occasion with id {id}")))?;
        if self.misreport_reads_for.lock().unwrap().contains(&id) {
            occasion.id = id + 1;
        }
        Ok(occasion)
    }

    async fn purchase_ticket(
        &self,
        id: u64,
        _payment: U256,
    ) -> Result<Settlement, CallError> {
        if !self.signing {
            return Err(CallError::ReadOnly);
        }
        let script = self.settlement.lock().unwrap().clone();
        match script {
            SettlementScript::RejectSigning(reason) => Err(CallError::Rejected(reason)),
            SettlementScript::FailSubmission(reason) => Err(CallError::Transport(reason)),
            SettlementScript::Revert(reason) => Ok(Settlement::Reverted { reason }),
            SettlementScript::Confirm => {
                let mut occasions = self.occasions.lock().unwrap();
                let occasion = occasions
                    .iter_mut()
                    .find(|o| o.id == id)
                    .ok_or_else(|| CallError::Transport(format!("no occasion {id}")))?;
                occasion.tickets_available = occasion.tickets_available.saturating_sub(1);
                let n = self.tx_counter.fetch_add(1, Ordering::SeqCst);
                Ok(Settlement::Confirmed {
                    tx_hash: format!("{:#066x}", n + 1),
                })
            }
        }
    }

    fn can_sign(&self) -> bool {
        self.signing
    }
}

/// Generates `n` dense 1-based sample occasions.
pub fn sample_occasions(n: u64) -> Vec<Occasion> {
    (1..=n)
        .map(|id| Occasion {
            id,
            name: fakeit::name::full(),
            date: format!("2026-09-{:02}", (id % 28) + 1),
            time: "19:30".to_string(),
            location: fakeit::address::city(),
            cost: U256::from(100u64) * U256::from(id),
            tickets_available: 10 + id,
        })
        .collect()
}
